//! Command-line arguments. Every flag overrides the matching config key.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "docdesk", version, about = "Analyse documents and chat about them in the terminal")]
pub struct Args {
    /// Document id to analyse (repeatable)
    #[arg(short, long = "doc", value_name = "ID")]
    pub docs: Vec<u64>,

    /// JSON file with the feed selection (array of {documentId, name, ...})
    #[arg(short, long, value_name = "FILE")]
    pub selection: Option<PathBuf>,

    /// Base URL of the document service
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Access token sent as `Authorization: basic:<token>`
    #[arg(long, env = "DOCDESK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Colour theme: dark or light
    #[arg(long)]
    pub theme: Option<String>,

    /// Directory export files are written to
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Alternative config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

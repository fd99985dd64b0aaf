//! User configuration loaded from `~/.config/docdesk/config.toml`.
//!
//! Every key is optional. A missing file means defaults; a file that does not
//! parse is reported on stderr and ignored, so a typo never prevents startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cli::Args;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `dark` or `light`.
    pub theme: String,
    pub api_base_url: String,
    pub api_token: Option<String>,
    /// Model tag recorded in chat exports.
    pub model: String,
    pub export_dir: PathBuf,
    pub log_file: PathBuf,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "dark".to_owned(),
            api_base_url: "http://localhost:8080".to_owned(),
            api_token: None,
            model: "openai".to_owned(),
            export_dir: PathBuf::from("."),
            log_file: config_dir().join("docdesk.log"),
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Applies command-line overrides.
    pub fn merge_args(mut self, args: &Args) -> Self {
        if let Some(url) = &args.api_url {
            self.api_base_url = url.clone();
        }
        if let Some(token) = &args.token {
            self.api_token = Some(token.clone());
        }
        if let Some(theme) = &args.theme {
            self.theme = theme.clone();
        }
        if let Some(dir) = &args.export_dir {
            self.export_dir = dir.clone();
        }
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// `$XDG_CONFIG_HOME/docdesk`, falling back to `~/.config/docdesk`.
pub fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("docdesk")
}

pub fn default_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Reads the config at `path`. Never fails; problems fall back to defaults.
pub fn load(path: &Path) -> Config {
    let raw = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => return Config::default(),
    };
    parse(&raw).unwrap_or_else(|e| {
        eprintln!("docdesk: config parse error in {}: {e}", path.display());
        Config::default()
    })
}

fn parse(raw: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(raw)
}

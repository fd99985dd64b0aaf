//! docdesk: analyse a set of documents and chat about them in the terminal.
//!
//! # Startup sequence
//!
//! 1. Parse arguments, load the config file, and start file logging. All of
//!    this happens before the terminal is touched so errors print normally.
//! 2. Build the document selection and the HTTP service client.
//! 3. `install_panic_hook()` before `init_tui()`, so it is the innermost hook.
//! 4. `register_sigterm()`, polled by the 50 ms heartbeat.
//! 5. `init_tui()`, then the event channel and `spawn_event_task()`.
//! 6. Create the workspace on the same channel and hand it the selection,
//!    which starts the first analysis run.
//!
//! After `init_tui()` the `?` operator is only used inside `event_loop`, whose
//! result is held until `restore_tui()` has run.

mod app;
mod cli;
mod clipboard;
mod config;
mod event;
mod theme;
mod tui;
mod ui;

use std::fs::{self, File};
use std::path::Path;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use docdesk_core::types::{DocumentSelection, SelectionEntry};
use docdesk_core::{EventSink, HttpDocumentService, HttpServiceConfig, Workspace};

use crate::app::AppState;
use crate::cli::Args;
use crate::config::Config;
use crate::event::AppEvent;
use crate::theme::{ThemeContext, ThemeMode};
use crate::ui::keybindings::{handle_key, handle_mouse, KeyAction};

/// Sends log output to `log_file`. The terminal belongs to the TUI.
///
/// The filter comes from `DOCDESK_LOG`, then `RUST_LOG`, then `info`.
fn init_tracing(log_file: &Path) -> std::io::Result<()> {
    if let Some(parent) = log_file.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::options().create(true).append(true).open(log_file)?;
    let filter = EnvFilter::try_from_env("DOCDESK_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    Registry::default()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

/// Reads `--selection` (if given) and appends the `--doc` ids.
fn load_selection(args: &Args) -> Result<DocumentSelection, String> {
    let mut selection = match &args.selection {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            serde_json::from_str::<DocumentSelection>(&raw)
                .map_err(|e| format!("invalid selection file {}: {e}", path.display()))?
        }
        None => DocumentSelection::default(),
    };
    selection
        .entries
        .extend(args.docs.iter().copied().map(SelectionEntry::from_id));
    Ok(selection)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let config_path = args.config.clone().unwrap_or_else(config::default_path);
    let config = config::load(&config_path).merge_args(&args);

    if let Err(e) = init_tracing(&config.log_file) {
        eprintln!("docdesk: cannot open log file {}: {e}", config.log_file.display());
    }

    let selection = match load_selection(&args) {
        Ok(selection) => selection,
        Err(e) => {
            eprintln!("docdesk: {e}");
            return ExitCode::FAILURE;
        }
    };

    let service = match HttpDocumentService::new(HttpServiceConfig {
        base_url: config.api_base_url.clone(),
        token: config.api_token.clone(),
        timeout: config.request_timeout(),
    }) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("docdesk: cannot create HTTP client: {e}");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        api = %config.api_base_url,
        documents = selection.entries.len(),
        "starting docdesk"
    );

    match run(config, service, selection).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "terminal error");
            eprintln!("docdesk: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config, service: HttpDocumentService, selection: DocumentSelection) -> std::io::Result<()> {
    let theme = ThemeContext::new(ThemeMode::from_name(&config.theme));
    let mut state = AppState::new(theme, config.export_dir.clone(), config.model.clone());

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm()?;
    let mut terminal = tui::init_tui()?;

    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let mut rx = handler.rx;

    let mut workspace = Workspace::new(Arc::new(service), EventSink::from_sender(handler.tx.clone()));
    workspace.on_selection_changed(selection);

    let result = event_loop(&mut terminal, &mut rx, &term_flag, &mut state, &mut workspace).await;
    tui::restore_tui()?;
    result
}

async fn event_loop(
    terminal: &mut tui::Tui,
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<AppEvent>,
    term_flag: &std::sync::atomic::AtomicBool,
    state: &mut AppState,
    workspace: &mut Workspace,
) -> std::io::Result<()> {
    loop {
        tokio::select! {
            // A quiescent terminal would otherwise block in rx.recv() and
            // never see the SIGTERM flag.
            _ = tokio::time::sleep(Duration::from_millis(50)) => {}
            maybe_event = rx.recv() => match maybe_event {
                Some(AppEvent::Render) => {
                    terminal.draw(|frame| ui::render(frame, state, workspace))?;
                }
                Some(AppEvent::Key(key)) => {
                    if handle_key(key, state, workspace) == KeyAction::Quit {
                        tracing::info!("quit requested");
                        return Ok(());
                    }
                }
                Some(AppEvent::Mouse(mouse)) => {
                    handle_mouse(mouse, state, workspace);
                }
                Some(AppEvent::Tick) => state.expire_status(Instant::now()),
                Some(AppEvent::Workspace(event)) => workspace.apply(event),
                // ratatui picks up the new size from frame.area() on the next Render.
                Some(AppEvent::Resize(_, _)) => {}
                None => return Ok(()),
            }
        }
        if term_flag.load(Ordering::Relaxed) {
            tracing::info!("SIGTERM received");
            return Ok(());
        }
    }
}

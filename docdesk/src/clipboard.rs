//! System clipboard over OSC 52.
//!
//! The escape sequence goes to stderr, the stream the TUI draws on, so the
//! terminal emulator (local or over ssh) places the text on its clipboard.

use std::io::stderr;

use crossterm::clipboard::CopyToClipboard;
use crossterm::execute;

pub fn copy(text: &str) -> std::io::Result<()> {
    execute!(stderr(), CopyToClipboard::to_clipboard_from(text))?;
    tracing::debug!(bytes = text.len(), "copied to clipboard");
    Ok(())
}

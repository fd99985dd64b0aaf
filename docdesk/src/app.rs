//! UI state for docdesk.
//!
//! Everything the views need that is not workspace data: the input mode, the
//! compose buffer, scroll offsets, display toggles, the status line, and the
//! theme context. No rendering logic lives here; `ui` reads this state and the
//! keybinding dispatcher mutates it.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;

use docdesk_core::View;

use crate::theme::ThemeContext;

/// How long a status message stays on the status bar.
const STATUS_TTL: Duration = Duration::from_secs(4);

/// Which keybinding set is active.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// Typing a chat message.
    Insert,
    /// Typing a chat search query.
    Search,
    HelpOverlay,
    /// "Clear chat history?" dialog.
    ConfirmClear,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    expires_at: Instant,
}

pub struct AppState {
    pub mode: Mode,
    pub theme: ThemeContext,

    /// Chat compose buffer.
    pub input: String,
    /// Live chat filter; empty shows the whole conversation.
    pub search_query: String,

    /// Show every key detail instead of the first few.
    pub show_all_details: bool,
    pub show_reasoning: bool,
    /// Show the send time next to each chat sender.
    pub show_timestamps: bool,

    pub analysis_scroll: u16,
    pub chat_scroll: u16,
    pub flow_scroll: u16,
    pub help_scroll: u16,
    /// Inner height of the main panel, cached after each render.
    pub viewport_height: u16,
    /// Tab header cells, cached after each render for mouse clicks.
    pub tab_rects: [Rect; 3],

    pub status: Option<StatusMessage>,

    pub export_dir: PathBuf,
    pub model: String,
}

impl AppState {
    pub fn new(theme: ThemeContext, export_dir: PathBuf, model: String) -> Self {
        Self {
            mode: Mode::default(),
            theme,
            input: String::new(),
            search_query: String::new(),
            show_all_details: false,
            show_reasoning: false,
            show_timestamps: false,
            analysis_scroll: 0,
            chat_scroll: 0,
            flow_scroll: 0,
            help_scroll: 0,
            viewport_height: 0,
            tab_rects: [Rect::default(); 3],
            status: None,
            export_dir,
            model,
        }
    }

    fn scroll_mut(&mut self, view: View) -> &mut u16 {
        match view {
            View::Analysis => &mut self.analysis_scroll,
            View::Chat => &mut self.chat_scroll,
            View::Flow => &mut self.flow_scroll,
        }
    }

    pub fn scroll_down(&mut self, view: View, lines: u16) {
        let offset = self.scroll_mut(view);
        *offset = offset.saturating_add(lines);
    }

    pub fn scroll_up(&mut self, view: View, lines: u16) {
        let offset = self.scroll_mut(view);
        *offset = offset.saturating_sub(lines);
    }

    pub fn scroll_top(&mut self, view: View) {
        *self.scroll_mut(view) = 0;
    }

    /// The renderer clamps the offset to the content height.
    pub fn scroll_bottom(&mut self, view: View) {
        *self.scroll_mut(view) = u16::MAX;
    }

    pub fn half_page_down(&mut self, view: View) {
        self.scroll_down(view, (self.viewport_height / 2).max(1));
    }

    pub fn half_page_up(&mut self, view: View) {
        self.scroll_up(view, (self.viewport_height / 2).max(1));
    }

    /// Forgets per-result display state. Called when a new run starts.
    pub fn reset_views(&mut self) {
        self.analysis_scroll = 0;
        self.chat_scroll = 0;
        self.flow_scroll = 0;
        self.show_all_details = false;
        self.show_reasoning = false;
        self.search_query.clear();
    }

    /// Replaces the compose buffer and switches to typing.
    pub fn prefill(&mut self, text: &str) {
        self.input = text.to_owned();
        self.mode = Mode::Insert;
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.set_status(text.into(), false);
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.set_status(text.into(), true);
    }

    fn set_status(&mut self, text: String, is_error: bool) {
        self.status = Some(StatusMessage {
            text,
            is_error,
            expires_at: Instant::now() + STATUS_TTL,
        });
    }

    /// Drops the status message once it has been shown long enough.
    pub fn expire_status(&mut self, now: Instant) {
        if self.status.as_ref().is_some_and(|s| now >= s.expires_at) {
            self.status = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ThemeMode;

    fn state() -> AppState {
        AppState::new(ThemeContext::new(ThemeMode::Dark), PathBuf::from("."), "openai".into())
    }

    #[test]
    fn scroll_is_per_view() {
        let mut s = state();
        s.scroll_down(View::Chat, 5);
        s.scroll_up(View::Analysis, 3);
        assert_eq!((s.chat_scroll, s.analysis_scroll), (5, 0));
        s.viewport_height = 20;
        s.half_page_down(View::Chat);
        assert_eq!(s.chat_scroll, 15);
    }

    #[test]
    fn status_expires() {
        let mut s = state();
        s.info("saved");
        s.expire_status(Instant::now());
        assert!(s.status.is_some());
        s.expire_status(Instant::now() + STATUS_TTL);
        assert!(s.status.is_none());
    }
}

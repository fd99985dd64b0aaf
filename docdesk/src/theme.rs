//! Colour palettes and the theme context.
//!
//! [`ThemeContext`] is owned by the main loop. Render functions read the
//! active [`Theme`] from it; the keybinding dispatcher flips it with `t`.

use ratatui::style::Color;

use docdesk_core::types::{FlowStatus, SentimentLabel};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    /// Unknown names fall back to dark.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => ThemeMode::Light,
            "dark" => ThemeMode::Dark,
            other => {
                tracing::warn!(theme = other, "unknown theme, falling back to dark");
                ThemeMode::Dark
            }
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ThemeMode::Dark => "dark",
            ThemeMode::Light => "light",
        }
    }
}

/// Colours for every surface docdesk draws.
#[derive(Debug, Clone)]
pub struct Theme {
    pub border_active: Color,
    pub border_inactive: Color,
    pub text: Color,
    pub muted: Color,
    pub accent: Color,

    pub tab_locked: Color,

    pub user_message: Color,
    pub bot_message: Color,
    pub error: Color,

    pub sentiment_positive: Color,
    pub sentiment_negative: Color,
    pub sentiment_neutral: Color,

    // Flow markers
    pub status_issue: Color,
    pub status_completed: Color,
    pub status_in_progress: Color,
    pub status_neutral: Color,

    pub gauge: Color,

    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub status_mode_normal: Color,
    pub status_mode_insert: Color,
}

impl Theme {
    /// ANSI 16 colours; works on any terminal.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,
            text: Color::Reset,
            muted: Color::DarkGray,
            accent: Color::Cyan,

            tab_locked: Color::DarkGray,

            user_message: Color::Cyan,
            bot_message: Color::Reset,
            error: Color::Red,

            sentiment_positive: Color::Green,
            sentiment_negative: Color::Red,
            sentiment_neutral: Color::Yellow,

            status_issue: Color::Red,
            status_completed: Color::Green,
            status_in_progress: Color::Blue,
            status_neutral: Color::Magenta,

            gauge: Color::Cyan,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_insert: Color::Green,
        }
    }

    /// Catppuccin Latte, truecolor.
    pub fn light() -> Self {
        let text = Color::Rgb(76, 79, 105); // #4c4f69
        let overlay1 = Color::Rgb(140, 143, 161); // #8c8fa1
        let surface1 = Color::Rgb(188, 192, 204); // #bcc0cc
        let lavender = Color::Rgb(114, 135, 253); // #7287fd
        let blue = Color::Rgb(30, 102, 245); // #1e66f5
        let green = Color::Rgb(64, 160, 43); // #40a02b
        let red = Color::Rgb(210, 15, 57); // #d20f39
        let yellow = Color::Rgb(223, 142, 29); // #df8e1d
        let mauve = Color::Rgb(136, 57, 239); // #8839ef

        Self {
            border_active: lavender,
            border_inactive: overlay1,
            text,
            muted: overlay1,
            accent: blue,

            tab_locked: surface1,

            user_message: blue,
            bot_message: text,
            error: red,

            sentiment_positive: green,
            sentiment_negative: red,
            sentiment_neutral: yellow,

            status_issue: red,
            status_completed: green,
            status_in_progress: blue,
            status_neutral: mauve,

            gauge: lavender,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode_normal: lavender,
            status_mode_insert: green,
        }
    }

    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Dark => Self::dark(),
            ThemeMode::Light => Self::light(),
        }
    }

    pub fn flow_status(&self, status: FlowStatus) -> Color {
        match status {
            FlowStatus::Issue => self.status_issue,
            FlowStatus::Completed => self.status_completed,
            FlowStatus::InProgress => self.status_in_progress,
            FlowStatus::Neutral => self.status_neutral,
        }
    }

    pub fn sentiment(&self, label: SentimentLabel) -> Color {
        match label {
            SentimentLabel::Positive => self.sentiment_positive,
            SentimentLabel::Negative => self.sentiment_negative,
            SentimentLabel::Neutral => self.sentiment_neutral,
        }
    }
}

/// The active theme plus the ability to switch it.
#[derive(Debug, Clone)]
pub struct ThemeContext {
    mode: ThemeMode,
    theme: Theme,
}

impl ThemeContext {
    pub fn new(mode: ThemeMode) -> Self {
        Self {
            mode,
            theme: Theme::for_mode(mode),
        }
    }

    pub fn mode(&self) -> ThemeMode {
        self.mode
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn set_mode(&mut self, mode: ThemeMode) {
        self.mode = mode;
        self.theme = Theme::for_mode(mode);
    }

    pub fn toggle(&mut self) {
        self.set_mode(self.mode.toggled());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_swaps_palette() {
        let mut ctx = ThemeContext::new(ThemeMode::from_name("dark"));
        let dark_border = ctx.theme().border_active;
        ctx.toggle();
        assert_eq!(ctx.mode(), ThemeMode::Light);
        assert_ne!(ctx.theme().border_active, dark_border);
        ctx.toggle();
        assert_eq!(ctx.mode(), ThemeMode::Dark);
    }

    #[test]
    fn unknown_name_is_dark() {
        assert_eq!(ThemeMode::from_name("solarized"), ThemeMode::Dark);
    }
}

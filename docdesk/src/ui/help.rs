//! Help overlay and the clear-chat confirmation dialog.
//!
//! Both are drawn last in the same `terminal.draw()` closure, on top of a
//! `Clear`ed area.

use ratatui::{
    Frame,
    layout::Constraint,
    style::{Modifier, Style},
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::theme::Theme;

/// Draws the keybinding reference. Skipped on terminals narrower than 60 columns.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 60 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));
    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help  (j/k scroll, ? or Esc to dismiss) ")
        .border_style(Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(build_help_text(theme))
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

/// Draws the "clear chat history?" dialog.
pub fn render_confirm_clear(frame: &mut Frame, theme: &Theme, message_count: usize) {
    let area = frame
        .area()
        .centered(Constraint::Length(44), Constraint::Length(5));
    frame.render_widget(Clear, area);
    let block = Block::bordered()
        .title(" Clear chat ")
        .border_style(Style::default().fg(theme.error));
    let text = Text::from(vec![
        Line::raw(format!("Delete all {message_count} messages?")),
        Line::raw(""),
        Line::styled("y confirm · n cancel", Style::default().fg(theme.muted)),
    ]);
    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn build_help_text(theme: &Theme) -> Text<'static> {
    let section = |title: &'static str| {
        Line::styled(title, Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    };
    Text::from(vec![
        section("Views"),
        Line::from("  Tab / L       Next view"),
        Line::from("  S-Tab / H     Previous view"),
        Line::from("                Chat and Flow unlock after a successful analysis"),
        Line::from(""),
        section("Scrolling"),
        Line::from("  j / k         Down / up one line"),
        Line::from("  g / G         Top / bottom"),
        Line::from("  Ctrl-d / u    Half page down / up"),
        Line::from(""),
        section("Analysis"),
        Line::from("  a             Analyse again / retry (also in Flow)"),
        Line::from("  Ctrl-r        Reload the current analysis"),
        Line::from("  d             Show all / fewer key details"),
        Line::from("  s             Show / hide sentiment explanation"),
        Line::from("  e             Export analysis as JSON"),
        Line::from("  y / Y         Copy summary / key details"),
        Line::from(""),
        section("Chat"),
        Line::from("  i / Enter     Type a message (Enter sends, Esc cancels)"),
        Line::from("  1-9           Ask a suggested question"),
        Line::from("  p / P         Prefill a quick prompt"),
        Line::from("  r             Regenerate the last answer"),
        Line::from("  /             Search messages (Esc clears)"),
        Line::from("  C             Clear history (asks first)"),
        Line::from("  T             Show / hide message times"),
        Line::from("  y / Y         Copy last message / whole conversation"),
        Line::from("  e / E         Export chat as JSON / text"),
        Line::from(""),
        section("General"),
        Line::from("  t             Toggle dark / light theme"),
        Line::from("  ?             Open / close this help"),
        Line::from("  q / Esc       Quit"),
    ])
}

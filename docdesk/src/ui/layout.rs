//! Screen layout: view tabs on top, the active view, a one-row status bar.
//!
//! Pure layout arithmetic plus the two chrome widgets (tabs and status bar).
//! Called inside `terminal.draw()` on every render, so every frame reflects the
//! current terminal size.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Margin, Rect},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
};

use docdesk_core::{View, Workspace};

use crate::app::{AppState, Mode};
use crate::theme::Theme;

/// Returns `[tabs, main, status_bar]` for the current frame.
pub fn compute_layout(frame: &Frame) -> [Rect; 3] {
    frame.area().layout(&Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ]))
}

/// The panel area minus its 1-cell border.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Bordered block; thick and highlighted when `is_focused`.
pub fn panel_block<'a>(title: impl Into<Line<'a>>, is_focused: bool, theme: &Theme) -> Block<'a> {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_focused { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
        .merge_borders(MergeStrategy::Fuzzy)
}

/// Tab header text; locked views say so.
fn tab_label(view: View, locked: bool) -> String {
    if locked {
        format!("{} [locked]", view.title())
    } else {
        view.title().to_owned()
    }
}

/// Draws one cell per view and returns the cells for mouse hit-testing.
///
/// Chat and Flow are dimmed and marked locked until an analysis result exists.
pub fn render_tabs(frame: &mut Frame, area: Rect, workspace: &Workspace, theme: &Theme) -> [Rect; 3] {
    let cells: [Rect; 3] = area.layout(&Layout::horizontal([Constraint::Ratio(1, 3); 3]));
    let unlocked = workspace.result().is_some();

    for (view, cell) in View::ALL.iter().zip(cells) {
        let active = *view == workspace.view();
        let locked = *view != View::Analysis && !unlocked;
        let label = tab_label(*view, locked);
        let style = if active {
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else if locked {
            Style::default().fg(theme.tab_locked)
        } else {
            Style::default().fg(theme.text)
        };
        frame.render_widget(
            Paragraph::new(Span::styled(label, style)).alignment(Alignment::Center),
            cell,
        );
    }
    cells
}

/// The bottom row: mode, progress of any outstanding call, status message.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, workspace: &Workspace, theme: &Theme) {
    let (mode_text, mode_fg) = match state.mode {
        Mode::Insert => (" INSERT ", theme.status_mode_insert),
        Mode::Search => (" SEARCH ", theme.status_mode_insert),
        Mode::Normal | Mode::HelpOverlay | Mode::ConfirmClear => (" NORMAL ", theme.status_mode_normal),
    };

    let mut spans = vec![Span::styled(
        mode_text,
        Style::default().fg(mode_fg).add_modifier(Modifier::BOLD),
    )];

    let run = workspace.run_state();
    if run.is_analyzing {
        spans.push(Span::raw(format!(" analysing {}% ", run.analysis_progress)));
    }
    if run.is_fetching_flow {
        spans.push(Span::raw(format!(" flow {}% ", run.flow_progress)));
    }
    if run.is_bot_typing {
        spans.push(Span::raw(format!(" replying {}% ", run.chat_progress)));
    }

    match &state.status {
        Some(status) => {
            let fg = if status.is_error { theme.error } else { theme.status_bar_fg };
            spans.push(Span::styled(format!(" {} ", status.text), Style::default().fg(fg)));
        }
        None => spans.push(Span::styled(
            format!(" {} docs · ? help ", workspace.selection().selected().count()),
            Style::default().fg(theme.status_bar_fg),
        )),
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}

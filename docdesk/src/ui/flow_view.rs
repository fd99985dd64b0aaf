//! Flow view: draws the [`TimelineView`] state chosen by `docdesk_core::timeline`.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Gauge, Paragraph, Wrap},
};

use docdesk_core::timeline::{TimelineEntry, TimelineView};
use docdesk_core::types::FlowIcon;
use docdesk_core::Workspace;

use crate::app::AppState;
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

pub fn render(frame: &mut Frame, area: Rect, state: &AppState, workspace: &Workspace, theme: &Theme) {
    frame.render_widget(panel_block(" Document Flow ", true, theme), area);
    let inner = inner_rect(area);
    let muted = Style::default().fg(theme.muted);

    let lines = match workspace.timeline() {
        TimelineView::Fetching { progress } => {
            let [label, gauge, _] = inner.layout(&Layout::vertical([
                Constraint::Length(2),
                Constraint::Length(1),
                Constraint::Fill(1),
            ]));
            frame.render_widget(Paragraph::new("Building document flow..."), label);
            frame.render_widget(
                Gauge::default()
                    .gauge_style(Style::default().fg(theme.gauge))
                    .percent(u16::from(progress.min(100))),
                gauge,
            );
            return;
        }
        TimelineView::Failed { message } => vec![
            Line::styled("Could not build the document flow", Style::default().fg(theme.error).add_modifier(Modifier::BOLD)),
            Line::raw(""),
            Line::raw(message),
            Line::raw(""),
            Line::styled("Press a to Retry Analysis & Flow.", muted),
        ],
        TimelineView::NotRun { has_selection: true } => {
            vec![Line::styled("No flow data yet. Press a to Run Analysis & Flow.", muted)]
        }
        TimelineView::NotRun { has_selection: false } => {
            vec![Line::styled("No flow data yet. Select documents to Run Analysis & Flow.", muted)]
        }
        TimelineView::Empty => vec![
            Line::styled("No Flow Information", Style::default().add_modifier(Modifier::BOLD)),
            Line::styled("The documents did not reveal a sequence of events.", muted),
        ],
        TimelineView::Populated(entries) => entries.iter().flat_map(|e| entry_lines(e, theme)).collect(),
    };

    let max_scroll = u16::try_from(lines.len().saturating_sub(1)).unwrap_or(u16::MAX);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: false })
            .scroll((state.flow_scroll.min(max_scroll), 0)),
        inner,
    );
}

fn entry_lines(entry: &TimelineEntry, theme: &Theme) -> Vec<Line<'static>> {
    let colour = theme.flow_status(entry.status);
    let muted = Style::default().fg(theme.muted);
    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{} ", icon_glyph(entry.icon)), Style::default().fg(colour)),
            Span::styled(entry.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(format!("[{}]", entry.badge), Style::default().fg(colour)),
        ]),
        Line::from(vec![
            Span::styled("│ ", Style::default().fg(colour)),
            Span::styled(entry.date_label.clone(), muted),
            Span::styled(format!("  {}", entry.source), muted),
        ]),
    ];
    if !entry.description.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("│ ", Style::default().fg(colour)),
            Span::raw(entry.description.clone()),
        ]));
    }
    if !entry.participants.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("│ ", Style::default().fg(colour)),
            Span::styled(format!("with {}", entry.participants.join(", ")), muted),
        ]));
    }
    lines.push(Line::styled("│", Style::default().fg(colour)));
    lines
}

fn icon_glyph(icon: FlowIcon) -> &'static str {
    match icon {
        FlowIcon::FilePlus => "+",
        FlowIcon::FileText => "≡",
        FlowIcon::Send => "➤",
        FlowIcon::Truck => "⛟",
        FlowIcon::CheckCircle => "✔",
        FlowIcon::XCircle => "✘",
        FlowIcon::Mail => "✉",
        FlowIcon::FileCheck => "☑",
        FlowIcon::Package => "▣",
        FlowIcon::Receipt => "§",
        FlowIcon::UserCheck => "☺",
        FlowIcon::Merge => "⑂",
    }
}

//! Analysis view: progress while a run is outstanding, then the result.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Gauge, Paragraph, Wrap},
};

use docdesk_core::types::AnalysisResult;
use docdesk_core::Workspace;

use crate::app::AppState;
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

/// Key details shown before "Show N More".
pub const COLLAPSED_DETAILS: usize = 3;

const SCORE_BAR_WIDTH: usize = 20;

pub fn render(frame: &mut Frame, area: Rect, state: &AppState, workspace: &Workspace, theme: &Theme) {
    frame.render_widget(panel_block(" Analysis ", true, theme), area);
    let inner = inner_rect(area);
    let run = workspace.run_state();

    if run.is_analyzing {
        render_progress(frame, inner, run.analysis_progress, theme);
        return;
    }
    if let Some(error) = &run.analysis_error {
        let text = Text::from(vec![
            Line::styled("Analysis failed", Style::default().fg(theme.error).add_modifier(Modifier::BOLD)),
            Line::raw(""),
            Line::raw(error.clone()),
            Line::raw(""),
            Line::styled("Press a to retry.", Style::default().fg(theme.muted)),
        ]);
        frame.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), inner);
        return;
    }
    let Some(result) = workspace.result() else {
        let hint = if workspace.selection().is_empty() {
            "No documents selected. Start docdesk with --doc <ID> or --selection <FILE>."
        } else {
            "Press a to analyse the selected documents."
        };
        frame.render_widget(Paragraph::new(hint).style(Style::default().fg(theme.muted)), inner);
        return;
    };

    let lines = result_lines(result, state, theme);
    let max_scroll = u16::try_from(lines.len().saturating_sub(1)).unwrap_or(u16::MAX);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: false })
            .scroll((state.analysis_scroll.min(max_scroll), 0)),
        inner,
    );
}

fn render_progress(frame: &mut Frame, area: Rect, progress: u8, theme: &Theme) {
    let [label, gauge, _] = area.layout(&Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(1),
        Constraint::Fill(1),
    ]));
    frame.render_widget(Paragraph::new("Analysing documents..."), label);
    frame.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(theme.gauge))
            .percent(u16::from(progress.min(100))),
        gauge,
    );
}

fn heading<'a>(title: &'a str, theme: &Theme) -> Line<'a> {
    Line::styled(title, Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
}

fn result_lines<'a>(result: &'a AnalysisResult, state: &AppState, theme: &Theme) -> Vec<Line<'a>> {
    let mut lines = vec![heading("Summary", theme), Line::raw(result.summary.as_str()), Line::raw("")];

    lines.push(heading("Key details", theme));
    let shown = if state.show_all_details {
        result.key_details.len()
    } else {
        COLLAPSED_DETAILS.min(result.key_details.len())
    };
    for detail in &result.key_details[..shown] {
        lines.push(Line::from(vec![
            Span::styled(format!("  {}: ", detail.key), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(detail.display_value()),
        ]));
    }
    let hidden = result.key_details.len() - shown;
    if hidden > 0 {
        lines.push(Line::styled(format!("  Show {hidden} More (d)"), Style::default().fg(theme.muted)));
    } else if result.key_details.len() > COLLAPSED_DETAILS {
        lines.push(Line::styled("  Show Less (d)", Style::default().fg(theme.muted)));
    }
    lines.push(Line::raw(""));

    let sentiment = &result.sentiment;
    lines.push(heading("Sentiment", theme));
    lines.push(Line::from(vec![
        Span::styled(
            format!("  {}", sentiment.label.as_str()),
            Style::default().fg(theme.sentiment(sentiment.label)).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  {:.0}% confidence", sentiment.confidence * 100.0)),
    ]));
    lines.push(score_bar(sentiment.score, theme));
    if state.show_reasoning {
        lines.push(Line::raw(format!("  {}", sentiment.reasoning)));
        lines.push(Line::styled("  Hide explanation (s)", Style::default().fg(theme.muted)));
    } else {
        lines.push(Line::styled("  Show explanation (s)", Style::default().fg(theme.muted)));
    }
    lines.push(Line::raw(""));

    push_list(&mut lines, "Actionable items", &result.actionable_items, theme);
    push_list(&mut lines, "Delay indicators", &result.delay_indicators, theme);

    lines.push(heading("Suggested questions", theme));
    for (i, question) in result.suggested_questions.iter().enumerate() {
        lines.push(Line::raw(format!("  {}. {question}", i + 1)));
    }
    lines
}

fn push_list<'a>(lines: &mut Vec<Line<'a>>, title: &'a str, items: &'a [String], theme: &Theme) {
    lines.push(heading(title, theme));
    if items.is_empty() {
        lines.push(Line::styled("  None", Style::default().fg(theme.muted)));
    }
    for item in items {
        lines.push(Line::raw(format!("  • {item}")));
    }
    lines.push(Line::raw(""));
}

/// `  [██████░░░░] 62/100`
fn score_bar(score: f64, theme: &Theme) -> Line<'static> {
    let score = score.clamp(0.0, 100.0);
    let filled = ((score / 100.0) * SCORE_BAR_WIDTH as f64).round() as usize;
    Line::from(vec![
        Span::raw("  ["),
        Span::styled("█".repeat(filled), Style::default().fg(theme.gauge)),
        Span::styled("░".repeat(SCORE_BAR_WIDTH - filled), Style::default().fg(theme.muted)),
        Span::raw(format!("] {score:.0}/100")),
    ])
}

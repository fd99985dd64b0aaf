//! Chat view: conversation, typing indicator, compose line.

use chrono::Local;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Gauge, Paragraph, Wrap},
};

use docdesk_core::chat::QUICK_PROMPTS;
use docdesk_core::types::{ChatMessage, Sender};
use docdesk_core::Workspace;

use crate::app::{AppState, Mode};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

pub fn render(frame: &mut Frame, area: Rect, state: &AppState, workspace: &Workspace, theme: &Theme) {
    let typing = workspace.run_state().is_bot_typing;
    let [conversation, indicator, compose] = area.layout(&Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(u16::from(typing)),
        Constraint::Length(3),
    ]));

    let title = if state.search_query.is_empty() {
        " Chat ".to_owned()
    } else {
        format!(" Chat, filtered by \"{}\" ", state.search_query)
    };
    frame.render_widget(panel_block(title, state.mode != Mode::Insert, theme), conversation);
    let inner = inner_rect(conversation);

    let lines = if workspace.history().is_empty() {
        empty_lines(workspace, theme)
    } else {
        let messages = workspace.search_chat(&state.search_query);
        if messages.is_empty() {
            vec![Line::styled(
                "No messages found matching your search.",
                Style::default().fg(theme.muted),
            )]
        } else {
            conversation_lines(&messages, state.show_timestamps, theme)
        }
    };
    let max_scroll = u16::try_from(lines.len().saturating_sub(1)).unwrap_or(u16::MAX);
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: false })
            .scroll((state.chat_scroll.min(max_scroll), 0)),
        inner,
    );

    if typing {
        frame.render_widget(
            Gauge::default()
                .label("Assistant is typing...")
                .gauge_style(Style::default().fg(theme.gauge))
                .percent(u16::from(workspace.run_state().chat_progress.min(100))),
            indicator,
        );
    }

    render_compose(frame, compose, state, workspace, theme);
}

fn empty_lines<'a>(workspace: &'a Workspace, theme: &Theme) -> Vec<Line<'a>> {
    let mut lines = vec![
        Line::styled("Start a conversation", Style::default().add_modifier(Modifier::BOLD)),
        Line::styled("Ask questions about your analysed documents.", Style::default().fg(theme.muted)),
    ];
    let questions = workspace
        .result()
        .map(|r| r.suggested_questions.as_slice())
        .unwrap_or_default();
    if !questions.is_empty() {
        lines.push(Line::raw(""));
        lines.push(Line::styled("Suggested questions", Style::default().fg(theme.accent)));
        for (i, question) in questions.iter().take(9).enumerate() {
            lines.push(Line::raw(format!("  {}  {question}", i + 1)));
        }
    }
    lines
}

fn conversation_lines<'a>(messages: &[&'a ChatMessage], show_timestamps: bool, theme: &Theme) -> Vec<Line<'a>> {
    let mut lines = Vec::new();
    for &message in messages {
        let (who, colour) = match message.sender {
            Sender::User => ("You", theme.user_message),
            Sender::Bot if message.id.starts_with("bot-error-") => ("Assistant", theme.error),
            Sender::Bot => ("Assistant", theme.bot_message),
        };
        let mut header = vec![Span::styled(who, Style::default().fg(colour).add_modifier(Modifier::BOLD))];
        if show_timestamps {
            if let Some(at) = message.sent_at() {
                header.push(Span::styled(
                    format!("  {}", at.with_timezone(&Local).format("%H:%M")),
                    Style::default().fg(theme.muted),
                ));
            }
        }
        lines.push(Line::from(header));
        for line in message.text.lines() {
            lines.push(Line::styled(line, Style::default().fg(colour)));
        }
        lines.push(Line::raw(""));
    }
    lines
}

fn render_compose(frame: &mut Frame, area: Rect, state: &AppState, workspace: &Workspace, theme: &Theme) {
    let (title, body) = match state.mode {
        Mode::Search => (" Search (Enter keep, Esc clear) ", format!("/{}", state.search_query)),
        Mode::Insert => (" Message (Enter send, Esc cancel) ", format!("{}▏", state.input)),
        _ => {
            let hint = if workspace.history().is_empty() {
                "i type · 1-9 suggested question".to_owned()
            } else {
                format!(
                    "i type · r regenerate · / search · T times · y copy · C clear · p \"{}\" · P \"{}\"",
                    QUICK_PROMPTS[0], QUICK_PROMPTS[1]
                )
            };
            (" Message ", hint)
        }
    };
    let style = if matches!(state.mode, Mode::Insert | Mode::Search) {
        Style::default().fg(theme.text)
    } else {
        Style::default().fg(theme.muted)
    };
    frame.render_widget(
        Paragraph::new(Span::styled(body, style))
            .block(panel_block(title, matches!(state.mode, Mode::Insert | Mode::Search), theme)),
        area,
    );
}

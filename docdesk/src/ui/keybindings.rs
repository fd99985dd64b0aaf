//! Keybinding dispatcher for docdesk.
//!
//! Translates crossterm key and mouse events into `AppState` changes and
//! workspace operations, and returns a `KeyAction` telling the event loop
//! whether to continue or quit. The dispatcher branches on `state.mode` first,
//! then on the active view.
//!
//! Workspace guards are never bypassed: every refused request ends up as an
//! error on the status bar.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Position;

use docdesk_core::chat::QUICK_PROMPTS;
use docdesk_core::export::ExportFormat;
use docdesk_core::types::Sender;
use docdesk_core::{View, Workspace};

use crate::app::{AppState, Mode};
use crate::clipboard;

/// Control-flow signal returned from the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
}

pub fn handle_key(key: KeyEvent, state: &mut AppState, workspace: &mut Workspace) -> KeyAction {
    match state.mode {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::ConfirmClear => handle_confirm_clear(key, state, workspace),
        Mode::Insert => handle_insert(key, state, workspace),
        Mode::Search => handle_search(key, state),
        Mode::Normal => handle_normal(key, state, workspace),
    }
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, state: &mut AppState, workspace: &mut Workspace) -> KeyAction {
    let view = workspace.view();
    if let Some(action) = handle_scroll_key(key, state, view) {
        return action;
    }
    let handled = match view {
        View::Analysis => handle_analysis_key(key, state, workspace),
        View::Chat => handle_chat_key(key, state, workspace),
        View::Flow => None,
    };
    if let Some(action) = handled {
        return action;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Tab | KeyCode::Char('L') => switch_view(state, workspace, view.next()),
        KeyCode::BackTab | KeyCode::Char('H') => switch_view(state, workspace, view.prev()),

        KeyCode::Char('r') if ctrl => {
            match workspace.set_reload(true) {
                Some(_) => {
                    state.reset_views();
                    state.info("Reloading analysis");
                }
                None => state.error("Nothing to reload yet"),
            }
            KeyAction::Continue
        }
        KeyCode::Char('a') => {
            match workspace.reanalyze() {
                Ok(_) => {
                    state.reset_views();
                    state.info("Analysing documents");
                }
                Err(e) => state.error(e.to_string()),
            }
            KeyAction::Continue
        }

        KeyCode::Char('y') => copy_to_clipboard(view, false, state, workspace),
        KeyCode::Char('Y') => copy_to_clipboard(view, true, state, workspace),

        KeyCode::Char('t') => {
            state.theme.toggle();
            tracing::debug!(theme = state.theme.mode().name(), "theme toggled");
            KeyAction::Continue
        }
        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
            KeyAction::Continue
        }
        KeyCode::Esc if !state.search_query.is_empty() => {
            state.search_query.clear();
            KeyAction::Continue
        }
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        _ => KeyAction::Continue,
    }
}

fn copy_to_clipboard(view: View, whole: bool, state: &mut AppState, workspace: &Workspace) -> KeyAction {
    match copy_source(view, whole, workspace) {
        None => state.error("Nothing to copy"),
        Some(text) => match clipboard::copy(&text) {
            Ok(()) => state.info("Copied to clipboard"),
            Err(e) => state.error(format!("Copy failed: {e}")),
        },
    }
    KeyAction::Continue
}

/// What `y` (`whole == false`) or `Y` copies in `view`.
///
/// Analysis: the summary, or every key detail. Chat: the latest message, or
/// the whole conversation.
fn copy_source(view: View, whole: bool, workspace: &Workspace) -> Option<String> {
    match view {
        View::Analysis => {
            let result = workspace.result()?;
            if !whole {
                return Some(result.summary.clone());
            }
            let lines: Vec<String> = result
                .key_details
                .iter()
                .map(|d| format!("{}: {}", d.key, d.display_value()))
                .collect();
            (!lines.is_empty()).then(|| lines.join("\n"))
        }
        View::Chat => {
            let history = workspace.history();
            if !whole {
                return history.last().map(|m| m.text.clone());
            }
            let lines: Vec<String> = history
                .iter()
                .map(|m| format!("{}: {}", sender_name(m.sender), m.text))
                .collect();
            (!lines.is_empty()).then(|| lines.join("\n\n"))
        }
        View::Flow => None,
    }
}

fn sender_name(sender: Sender) -> &'static str {
    match sender {
        Sender::User => "You",
        Sender::Bot => "Assistant",
    }
}

fn switch_view(state: &mut AppState, workspace: &mut Workspace, target: View) -> KeyAction {
    if let Err(locked) = workspace.switch_view(target) {
        state.error(locked.to_string());
    }
    KeyAction::Continue
}

/// j / k / g / G and Ctrl-d / Ctrl-u on the active view.
fn handle_scroll_key(key: KeyEvent, state: &mut AppState, view: View) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.scroll_down(view, 1),
        KeyCode::Char('k') | KeyCode::Up => state.scroll_up(view, 1),
        KeyCode::Char('g') | KeyCode::Home => state.scroll_top(view),
        KeyCode::Char('G') | KeyCode::End => state.scroll_bottom(view),
        KeyCode::Char('d') if ctrl => state.half_page_down(view),
        KeyCode::Char('u') if ctrl => state.half_page_up(view),
        _ => return None,
    }
    Some(KeyAction::Continue)
}

fn handle_analysis_key(key: KeyEvent, state: &mut AppState, workspace: &Workspace) -> Option<KeyAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    match key.code {
        KeyCode::Char('d') => state.show_all_details = !state.show_all_details,
        KeyCode::Char('s') => state.show_reasoning = !state.show_reasoning,
        KeyCode::Char('e') => match workspace.export_analysis(&state.export_dir) {
            Ok(path) => state.info(format!("Saved {}", path.display())),
            Err(e) => state.error(e.to_string()),
        },
        _ => return None,
    }
    Some(KeyAction::Continue)
}

fn handle_chat_key(key: KeyEvent, state: &mut AppState, workspace: &mut Workspace) -> Option<KeyAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    match key.code {
        KeyCode::Char('i') | KeyCode::Enter => state.mode = Mode::Insert,
        KeyCode::Char('/') => state.mode = Mode::Search,
        KeyCode::Char('T') => state.show_timestamps = !state.show_timestamps,
        KeyCode::Char('r') => {
            if let Err(e) = workspace.regenerate_last_response() {
                state.error(e.to_string());
            } else {
                state.scroll_bottom(View::Chat);
            }
        }
        KeyCode::Char('C') => {
            if workspace.history().is_empty() {
                state.error("Chat is already empty");
            } else {
                state.mode = Mode::ConfirmClear;
            }
        }
        KeyCode::Char('p') => state.prefill(QUICK_PROMPTS[0]),
        KeyCode::Char('P') => state.prefill(QUICK_PROMPTS[1]),
        KeyCode::Char(c @ '1'..='9') if workspace.history().is_empty() => {
            let index = usize::from(c as u8 - b'1');
            let question = workspace
                .result()
                .and_then(|r| r.suggested_questions.get(index))
                .cloned();
            match question {
                Some(q) => {
                    send(&q, state, workspace);
                }
                None => state.error(format!("No suggested question {c}")),
            }
        }
        KeyCode::Char('e') => export_chat(ExportFormat::Json, state, workspace),
        KeyCode::Char('E') => export_chat(ExportFormat::Text, state, workspace),
        _ => return None,
    }
    Some(KeyAction::Continue)
}

fn export_chat(format: ExportFormat, state: &mut AppState, workspace: &Workspace) {
    match workspace.export_chat(format, &state.export_dir, &state.model) {
        Ok(path) => state.info(format!("Saved {}", path.display())),
        Err(e) => state.error(e.to_string()),
    }
}

/// Sends `text`; returns whether the workspace accepted it.
fn send(text: &str, state: &mut AppState, workspace: &mut Workspace) -> bool {
    match workspace.send_message(text) {
        Ok(_) => {
            state.scroll_bottom(View::Chat);
            true
        }
        Err(e) => {
            state.error(e.to_string());
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Insert and Search modes
// ---------------------------------------------------------------------------

fn handle_insert(key: KeyEvent, state: &mut AppState, workspace: &mut Workspace) -> KeyAction {
    match key.code {
        KeyCode::Esc => state.mode = Mode::Normal,
        KeyCode::Enter => {
            let text = std::mem::take(&mut state.input);
            if send(&text, state, workspace) {
                state.mode = Mode::Normal;
            } else {
                state.input = text;
            }
        }
        KeyCode::Backspace => {
            state.input.pop();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => state.input.push(c),
        _ => {}
    }
    KeyAction::Continue
}

fn handle_search(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Esc => {
            state.search_query.clear();
            state.mode = Mode::Normal;
        }
        KeyCode::Enter => state.mode = Mode::Normal,
        KeyCode::Backspace => {
            state.search_query.pop();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.search_query.push(c);
            state.chat_scroll = 0;
        }
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Overlays
// ---------------------------------------------------------------------------

fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') => state.help_scroll = state.help_scroll.saturating_add(1),
        KeyCode::Char('k') => state.help_scroll = state.help_scroll.saturating_sub(1),
        KeyCode::Char('g') => state.help_scroll = 0,
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

fn handle_confirm_clear(key: KeyEvent, state: &mut AppState, workspace: &mut Workspace) -> KeyAction {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            workspace.clear_chat();
            state.chat_scroll = 0;
            state.search_query.clear();
            state.mode = Mode::Normal;
            state.info("Chat history cleared");
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Mouse events
// ---------------------------------------------------------------------------

/// Click a tab to switch views; the wheel scrolls the active view or the help overlay.
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState, workspace: &mut Workspace) -> KeyAction {
    let view = workspace.view();
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) if state.mode == Mode::Normal => {
            let pos = Position { x: mouse.column, y: mouse.row };
            if let Some(target) = View::ALL
                .into_iter()
                .zip(state.tab_rects)
                .find_map(|(v, rect)| rect.contains(pos).then_some(v))
            {
                return switch_view(state, workspace, target);
            }
        }
        MouseEventKind::ScrollUp if state.mode == Mode::HelpOverlay => {
            state.help_scroll = state.help_scroll.saturating_sub(3);
        }
        MouseEventKind::ScrollDown if state.mode == Mode::HelpOverlay => {
            state.help_scroll = state.help_scroll.saturating_add(3);
        }
        MouseEventKind::ScrollUp => state.scroll_up(view, 3),
        MouseEventKind::ScrollDown => state.scroll_down(view, 3),
        _ => {}
    }
    KeyAction::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use docdesk_core::error::ServiceError;
    use docdesk_core::service::{ChatReply, ChatRequest, DocumentService};
    use docdesk_core::types::{
        AnalysisResult, DocumentId, DocumentSelection, FlowItem, KeyDetail, SelectionEntry, Sentiment,
        SentimentLabel,
    };
    use docdesk_core::{EventSink, WorkspaceEvent};

    use crate::theme::{ThemeContext, ThemeMode};

    /// Every call fails; tests apply settled events by hand instead.
    struct Offline;

    #[async_trait]
    impl DocumentService for Offline {
        async fn analyze(&self, _: &[DocumentId]) -> Result<String, ServiceError> {
            Err(ServiceError::InvalidResponse("offline".into()))
        }
        async fn fetch_flow(&self, _: &[DocumentId]) -> Result<Vec<FlowItem>, ServiceError> {
            Err(ServiceError::InvalidResponse("offline".into()))
        }
        async fn chat(&self, _: ChatRequest) -> Result<ChatReply, ServiceError> {
            Err(ServiceError::InvalidResponse("offline".into()))
        }
    }

    fn setup() -> (AppState, Workspace) {
        let state = AppState::new(ThemeContext::new(ThemeMode::Dark), ".".into(), "openai".into());
        let workspace = Workspace::new(Arc::new(Offline), EventSink::new(|_| true));
        (state, workspace)
    }

    /// A workspace holding an analysis result and one answered chat turn.
    fn analysed() -> (AppState, Workspace) {
        let (state, mut workspace) = setup();
        let run = workspace
            .on_selection_changed(DocumentSelection::new(vec![SelectionEntry::from_id(1)]))
            .expect("selection starts a run");
        let result = AnalysisResult {
            summary: "Invoice overdue".into(),
            key_details: vec![
                KeyDetail { key: "PO".into(), value: serde_json::json!("4471") },
                KeyDetail { key: "Total".into(), value: serde_json::json!(120) },
            ],
            sentiment: Sentiment {
                label: SentimentLabel::Neutral,
                reasoning: String::new(),
                confidence: 0.9,
                score: 50.0,
            },
            actionable_items: Vec::new(),
            delay_indicators: Vec::new(),
            suggested_questions: vec!["Who pays?".into()],
        };
        workspace.apply(WorkspaceEvent::AnalysisSettled { run, outcome: Ok(result) });
        let turn = workspace.send_message("Who pays?").expect("chat open");
        workspace.apply(WorkspaceEvent::ChatSettled { turn, outcome: Ok("ACME".into()) });
        (state, workspace)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn locked_views_report_on_status_bar() {
        let (mut state, mut workspace) = setup();
        handle_key(press(KeyCode::Tab), &mut state, &mut workspace);
        assert_eq!(workspace.view(), View::Analysis);
        assert!(state.status.as_ref().is_some_and(|s| s.is_error));
    }

    #[test]
    fn analyse_without_selection_is_refused() {
        let (mut state, mut workspace) = setup();
        handle_key(press(KeyCode::Char('a')), &mut state, &mut workspace);
        let status = state.status.expect("status set");
        assert_eq!(status.text, "no documents selected");
        assert!(!workspace.run_state().is_analyzing);
    }

    #[test]
    fn theme_toggle_and_help() {
        let (mut state, mut workspace) = setup();
        handle_key(press(KeyCode::Char('t')), &mut state, &mut workspace);
        assert_eq!(state.theme.mode(), ThemeMode::Light);
        handle_key(press(KeyCode::Char('?')), &mut state, &mut workspace);
        assert_eq!(state.mode, Mode::HelpOverlay);
        assert_eq!(
            handle_key(press(KeyCode::Char('q')), &mut state, &mut workspace),
            KeyAction::Continue
        );
        assert_eq!(state.mode, Mode::Normal);
        assert_eq!(
            handle_key(press(KeyCode::Char('q')), &mut state, &mut workspace),
            KeyAction::Quit
        );
    }

    #[test]
    fn refused_send_keeps_the_draft() {
        let (mut state, mut workspace) = setup();
        state.mode = Mode::Insert;
        for c in "hi".chars() {
            handle_key(press(KeyCode::Char(c)), &mut state, &mut workspace);
        }
        handle_key(press(KeyCode::Enter), &mut state, &mut workspace);
        assert_eq!(state.input, "hi");
        assert_eq!(state.mode, Mode::Insert);
        assert!(workspace.history().is_empty());
    }

    #[tokio::test]
    async fn copy_picks_text_for_the_active_view() {
        let (_, mut workspace) = analysed();
        assert_eq!(copy_source(View::Analysis, false, &workspace).as_deref(), Some("Invoice overdue"));
        assert_eq!(copy_source(View::Analysis, true, &workspace).as_deref(), Some("PO: 4471\nTotal: 120"));
        assert_eq!(copy_source(View::Chat, false, &workspace).as_deref(), Some("ACME"));
        assert_eq!(
            copy_source(View::Chat, true, &workspace).as_deref(),
            Some("You: Who pays?\n\nAssistant: ACME")
        );
        assert_eq!(copy_source(View::Flow, false, &workspace), None);

        workspace.clear_chat();
        assert_eq!(copy_source(View::Chat, false, &workspace), None);
    }

    #[test]
    fn nothing_to_copy_before_analysis() {
        let (mut state, mut workspace) = setup();
        assert_eq!(copy_source(View::Analysis, false, &workspace), None);
        handle_key(press(KeyCode::Char('y')), &mut state, &mut workspace);
        let status = state.status.expect("status set");
        assert!(status.is_error);
        assert_eq!(status.text, "Nothing to copy");
    }

    #[tokio::test]
    async fn timestamps_toggle_in_chat() {
        let (mut state, mut workspace) = analysed();
        workspace.switch_view(View::Chat).unwrap();
        assert!(!state.show_timestamps);
        handle_key(press(KeyCode::Char('T')), &mut state, &mut workspace);
        assert!(state.show_timestamps);
        handle_key(press(KeyCode::Char('T')), &mut state, &mut workspace);
        assert!(!state.show_timestamps);
    }
}

//! Chat turns against a scripted backend, on paused time.

mod common;

use common::{analysis_json, Harness};
use docdesk_core::chat::TurnPhase;
use docdesk_core::error::{ServiceError, ValidationError};
use docdesk_core::export::ExportFormat;
use docdesk_core::progress::PROGRESS_CAP;
use docdesk_core::service::ChatReply;
use docdesk_core::types::{ChatMessage, Sender};

fn texts(h: &Harness) -> Vec<(Sender, String)> {
    h.workspace
        .history()
        .iter()
        .map(|m| (m.sender, m.text.clone()))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn send_without_analysis_changes_nothing() {
    let mut h = Harness::new();
    assert_eq!(h.workspace.send_message("hi"), Err(ValidationError::NoAnalysis));
    assert!(h.workspace.history().is_empty());
    assert!(h.service.chat_requests.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn blank_and_overlapping_sends_are_refused() {
    let mut h = Harness::analysed(&[1], "S").await;
    assert_eq!(h.workspace.send_message("   \n"), Err(ValidationError::BlankInput));
    assert!(h.workspace.history().is_empty());

    h.service.chat_answer(1_000, "first answer");
    h.workspace.send_message("first").unwrap();
    assert!(h.workspace.run_state().is_bot_typing);
    assert_eq!(h.workspace.send_message("second"), Err(ValidationError::TurnInFlight));
    assert_eq!(h.workspace.history().len(), 1);

    // Still blocked while the reply settles.
    h.run_until(|ws| ws.chat().phase() == TurnPhase::Settling).await;
    assert_eq!(h.workspace.run_state().chat_progress, 100);
    assert_eq!(h.workspace.send_message("second"), Err(ValidationError::TurnInFlight));

    h.settle_chat().await;
    assert_eq!(h.workspace.run_state().chat_progress, 0);
    assert_eq!(
        texts(&h),
        vec![
            (Sender::User, "first".to_string()),
            (Sender::Bot, "first answer".to_string()),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn request_carries_documents_history_and_trimmed_question() {
    let mut h = Harness::analysed(&[4, 2], "S").await;
    h.service.chat_answer(10, "ok");
    h.workspace.send_message("  what is due?  ").unwrap();
    h.settle_chat().await;

    let request = h.service.last_chat_request();
    assert_eq!(request.question, "what is due?");
    assert_eq!(request.document_ids, vec![4, 2]);
    let sent: Vec<ChatMessage> = serde_json::from_str(&request.history).unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].text, "what is due?");
    assert!(sent[0].id.starts_with("user-"));
}

#[tokio::test(start_paused = true)]
async fn chat_progress_stays_under_cap_while_waiting() {
    let mut h = Harness::analysed(&[1], "S").await;
    h.service.chat_answer(5_000, "slow");
    h.workspace.send_message("q").unwrap();
    h.run_until(|ws| ws.run_state().chat_progress == PROGRESS_CAP).await;
    assert_eq!(h.workspace.chat().phase(), TurnPhase::AwaitingResponse);
    h.settle_chat().await;
    assert_eq!(h.workspace.history().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn regenerate_replaces_the_last_reply() {
    let mut h = Harness::analysed(&[1], "S").await;
    h.service.chat_answer(10, "X");
    h.workspace.send_message("A").unwrap();
    h.settle_chat().await;

    h.service.chat_answer(10, "Y");
    h.workspace.regenerate_last_response().unwrap();
    assert_eq!(texts(&h), vec![(Sender::User, "A".to_string())]);
    h.settle_chat().await;

    assert_eq!(
        texts(&h),
        vec![(Sender::User, "A".to_string()), (Sender::Bot, "Y".to_string())]
    );
    let request = h.service.last_chat_request();
    assert_eq!(request.question, "A");
    let sent: Vec<ChatMessage> = serde_json::from_str(&request.history).unwrap();
    assert_eq!(sent.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn regenerate_needs_a_question() {
    let mut h = Harness::analysed(&[1], "S").await;
    assert_eq!(
        h.workspace.regenerate_last_response(),
        Err(ValidationError::NothingToRegenerate)
    );
}

#[tokio::test(start_paused = true)]
async fn failures_become_bot_messages() {
    let mut h = Harness::analysed(&[1], "S").await;
    h.service.chat(
        10,
        Err(ServiceError::Status {
            endpoint: "LLM API",
            status: 500,
        }),
    );
    h.workspace.send_message("one").unwrap();
    h.settle_chat().await;

    h.service.chat(10, Ok(ChatReply { text: None }));
    h.workspace.send_message("two").unwrap();
    h.settle_chat().await;

    let history = h.workspace.history();
    assert_eq!(history.len(), 4);
    assert_eq!(
        history[1].text,
        "Sorry, an error occurred: LLM API request failed with status 500"
    );
    assert!(history[1].id.starts_with("bot-error-"));
    assert_eq!(history[3].text, "Sorry, an error occurred: Failed to respond.");
}

#[tokio::test(start_paused = true)]
async fn whitespace_reply_is_shown_as_is() {
    let mut h = Harness::analysed(&[1], "S").await;
    h.service.chat_answer(10, "  ");
    h.workspace.send_message("anything?").unwrap();
    h.settle_chat().await;

    let history = h.workspace.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].text, "  ");
    assert!(history[1].id.starts_with("bot-"));
    assert!(!history[1].id.starts_with("bot-error-"));
}

#[tokio::test(start_paused = true)]
async fn late_reply_after_reanalysis_is_dropped() {
    let mut h = Harness::analysed(&[1], "S").await;
    h.service.chat_answer(2_000, "late");
    h.workspace.send_message("q").unwrap();

    h.service.analyze(100, Ok(analysis_json("again", "Positive")));
    h.service.flow(100, Ok(Vec::new()));
    h.workspace.reanalyze().unwrap();
    assert!(!h.workspace.run_state().is_bot_typing);
    h.settle_run().await;

    tokio::time::sleep(std::time::Duration::from_secs(3)).await;
    h.step().await;
    assert!(h.workspace.history().is_empty());
}

#[tokio::test(start_paused = true)]
async fn search_and_clear() {
    let mut h = Harness::analysed(&[1], "S").await;
    h.service.chat_answer(10, "The Invoice total is 42");
    h.workspace.send_message("invoice total?").unwrap();
    h.settle_chat().await;

    let hits = h.workspace.search_chat("INVOICE");
    assert_eq!(hits.len(), 2);
    assert_eq!(h.workspace.search_chat("").len(), 2);
    assert!(h.workspace.search_chat("shipping").is_empty());
    assert_eq!(h.workspace.history().len(), 2);

    h.workspace.clear_chat();
    assert!(h.workspace.history().is_empty());
}

#[tokio::test(start_paused = true)]
async fn json_export_holds_history_verbatim() {
    let mut h = Harness::analysed(&[1, 2], "S").await;
    h.service.chat_answer(10, "first");
    h.workspace.send_message("a").unwrap();
    h.settle_chat().await;
    h.service.chat_answer(10, "{\"not\": \"parsed\"}");
    h.workspace.send_message("b").unwrap();
    h.settle_chat().await;

    let dir = tempfile::tempdir().unwrap();
    let path = h
        .workspace
        .export_chat(ExportFormat::Json, dir.path(), "openai")
        .unwrap();
    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("chat-history-"));

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let messages: Vec<ChatMessage> = serde_json::from_value(json["messages"].clone()).unwrap();
    assert_eq!(messages, h.workspace.history());
    assert_eq!(json["documentCount"], 2);
    assert_eq!(json["model"], "openai");
}

#[tokio::test(start_paused = true)]
async fn text_export_of_empty_chat_is_refused() {
    let h = Harness::analysed(&[1], "S").await;
    let dir = tempfile::tempdir().unwrap();
    assert!(h.workspace.export_chat(ExportFormat::Text, dir.path(), "openai").is_err());
}

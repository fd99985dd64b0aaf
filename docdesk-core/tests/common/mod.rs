//! Scripted backend and event pump shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use docdesk_core::error::ServiceError;
use docdesk_core::service::{ChatReply, ChatRequest, DocumentService};
use docdesk_core::types::{DocumentId, DocumentSelection, FlowIcon, FlowItem, FlowStatus, SelectionEntry};
use docdesk_core::{EventSink, Workspace, WorkspaceEvent};

type Script<T> = Mutex<VecDeque<(Duration, Result<T, ServiceError>)>>;

/// Backend that answers from per-endpoint queues after a scripted delay.
#[derive(Default)]
pub struct ScriptedService {
    analyze: Script<String>,
    flow: Script<Vec<FlowItem>>,
    chat: Script<ChatReply>,
    pub analyze_calls: Mutex<Vec<Vec<DocumentId>>>,
    pub chat_requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedService {
    pub fn analyze(&self, delay_ms: u64, outcome: Result<String, ServiceError>) {
        push(&self.analyze, delay_ms, outcome);
    }

    pub fn flow(&self, delay_ms: u64, outcome: Result<Vec<FlowItem>, ServiceError>) {
        push(&self.flow, delay_ms, outcome);
    }

    pub fn chat(&self, delay_ms: u64, outcome: Result<ChatReply, ServiceError>) {
        push(&self.chat, delay_ms, outcome);
    }

    pub fn chat_answer(&self, delay_ms: u64, text: &str) {
        self.chat(
            delay_ms,
            Ok(ChatReply {
                text: Some(text.to_owned()),
            }),
        );
    }

    pub fn last_chat_request(&self) -> ChatRequest {
        self.chat_requests.lock().unwrap().last().cloned().expect("no chat request")
    }
}

fn push<T>(script: &Script<T>, delay_ms: u64, outcome: Result<T, ServiceError>) {
    script
        .lock()
        .unwrap()
        .push_back((Duration::from_millis(delay_ms), outcome));
}

async fn answer<T>(script: &Script<T>, what: &str) -> Result<T, ServiceError> {
    let (delay, outcome) = script
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| panic!("unscripted {what} call"));
    tokio::time::sleep(delay).await;
    outcome
}

#[async_trait]
impl DocumentService for ScriptedService {
    async fn analyze(&self, document_ids: &[DocumentId]) -> Result<String, ServiceError> {
        self.analyze_calls.lock().unwrap().push(document_ids.to_vec());
        answer(&self.analyze, "analyze").await
    }

    async fn fetch_flow(&self, _document_ids: &[DocumentId]) -> Result<Vec<FlowItem>, ServiceError> {
        answer(&self.flow, "flow").await
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, ServiceError> {
        self.chat_requests.lock().unwrap().push(request);
        answer(&self.chat, "chat").await
    }
}

/// A workspace wired to a [`ScriptedService`] and the receiving end of its sink.
pub struct Harness {
    pub workspace: Workspace,
    pub service: Arc<ScriptedService>,
    rx: UnboundedReceiver<WorkspaceEvent>,
}

impl Harness {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let service = Arc::new(ScriptedService::default());
        let workspace = Workspace::new(service.clone(), EventSink::from_sender(tx));
        Self { workspace, service, rx }
    }

    pub async fn next_event(&mut self) -> WorkspaceEvent {
        self.rx.recv().await.expect("event sink dropped")
    }

    pub async fn step(&mut self) {
        let event = self.next_event().await;
        self.workspace.apply(event);
    }

    /// Applies events until `done` holds.
    pub async fn run_until(&mut self, mut done: impl FnMut(&Workspace) -> bool) {
        while !done(&self.workspace) {
            self.step().await;
        }
    }

    pub async fn settle_run(&mut self) {
        self.run_until(|ws| {
            let state = ws.run_state();
            !state.is_analyzing && !state.is_fetching_flow
        })
        .await;
    }

    pub async fn settle_chat(&mut self) {
        self.run_until(|ws| !ws.run_state().is_bot_typing).await;
    }

    /// Selects `ids`, which starts the first run, and waits for it to finish.
    pub async fn analysed(ids: &[DocumentId], summary: &str) -> Self {
        let mut h = Self::new();
        h.service.analyze(100, Ok(analysis_json(summary, "Positive")));
        h.service.flow(100, Ok(vec![flow_item("f1", FlowStatus::Completed)]));
        h.workspace
            .on_selection_changed(selection(ids))
            .expect("selection starts a run");
        h.settle_run().await;
        h
    }
}

pub fn selection(ids: &[DocumentId]) -> DocumentSelection {
    DocumentSelection::new(ids.iter().copied().map(SelectionEntry::from_id).collect())
}

pub fn analysis_json(summary: &str, label: &str) -> String {
    serde_json::json!({
        "summary": summary,
        "keyDetails": [],
        "sentiment": { "label": label, "reasoning": "R" },
        "actionableItems": [],
        "delayIndicators": [],
        "suggestedQuestions": ["Q1"],
    })
    .to_string()
}

pub fn flow_item(id: &str, status: FlowStatus) -> FlowItem {
    FlowItem {
        id: id.to_owned(),
        date: "2023-10-27T10:00:00Z".to_owned(),
        title: format!("Step {id}"),
        description: String::new(),
        document_source: "invoice.pdf".to_owned(),
        participants: Vec::new(),
        icon: FlowIcon::FileText,
        status,
        related_to: Vec::new(),
    }
}

//! The workspace: view selection, run triggers, and event dispatch.
//!
//! [`Workspace`] owns the [`AnalysisOrchestrator`] and the [`ChatController`]
//! and is the one place background events are applied. Callers hold it on a
//! single task and feed it every [`WorkspaceEvent`] their [`EventSink`]
//! produces.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;

use crate::chat::{ChatContext, ChatController};
use crate::error::{ExportError, ValidationError, ViewLocked};
use crate::events::{EventSink, ProgressTag, WorkspaceEvent};
use crate::export::{self, ExportFormat, ExportMeta};
use crate::orchestrator::AnalysisOrchestrator;
use crate::service::DocumentService;
use crate::timeline::{self, TimelineView};
use crate::types::{AnalysisResult, ChatMessage, DocumentSelection, RunId, RunState, TurnId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Analysis,
    Chat,
    Flow,
}

impl View {
    pub const ALL: [View; 3] = [View::Analysis, View::Chat, View::Flow];

    pub fn title(self) -> &'static str {
        match self {
            View::Analysis => "Analysis",
            View::Chat => "Chat",
            View::Flow => "Flow",
        }
    }

    pub fn index(self) -> usize {
        match self {
            View::Analysis => 0,
            View::Chat => 1,
            View::Flow => 2,
        }
    }

    pub fn next(self) -> Self {
        View::ALL[(self.index() + 1) % View::ALL.len()]
    }

    pub fn prev(self) -> Self {
        View::ALL[(self.index() + View::ALL.len() - 1) % View::ALL.len()]
    }
}

pub struct Workspace {
    orchestrator: AnalysisOrchestrator,
    chat: ChatController,
    view: View,
    selection: DocumentSelection,
    reload: bool,
}

impl Workspace {
    pub fn new(service: Arc<dyn DocumentService>, sink: EventSink) -> Self {
        Self {
            orchestrator: AnalysisOrchestrator::new(Arc::clone(&service), sink.clone()),
            chat: ChatController::new(service, sink),
            view: View::default(),
            selection: DocumentSelection::default(),
            reload: false,
        }
    }

    /// Replaces the chat controller, e.g. to shorten the settle delay.
    pub fn with_chat(mut self, chat: ChatController) -> Self {
        self.chat = chat;
        self
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn selection(&self) -> &DocumentSelection {
        &self.selection
    }

    pub fn reload_requested(&self) -> bool {
        self.reload
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.orchestrator.result()
    }

    pub fn orchestrator(&self) -> &AnalysisOrchestrator {
        &self.orchestrator
    }

    pub fn chat(&self) -> &ChatController {
        &self.chat
    }

    pub fn history(&self) -> &[ChatMessage] {
        self.chat.history()
    }

    /// Takes a new selection from the feed. Starts a run when documents are
    /// selected and nothing has been analysed yet; returns the run if one started.
    pub fn on_selection_changed(&mut self, selection: DocumentSelection) -> Option<RunId> {
        self.selection = selection;
        if self.selection.is_empty() || self.result().is_some() {
            return None;
        }
        self.start_run().ok()
    }

    /// Sets the external reload flag. Raising it re-runs the analysis when a
    /// result is already on screen; a successful analysis lowers it again.
    /// The flag stays down when no run starts.
    pub fn set_reload(&mut self, reload: bool) -> Option<RunId> {
        self.reload = false;
        if !reload || self.result().is_none() {
            return None;
        }
        let run = self.start_run().ok()?;
        self.reload = true;
        Some(run)
    }

    /// Re-runs the analysis for the current selection. Used by every retry action.
    ///
    /// # Errors
    ///
    /// [`ValidationError::EmptySelection`] when no usable document is selected.
    pub fn reanalyze(&mut self) -> Result<RunId, ValidationError> {
        self.start_run()
    }

    fn start_run(&mut self) -> Result<RunId, ValidationError> {
        let run = self.orchestrator.start_run(self.selection.document_ids())?;
        self.chat.reset();
        self.view = View::Analysis;
        Ok(run)
    }

    /// Activates `view`.
    ///
    /// # Errors
    ///
    /// Chat and Flow are locked until an analysis result exists.
    pub fn switch_view(&mut self, view: View) -> Result<(), ViewLocked> {
        if view != View::Analysis && self.result().is_none() {
            return Err(ViewLocked(view));
        }
        self.view = view;
        Ok(())
    }

    pub fn send_message(&mut self, text: &str) -> Result<TurnId, ValidationError> {
        let ids = self.selection.document_ids();
        let ctx = ChatContext {
            analysis_ready: self.result().is_some(),
            document_ids: &ids,
        };
        self.chat.send_message(text, ctx)
    }

    pub fn regenerate_last_response(&mut self) -> Result<TurnId, ValidationError> {
        let ids = self.selection.document_ids();
        let ctx = ChatContext {
            analysis_ready: self.result().is_some(),
            document_ids: &ids,
        };
        self.chat.regenerate_last_response(ctx)
    }

    pub fn clear_chat(&mut self) {
        self.chat.clear_history();
    }

    pub fn search_chat(&self, query: &str) -> Vec<&ChatMessage> {
        self.chat.search(query)
    }

    /// Applies one background event.
    pub fn apply(&mut self, event: WorkspaceEvent) {
        match event {
            WorkspaceEvent::Tick(ProgressTag::Chat(turn)) => self.chat.on_tick(turn),
            WorkspaceEvent::Tick(tag) => self.orchestrator.on_tick(tag),
            WorkspaceEvent::AnalysisSettled { run, outcome } => {
                if self.orchestrator.on_analysis_settled(run, outcome) {
                    self.reload = false;
                }
            }
            WorkspaceEvent::FlowSettled { run, outcome } => self.orchestrator.on_flow_settled(run, outcome),
            WorkspaceEvent::RunFinished { run } => self.orchestrator.on_run_finished(run),
            WorkspaceEvent::ChatSettled { turn, outcome } => self.chat.on_settled(turn, outcome),
            WorkspaceEvent::ChatSettleElapsed { turn } => self.chat.on_settle_elapsed(turn),
        }
    }

    pub fn run_state(&self) -> RunState {
        RunState {
            is_analyzing: self.orchestrator.is_analyzing(),
            analysis_progress: self.orchestrator.analysis_progress(),
            analysis_error: self.orchestrator.analysis_error().map(str::to_owned),
            is_fetching_flow: self.orchestrator.is_fetching_flow(),
            flow_progress: self.orchestrator.flow_progress(),
            flow_error: self.orchestrator.flow_error().map(str::to_owned),
            is_bot_typing: self.chat.is_bot_typing(),
            chat_progress: self.chat.progress(),
        }
    }

    pub fn timeline(&self) -> TimelineView {
        timeline::project(
            self.orchestrator.flow(),
            self.orchestrator.is_fetching_flow(),
            self.orchestrator.flow_error(),
            self.orchestrator.flow_progress(),
            !self.selection.is_empty(),
        )
    }

    /// Writes the conversation to `dir` and returns the file path.
    pub fn export_chat(&self, format: ExportFormat, dir: &Path, model: &str) -> Result<PathBuf, ExportError> {
        let documents = self.selection.names();
        let meta = ExportMeta {
            model,
            documents: &documents,
            at: Utc::now(),
        };
        let contents = export::render_chat(self.history(), format, &meta)?;
        export::save(dir, &export::chat_file_name(format, meta.at), &contents)
    }

    pub fn export_analysis(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let result = self.result().ok_or(ExportError::Empty)?;
        let contents = export::render_analysis(result)?;
        export::save(dir, &export::analysis_file_name(Utc::now()), &contents)
    }
}

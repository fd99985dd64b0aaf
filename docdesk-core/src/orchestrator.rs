//! Analysis orchestration: one run = analyze + flow, concurrently.
//!
//! [`AnalysisOrchestrator::start_run`] performs every synchronous side effect
//! of a run (clearing results, resetting counters, starting progress timers)
//! and spawns a single task that drives both remote calls with
//! `tokio::join!`. Each call reports its own settlement as soon as it is done,
//! so a failing flow call never holds back or corrupts the analysis result and
//! vice versa. After both have settled the task reports `RunFinished`.
//!
//! All events carry the [`RunId`] of the run that produced them. Events from
//! an older run are dropped on arrival, so a slow call from a superseded run
//! cannot overwrite the current one.

use std::sync::Arc;

use crate::error::{slot_message, ServiceError, ValidationError};
use crate::events::{EventSink, ProgressTag, WorkspaceEvent};
use crate::parse::parse_analysis;
use crate::progress::{ProgressProfile, ProgressSimulator, ProgressTicker};
use crate::service::DocumentService;
use crate::types::{AnalysisResult, DocumentId, FlowItem, RunId};

pub const GENERIC_ANALYSIS_ERROR: &str = "An unknown error occurred during analysis.";
pub const GENERIC_FLOW_ERROR: &str = "An unknown error occurred during flow generation.";

/// In-flight bookkeeping for one half of a run.
#[derive(Debug)]
struct Track {
    in_flight: bool,
    progress: ProgressSimulator,
    ticker: Option<ProgressTicker>,
    error: Option<String>,
}

impl Track {
    fn new(profile: ProgressProfile) -> Self {
        Self {
            in_flight: false,
            progress: ProgressSimulator::new(profile),
            ticker: None,
            error: None,
        }
    }

    fn begin(&mut self, profile: ProgressProfile, tag: ProgressTag, sink: &EventSink) {
        self.stop_ticker();
        self.in_flight = true;
        self.error = None;
        self.progress.reset();
        self.ticker = Some(ProgressTicker::start(profile, tag, sink.clone()));
    }

    fn settle(&mut self) {
        self.stop_ticker();
        self.progress.complete();
    }

    fn finish(&mut self) {
        self.stop_ticker();
        self.in_flight = false;
        self.progress.reset();
    }

    fn stop_ticker(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.stop();
        }
    }
}

/// Owns the analysis result, the flow items and their run state.
pub struct AnalysisOrchestrator {
    service: Arc<dyn DocumentService>,
    sink: EventSink,
    run: RunId,
    result: Option<AnalysisResult>,
    flow: Option<Vec<FlowItem>>,
    analysis: Track,
    flow_track: Track,
}

impl AnalysisOrchestrator {
    pub fn new(service: Arc<dyn DocumentService>, sink: EventSink) -> Self {
        Self {
            service,
            sink,
            run: RunId::default(),
            result: None,
            flow: None,
            analysis: Track::new(ProgressProfile::ANALYSIS),
            flow_track: Track::new(ProgressProfile::FLOW),
        }
    }

    /// Starts a new run for `document_ids`.
    ///
    /// Clears the previous result and flow items, resets both counters, and
    /// dispatches both calls. Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// [`ValidationError::EmptySelection`] if `document_ids` is empty; nothing
    /// is changed in that case.
    pub fn start_run(&mut self, document_ids: Vec<DocumentId>) -> Result<RunId, ValidationError> {
        if document_ids.is_empty() {
            return Err(ValidationError::EmptySelection);
        }

        self.run = self.run.next();
        let run = self.run;
        self.result = None;
        self.flow = None;
        self.analysis
            .begin(ProgressProfile::ANALYSIS, ProgressTag::Analysis(run), &self.sink);
        self.flow_track
            .begin(ProgressProfile::FLOW, ProgressTag::Flow(run), &self.sink);

        tracing::info!(run = run.0, documents = ?document_ids, "starting analysis run");
        tokio::spawn(drive_run(
            Arc::clone(&self.service),
            self.sink.clone(),
            run,
            document_ids,
        ));
        Ok(run)
    }

    pub fn current_run(&self) -> RunId {
        self.run
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn flow(&self) -> Option<&[FlowItem]> {
        self.flow.as_deref()
    }

    pub fn is_analyzing(&self) -> bool {
        self.analysis.in_flight
    }

    pub fn is_fetching_flow(&self) -> bool {
        self.flow_track.in_flight
    }

    pub fn analysis_progress(&self) -> u8 {
        self.analysis.progress.value()
    }

    pub fn flow_progress(&self) -> u8 {
        self.flow_track.progress.value()
    }

    pub fn analysis_error(&self) -> Option<&str> {
        self.analysis.error.as_deref()
    }

    pub fn flow_error(&self) -> Option<&str> {
        self.flow_track.error.as_deref()
    }

    /// Applies a progress tick if it belongs to an outstanding call of the current run.
    pub fn on_tick(&mut self, tag: ProgressTag) {
        let track = match tag {
            ProgressTag::Analysis(run) if run == self.run => &mut self.analysis,
            ProgressTag::Flow(run) if run == self.run => &mut self.flow_track,
            _ => return,
        };
        // A tick queued before settlement must not pull 100 back down.
        if track.ticker.is_some() {
            track.progress.tick();
        }
    }

    /// Records the analysis outcome. Returns `true` when a result was stored.
    pub fn on_analysis_settled(&mut self, run: RunId, outcome: Result<AnalysisResult, String>) -> bool {
        if run != self.run {
            tracing::debug!(run = run.0, current = self.run.0, "discarding stale analysis result");
            return false;
        }
        self.analysis.settle();
        match outcome {
            Ok(result) => {
                tracing::info!(run = run.0, "analysis completed");
                self.result = Some(result);
                true
            }
            Err(message) => {
                tracing::warn!(run = run.0, error = %message, "analysis failed");
                self.analysis.error = Some(message);
                false
            }
        }
    }

    pub fn on_flow_settled(&mut self, run: RunId, outcome: Result<Vec<FlowItem>, String>) {
        if run != self.run {
            tracing::debug!(run = run.0, current = self.run.0, "discarding stale flow result");
            return;
        }
        self.flow_track.settle();
        match outcome {
            Ok(items) => {
                tracing::info!(run = run.0, items = items.len(), "flow completed");
                self.flow = Some(items);
            }
            Err(message) => {
                tracing::warn!(run = run.0, error = %message, "flow generation failed");
                self.flow_track.error = Some(message);
            }
        }
    }

    /// Both calls settled: clear the in-flight flags and the counters.
    pub fn on_run_finished(&mut self, run: RunId) {
        if run != self.run {
            return;
        }
        self.analysis.finish();
        self.flow_track.finish();
        tracing::info!(run = run.0, "analysis run finished");
    }
}

async fn drive_run(
    service: Arc<dyn DocumentService>,
    sink: EventSink,
    run: RunId,
    document_ids: Vec<DocumentId>,
) {
    let analysis = async {
        let outcome = analysis_outcome(service.analyze(&document_ids).await);
        sink.emit(WorkspaceEvent::AnalysisSettled { run, outcome });
    };
    let flow = async {
        let outcome = service
            .fetch_flow(&document_ids)
            .await
            .map_err(|e| slot_message(&e, GENERIC_FLOW_ERROR));
        sink.emit(WorkspaceEvent::FlowSettled { run, outcome });
    };
    tokio::join!(analysis, flow);
    sink.emit(WorkspaceEvent::RunFinished { run });
}

fn analysis_outcome(response: Result<String, ServiceError>) -> Result<AnalysisResult, String> {
    let raw = response.map_err(|e| slot_message(&e, GENERIC_ANALYSIS_ERROR))?;
    parse_analysis(&raw, &mut rand::thread_rng()).map_err(|e| slot_message(&e, GENERIC_ANALYSIS_ERROR))
}

//! Messages from background tasks back to the owner of the workspace state.
//!
//! Every asynchronous piece of work (progress timers, remote calls, the chat
//! settle delay) runs as a tokio task that owns nothing but an [`EventSink`].
//! It reports by emitting a [`WorkspaceEvent`]; the owner applies events one
//! at a time via [`crate::coordinator::Workspace::apply`], which keeps every
//! piece of state single-writer.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::types::{AnalysisResult, FlowItem, RunId, TurnId};

/// Which cosmetic progress counter a tick belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressTag {
    Analysis(RunId),
    Flow(RunId),
    Chat(TurnId),
}

/// Result of background work, tagged with the run or turn that started it.
#[derive(Debug)]
pub enum WorkspaceEvent {
    /// A progress timer fired.
    Tick(ProgressTag),
    /// The analyze call settled. `Err` holds the message for the error slot.
    AnalysisSettled {
        run: RunId,
        outcome: Result<AnalysisResult, String>,
    },
    /// The flow call settled.
    FlowSettled {
        run: RunId,
        outcome: Result<Vec<FlowItem>, String>,
    },
    /// Both calls of the run have settled.
    RunFinished { run: RunId },
    /// The chat call settled. `Err` holds the error description.
    ChatSettled {
        turn: TurnId,
        outcome: Result<String, String>,
    },
    /// The short pause after a chat reply is over.
    ChatSettleElapsed { turn: TurnId },
}

/// Type-erased, cloneable destination for [`WorkspaceEvent`]s.
///
/// `emit` returns `false` once the receiving side is gone, which background
/// loops use as their stop signal.
#[derive(Clone)]
pub struct EventSink(Arc<dyn Fn(WorkspaceEvent) -> bool + Send + Sync>);

impl EventSink {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(WorkspaceEvent) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Forwards into an unbounded channel of any event type that can wrap a
    /// [`WorkspaceEvent`].
    pub fn from_sender<E>(tx: UnboundedSender<E>) -> Self
    where
        E: From<WorkspaceEvent> + Send + 'static,
    {
        Self::new(move |event| tx.send(E::from(event)).is_ok())
    }

    pub fn emit(&self, event: WorkspaceEvent) -> bool {
        (self.0)(event)
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EventSink")
    }
}

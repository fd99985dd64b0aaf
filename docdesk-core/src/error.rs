//! Error types for the workspace core.
//!
//! Remote and parse failures never escape an operation: the orchestrator and
//! the chat controller turn them into strings stored in their error slots or
//! into bot-authored chat turns. Only guards ([`ValidationError`],
//! [`ViewLocked`]) and exports return errors to the caller.

use thiserror::Error;

use crate::coordinator::View;

/// Failure talking to the remote document service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{endpoint} request failed with status {status}")]
    Status { endpoint: &'static str, status: u16 },
    #[error("{0}")]
    InvalidResponse(String),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// The analysis text could not be read as an [`crate::types::AnalysisResult`].
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("analysis response is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),
    #[error("analysis response is not an object (got {0})")]
    NotAnObject(&'static str),
    #[error("analysis response has an unexpected shape: {0}")]
    Shape(#[source] serde_json::Error),
}

/// A guard refused the request. State is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no documents selected")]
    EmptySelection,
    #[error("message is empty")]
    BlankInput,
    #[error("a response is still being generated")]
    TurnInFlight,
    #[error("documents have not been analysed yet")]
    NoAnalysis,
    #[error("there is no question to regenerate")]
    NothingToRegenerate,
}

/// Chat and flow views stay locked until an analysis result exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{0:?} view is unavailable until analysis completes")]
pub struct ViewLocked(pub View);

/// Saving an export file failed.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export")]
    Empty,
    #[error("could not write {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not encode export: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Human-readable message for an error slot.
///
/// Falls back to `generic` when the error renders as an empty string.
pub fn slot_message(err: &dyn std::error::Error, generic: &str) -> String {
    let msg = err.to_string();
    if msg.trim().is_empty() {
        generic.to_owned()
    } else {
        msg
    }
}

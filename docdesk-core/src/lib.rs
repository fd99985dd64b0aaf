//! UI-independent core of the document workspace: analysis runs, chat turns,
//! the flow timeline and the view rules tying them together.

pub mod chat;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod export;
pub mod orchestrator;
pub mod parse;
pub mod progress;
pub mod service;
pub mod timeline;
pub mod types;

pub use coordinator::{View, Workspace};
pub use events::{EventSink, WorkspaceEvent};
pub use service::{DocumentService, HttpDocumentService, HttpServiceConfig};

//! Domain Ports (Interfaces)
//!
//! These traits define the boundaries of the domain layer.
//! Infrastructure layer provides concrete implementations.

pub mod pipeline_events;
pub mod remote_executor;
pub mod tree_transfer;

pub use pipeline_events::{NoopEventSink, PipelineEvent, PipelineEventSink};
pub use remote_executor::{CommandKind, CommandOutput, RemoteCommand, RemoteError, RemoteExecutor};
pub use tree_transfer::{SyncStats, TransferError, TreeTransfer};

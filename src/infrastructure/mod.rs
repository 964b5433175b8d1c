//! Infrastructure Layer
//!
//! Concrete implementations of domain ports.
//! This layer handles all process and network I/O.
//!
//! ## Structure
//!
//! - `ssh/` - RemoteExecutor over the OpenSSH client
//! - `transfer/` - TreeTransfer strategies (rsync, scp)
//! - `events/` - PipelineEventSink implementations (console, NDJSON)

pub mod events;
pub mod ssh;
pub mod transfer;

// Re-export for convenience
pub use events::{ConsoleEventSink, JsonEventSink};
pub use ssh::{SshExecutor, SshOptions};
pub use transfer::{detect_strategy, RsyncTransfer, ScpTransfer, TransferMode};

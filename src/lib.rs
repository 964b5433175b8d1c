//! treemirror - mirror local directory trees onto a remote host
//!
//! A run probes the host, stops its supervisor-managed services, backs up and
//! wipes the remote workspace, mirrors each configured tree over rsync or scp,
//! fixes ownership and modes, optionally provisions a Python environment, and
//! starts the services again. Any stage failure aborts the rest of the run.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod presentation;

// Re-exports for convenience
pub use application::{PipelineOrchestrator, PipelineReport};
pub use config::{load_settings, Settings};
pub use domain::entities::{Stage, SyncSpec};
pub use domain::value_objects::{RemoteTarget, RunStamp};
pub use error::{PipelineError, StageError, StageResult};

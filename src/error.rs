//! Error types for pipeline stages
//!
//! Uses `thiserror` for library errors; the binary wraps them in `anyhow`.

use thiserror::Error;

use crate::domain::entities::Stage;
use crate::domain::ports::{RemoteError, TransferError};

/// Result type alias for a single stage
pub type StageResult<T> = Result<T, StageError>;

/// Why a stage failed
#[derive(Error, Debug)]
pub enum StageError {
    /// Probe failed; nothing else may run
    #[error("host unreachable: {0}")]
    Connectivity(String),

    /// The supervisor could not be driven at all
    #[error("supervisor control failed: {0}")]
    ServiceControl(#[source] RemoteError),

    /// Services did not reach RUNNING after start
    #[error("services failed to start: {}", .failed.join(", "))]
    ServiceStart { failed: Vec<String> },

    /// Workspace copy failed (e.g. disk exhaustion)
    #[error("backup failed: {0}")]
    Backup(String),

    /// The run-scoped backup path is already taken
    #[error("backup path {0} already exists; refusing to overwrite a previous backup")]
    BackupCollision(String),

    #[error("workspace reset failed: {0}")]
    Wipe(String),

    #[error("sync of '{spec}' failed: {source}")]
    Sync {
        spec: String,
        #[source]
        source: TransferError,
    },

    /// Remote failure outside any single tree's transfer
    #[error("sync failed: {0}")]
    SyncSetup(#[source] RemoteError),

    #[error("permission update failed: {0}")]
    Permission(String),

    #[error("dependency provisioning failed: {0}")]
    Provision(String),

    /// Operator pressed Ctrl-C between stages
    #[error("interrupted by operator")]
    Interrupted,
}

impl StageError {
    /// Wrap a remote failure with the stage's own variant.
    pub fn remote(stage: Stage, err: RemoteError) -> Self {
        let reason = err.to_string();
        match stage {
            Stage::Probe => Self::Connectivity(reason),
            Stage::StopServices | Stage::StartServices => Self::ServiceControl(err),
            Stage::Backup => Self::Backup(reason),
            Stage::Wipe => Self::Wipe(reason),
            Stage::Sync => Self::SyncSetup(err),
            Stage::Permissions => Self::Permission(reason),
            Stage::Provision => Self::Provision(reason),
        }
    }
}

/// Payload of the `Aborted(stage, reason)` terminal state
#[derive(Error, Debug)]
#[error("aborted at {stage}: {reason}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub reason: StageError,
}

impl PipelineError {
    pub fn new(stage: Stage, reason: StageError) -> Self {
        Self { stage, reason }
    }
}

//! Tree Transfer Port
//!
//! Mirrors one local tree onto the remote host. Implementations must honor
//! the tree's exclude patterns symmetrically (never copy, never delete an
//! excluded path) and preserve modification times and permission bits.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::entities::SyncSpec;
use crate::domain::ports::RemoteError;
use crate::domain::value_objects::RemoteTarget;

/// Counters reported by a completed mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncStats {
    pub files_transferred: u64,
    pub files_deleted: u64,
    pub bytes_transferred: u64,
}

impl SyncStats {
    pub fn merge(&mut self, other: &SyncStats) {
        self.files_transferred += other.files_transferred;
        self.files_deleted += other.files_deleted;
        self.bytes_transferred += other.bytes_transferred;
    }
}

/// Failure of a whole mirror operation.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("{0}")]
    NotAvailable(String),

    #[error("local source {} does not exist", .0.display())]
    MissingSource(PathBuf),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("{program} exited with status {status}: {stderr}")]
    CommandFailed {
        program: &'static str,
        status: i32,
        stderr: String,
    },

    #[error("staging failed: {0}")]
    Staging(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Strategy for mirroring trees to a remote host.
pub trait TreeTransfer: Send + Sync {
    /// Name of the transport (for logging)
    fn name(&self) -> &'static str;

    /// Whether the underlying tool is installed locally
    fn is_available(&self) -> bool;

    /// Make the destination of `spec` mirror its source.
    ///
    /// Blocks until the whole tree has been transferred.
    fn mirror(&self, target: &RemoteTarget, spec: &SyncSpec) -> Result<SyncStats, TransferError>;
}

impl<T: TreeTransfer + ?Sized> TreeTransfer for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn mirror(&self, target: &RemoteTarget, spec: &SyncSpec) -> Result<SyncStats, TransferError> {
        (**self).mirror(target, spec)
    }
}

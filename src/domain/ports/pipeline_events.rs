//! Pipeline Event Port
//!
//! Observable interface for pipeline runs.
//! Enables progress reporting, JSON event streams, and debugging.

use std::time::Duration;

use crate::domain::entities::{BackupRecord, Stage};
use crate::domain::ports::SyncStats;

/// Event emitted while a pipeline run progresses
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// Run started against a target
    RunStarted {
        destination: String,
        stamp: String,
        tree_count: usize,
    },

    /// A stage began executing
    StageStarted { stage: Stage },

    /// A stage finished successfully
    StageCompleted { stage: Stage, elapsed: Duration },

    /// A stage hit a tolerated problem
    StageWarning { stage: Stage, message: String },

    /// A stage failed; the run is aborting
    StageFailed { stage: Stage, reason: String },

    /// Backup written (or skipped for a first deployment)
    BackupCreated { record: BackupRecord },

    /// One sync spec finished mirroring
    TreeSynced {
        name: String,
        destination: String,
        stats: SyncStats,
    },

    /// Run reached a terminal state
    RunFinished {
        success: bool,
        failed_stage: Option<Stage>,
        elapsed: Duration,
    },
}

/// Trait for receiving pipeline events
///
/// Implementations can be:
/// - ConsoleEventSink: Progress display in terminal
/// - JsonEventSink: NDJSON event stream for CI
/// - NoopEventSink: Silent operation
pub trait PipelineEventSink: Send + Sync {
    /// Handle a pipeline event
    fn on_event(&self, event: PipelineEvent);
}

/// No-op event sink for silent operation
pub struct NoopEventSink;

impl PipelineEventSink for NoopEventSink {
    fn on_event(&self, _event: PipelineEvent) {}
}

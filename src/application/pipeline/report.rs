//! Pipeline Report
//!
//! What a finished run hands back to the presentation layer.

use std::time::Duration;

use crate::domain::entities::{BackupRecord, RunState, Stage, StageRecord};
use crate::domain::ports::SyncStats;
use crate::domain::value_objects::RunStamp;
use crate::error::PipelineError;

/// Result of one pipeline run
#[derive(Debug)]
pub struct PipelineReport {
    /// `user@host`
    pub destination: String,
    pub stamp: RunStamp,
    /// Transfer strategy used for sync
    pub transport: &'static str,
    pub state: RunState,
    /// One entry per stage that ran, in order
    pub history: Vec<StageRecord>,
    /// Backup taken for this run, if the stage ran
    pub backup: Option<BackupRecord>,
    /// Per-tree sync counters, in completion order
    pub synced: Vec<(String, SyncStats)>,
    /// Tolerated problems
    pub warnings: Vec<String>,
    pub error: Option<PipelineError>,
    pub elapsed: Duration,
}

impl PipelineReport {
    pub fn is_success(&self) -> bool {
        self.state == RunState::Done
    }

    pub fn failed_stage(&self) -> Option<Stage> {
        match &self.state {
            RunState::Aborted { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Process exit code: 0 on success, 1 for an aborted run.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    /// Sum of every tree's counters.
    pub fn total_synced(&self) -> SyncStats {
        let mut total = SyncStats::default();
        for (_, stats) in &self.synced {
            total.merge(stats);
        }
        total
    }
}

//! Pipeline run entity
//!
//! Tracks one invocation of the mirroring pipeline as a finite-state machine:
//!
//! ```text
//! Init → ProbeOk → ServicesStopped → BackedUp → Wiped → Synced
//!      → PermissionsSet → Provisioned → ServicesStarted → Done
//! ```
//!
//! `Aborted(stage, reason)` is reachable from every non-terminal state and is
//! absorbing. The run lives only as long as the process; it is not persisted.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::domain::value_objects::{RemoteTarget, RunStamp};

/// A named pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Probe,
    StopServices,
    Backup,
    Wipe,
    Sync,
    Permissions,
    Provision,
    StartServices,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::Probe,
        Stage::StopServices,
        Stage::Backup,
        Stage::Wipe,
        Stage::Sync,
        Stage::Permissions,
        Stage::Provision,
        Stage::StartServices,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Probe => "probe",
            Stage::StopServices => "stop-services",
            Stage::Backup => "backup",
            Stage::Wipe => "wipe",
            Stage::Sync => "sync",
            Stage::Permissions => "permissions",
            Stage::Provision => "provision",
            Stage::StartServices => "start-services",
        }
    }

    /// State entered when this stage succeeds.
    fn reached(&self) -> RunState {
        match self {
            Stage::Probe => RunState::ProbeOk,
            Stage::StopServices => RunState::ServicesStopped,
            Stage::Backup => RunState::BackedUp,
            Stage::Wipe => RunState::Wiped,
            Stage::Sync => RunState::Synced,
            Stage::Permissions => RunState::PermissionsSet,
            Stage::Provision => RunState::Provisioned,
            Stage::StartServices => RunState::ServicesStarted,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Current position of a run in the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Init,
    ProbeOk,
    ServicesStopped,
    BackedUp,
    Wiped,
    Synced,
    PermissionsSet,
    Provisioned,
    ServicesStarted,
    Done,
    Aborted { stage: Stage, reason: String },
}

impl RunState {
    /// The stage whose success moves the run out of this state.
    pub fn next_stage(&self) -> Option<Stage> {
        match self {
            RunState::Init => Some(Stage::Probe),
            RunState::ProbeOk => Some(Stage::StopServices),
            RunState::ServicesStopped => Some(Stage::Backup),
            RunState::BackedUp => Some(Stage::Wipe),
            RunState::Wiped => Some(Stage::Sync),
            RunState::Synced => Some(Stage::Permissions),
            RunState::PermissionsSet => Some(Stage::Provision),
            RunState::Provisioned => Some(Stage::StartServices),
            RunState::ServicesStarted | RunState::Done | RunState::Aborted { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Aborted { .. })
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Init => write!(f, "init"),
            RunState::ProbeOk => write!(f, "probe-ok"),
            RunState::ServicesStopped => write!(f, "services-stopped"),
            RunState::BackedUp => write!(f, "backed-up"),
            RunState::Wiped => write!(f, "wiped"),
            RunState::Synced => write!(f, "synced"),
            RunState::PermissionsSet => write!(f, "permissions-set"),
            RunState::Provisioned => write!(f, "provisioned"),
            RunState::ServicesStarted => write!(f, "services-started"),
            RunState::Done => write!(f, "done"),
            RunState::Aborted { stage, reason } => write!(f, "aborted at {}: {}", stage, reason),
        }
    }
}

/// Illegal state-machine move.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("stage '{stage}' cannot complete from state '{from}'")]
    OutOfOrder { from: String, stage: Stage },
    #[error("run already finished ({0})")]
    Terminal(String),
}

/// How a completed stage ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Succeeded,
    /// Succeeded, but with a tolerated problem worth surfacing
    Tolerated(String),
    Failed(String),
}

/// One entry in the run's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRecord {
    pub stage: Stage,
    pub elapsed: Duration,
    pub outcome: StageOutcome,
}

/// A single pipeline invocation.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    target: RemoteTarget,
    stamp: RunStamp,
    state: RunState,
    history: Vec<StageRecord>,
}

impl PipelineRun {
    pub fn new(target: RemoteTarget, stamp: RunStamp) -> Self {
        Self {
            target,
            stamp,
            state: RunState::Init,
            history: Vec::new(),
        }
    }

    pub fn target(&self) -> &RemoteTarget {
        &self.target
    }

    pub fn stamp(&self) -> &RunStamp {
        &self.stamp
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn history(&self) -> &[StageRecord] {
        &self.history
    }

    /// The stage that should run next, if any.
    pub fn current_stage(&self) -> Option<Stage> {
        self.state.next_stage()
    }

    /// Whether `stage` completed successfully in this run.
    pub fn has_completed(&self, stage: Stage) -> bool {
        self.history
            .iter()
            .any(|r| r.stage == stage && !matches!(r.outcome, StageOutcome::Failed(_)))
    }

    /// Record a successful stage and advance.
    pub fn complete(
        &mut self,
        stage: Stage,
        elapsed: Duration,
        warning: Option<String>,
    ) -> Result<(), TransitionError> {
        if self.state.is_terminal() {
            return Err(TransitionError::Terminal(self.state.to_string()));
        }
        if self.state.next_stage() != Some(stage) {
            return Err(TransitionError::OutOfOrder {
                from: self.state.to_string(),
                stage,
            });
        }
        let outcome = match warning {
            Some(w) => StageOutcome::Tolerated(w),
            None => StageOutcome::Succeeded,
        };
        self.history.push(StageRecord {
            stage,
            elapsed,
            outcome,
        });
        self.state = stage.reached();
        Ok(())
    }

    /// Move to the absorbing `Aborted` state.
    pub fn abort(
        &mut self,
        stage: Stage,
        elapsed: Duration,
        reason: impl Into<String>,
    ) -> Result<(), TransitionError> {
        if self.state.is_terminal() {
            return Err(TransitionError::Terminal(self.state.to_string()));
        }
        let reason = reason.into();
        self.history.push(StageRecord {
            stage,
            elapsed,
            outcome: StageOutcome::Failed(reason.clone()),
        });
        self.state = RunState::Aborted { stage, reason };
        Ok(())
    }

    /// Close out a run whose services came back up.
    pub fn finish(&mut self) -> Result<(), TransitionError> {
        match self.state {
            RunState::ServicesStarted => {
                self.state = RunState::Done;
                Ok(())
            }
            ref other if other.is_terminal() => Err(TransitionError::Terminal(other.to_string())),
            ref other => Err(TransitionError::OutOfOrder {
                from: other.to_string(),
                stage: Stage::StartServices,
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == RunState::Done
    }

    /// `(stage, reason)` when the run was aborted.
    pub fn aborted(&self) -> Option<(Stage, &str)> {
        match &self.state {
            RunState::Aborted { stage, reason } => Some((*stage, reason.as_str())),
            _ => None,
        }
    }
}

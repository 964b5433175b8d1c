//! Pipeline Orchestrator
//!
//! Drives one run through the stage sequence:
//! 1. Probe the host (and resolve remote `~` paths)
//! 2. Stop services
//! 3. Back up the workspace
//! 4. Wipe the workspace
//! 5. Mirror every tree
//! 6. Fix permissions
//! 7. Provision dependencies
//! 8. Start services
//!
//! Every fatal failure aborts the run before the next stage; nothing is
//! retried here. The interrupt flag is checked between stages only, so an
//! in-flight remote command always finishes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::Settings;
use crate::domain::entities::{BackupRecord, PipelineRun, RunState, Stage};
use crate::domain::ports::{
    NoopEventSink, PipelineEvent, PipelineEventSink, RemoteExecutor, SyncStats, TreeTransfer,
};
use crate::domain::value_objects::RunStamp;
use crate::error::{PipelineError, StageError, StageResult};

use crate::application::backup::BackupManager;
use crate::application::permissions::PermissionFixer;
use crate::application::probe::{ConnectivityProbe, ProbeResult};
use crate::application::provisioner::DependencyProvisioner;
use crate::application::services::{
    describe, ServiceController, ServiceStatus, StartOutcome, StopOutcome,
};
use crate::application::synchronizer::TreeSynchronizer;
use crate::application::wiper::WorkspaceWiper;

use super::report::PipelineReport;

/// Mutable state threaded through the stages of one run.
struct RunContext {
    settings: Settings,
    stamp: RunStamp,
    backup: Option<BackupRecord>,
    synced: Vec<(String, SyncStats)>,
    warnings: Vec<String>,
}

/// Pipeline orchestrator - sequences the stages of a run
pub struct PipelineOrchestrator {
    executor: Arc<dyn RemoteExecutor>,
    transfer: Arc<dyn TreeTransfer>,
    events: Arc<dyn PipelineEventSink>,
    interrupt: Arc<AtomicBool>,
}

impl PipelineOrchestrator {
    pub fn new(executor: Arc<dyn RemoteExecutor>, transfer: Arc<dyn TreeTransfer>) -> Self {
        Self {
            executor,
            transfer,
            events: Arc::new(NoopEventSink),
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn PipelineEventSink>) -> Self {
        self.events = events;
        self
    }

    /// Flag set by the Ctrl-C handler.
    pub fn with_interrupt(mut self, interrupt: Arc<AtomicBool>) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Run the full pipeline with a fresh run stamp.
    pub fn run(&self, settings: &Settings) -> PipelineReport {
        self.run_with_stamp(settings, RunStamp::now())
    }

    /// Run the full pipeline; `stamp` names everything the run creates.
    pub fn run_with_stamp(&self, settings: &Settings, stamp: RunStamp) -> PipelineReport {
        let started = Instant::now();
        let mut run = PipelineRun::new(settings.target.clone(), stamp);
        let mut ctx = RunContext {
            settings: settings.clone(),
            stamp,
            backup: None,
            synced: Vec::new(),
            warnings: Vec::new(),
        };
        let mut error = None;

        tracing::info!(
            host = %settings.target,
            stamp = %stamp,
            transport = self.transfer.name(),
            "pipeline run started"
        );
        self.events.on_event(PipelineEvent::RunStarted {
            destination: settings.target.destination(),
            stamp: stamp.to_string(),
            tree_count: settings.trees.len(),
        });

        while let Some(stage) = run.current_stage() {
            if self.interrupt.load(Ordering::SeqCst) {
                tracing::warn!(stage = stage.name(), "interrupted before stage");
                self.fail(&mut run, stage, Duration::ZERO, StageError::Interrupted, &mut error);
                break;
            }

            self.events.on_event(PipelineEvent::StageStarted { stage });
            let span = tracing::info_span!("stage", name = stage.name());
            let _enter = span.enter();
            let t0 = Instant::now();
            let result = self.execute_stage(stage, &run, &mut ctx);
            let elapsed = t0.elapsed();

            match result {
                Ok(warning) => {
                    if let Some(message) = &warning {
                        tracing::warn!(stage = stage.name(), "{}", message);
                        ctx.warnings.push(message.clone());
                        self.events.on_event(PipelineEvent::StageWarning {
                            stage,
                            message: message.clone(),
                        });
                    }
                    if let Err(e) = run.complete(stage, elapsed, warning) {
                        tracing::error!(error = %e, "pipeline state machine rejected completion");
                        break;
                    }
                    tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "stage complete");
                    self.events
                        .on_event(PipelineEvent::StageCompleted { stage, elapsed });
                }
                Err(err) => {
                    tracing::error!(error = %err, "stage failed");
                    self.fail(&mut run, stage, elapsed, err, &mut error);
                    break;
                }
            }
        }

        if run.state() == &RunState::ServicesStarted {
            if let Err(e) = run.finish() {
                tracing::error!(error = %e, "could not close out run");
            }
        }

        let elapsed = started.elapsed();
        let failed_stage = run.aborted().map(|(stage, _)| stage);
        self.events.on_event(PipelineEvent::RunFinished {
            success: run.is_success(),
            failed_stage,
            elapsed,
        });
        match failed_stage {
            None => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "pipeline run finished"),
            Some(stage) => tracing::error!(stage = stage.name(), "pipeline run aborted"),
        }

        PipelineReport {
            destination: settings.target.destination(),
            stamp,
            transport: self.transfer.name(),
            state: run.state().clone(),
            history: run.history().to_vec(),
            backup: ctx.backup,
            synced: ctx.synced,
            warnings: ctx.warnings,
            error,
            elapsed,
        }
    }

    fn fail(
        &self,
        run: &mut PipelineRun,
        stage: Stage,
        elapsed: Duration,
        err: StageError,
        slot: &mut Option<PipelineError>,
    ) {
        let reason = err.to_string();
        self.events.on_event(PipelineEvent::StageFailed {
            stage,
            reason: reason.clone(),
        });
        if let Err(e) = run.abort(stage, elapsed, reason) {
            tracing::error!(error = %e, "could not record abort");
        }
        *slot = Some(PipelineError::new(stage, err));
    }

    /// Run one stage; `Ok(Some(msg))` is success with a tolerated problem.
    fn execute_stage(
        &self,
        stage: Stage,
        run: &PipelineRun,
        ctx: &mut RunContext,
    ) -> StageResult<Option<String>> {
        let timeout = ctx.settings.command_timeout;
        match stage {
            Stage::Probe => self.probe_stage(ctx),
            Stage::StopServices => {
                let s = &ctx.settings;
                let outcome = self
                    .controller(s)
                    .stop_all(&s.target)
                    .map_err(StageError::ServiceControl)?;
                Ok(match outcome {
                    StopOutcome::Stopped => None,
                    StopOutcome::PartialFailure(still_up) => Some(format!(
                        "services not confirmed stopped: {}",
                        describe(&still_up).join(", ")
                    )),
                })
            }
            Stage::Backup => {
                let s = &ctx.settings;
                let (record, warning) = BackupManager::new(self.executor.clone(), timeout).backup(
                    &s.target,
                    &s.workspace,
                    &ctx.stamp,
                )?;
                self.events.on_event(PipelineEvent::BackupCreated {
                    record: record.clone(),
                });
                ctx.backup = Some(record);
                Ok(warning)
            }
            Stage::Wipe => {
                if !run.has_completed(Stage::Backup) || ctx.backup.is_none() {
                    return Err(StageError::Wipe(
                        "no backup record exists for this run".to_string(),
                    ));
                }
                let s = &ctx.settings;
                WorkspaceWiper::new(self.executor.clone(), timeout).wipe(&s.target, &s.workspace)?;
                Ok(None)
            }
            Stage::Sync => {
                let s = &ctx.settings;
                let synced = Mutex::new(Vec::new());
                let result = TreeSynchronizer::new(self.transfer.clone(), s.parallel_sync).sync_all(
                    &s.target,
                    &s.trees,
                    |spec, stats| {
                        self.events.on_event(PipelineEvent::TreeSynced {
                            name: spec.name().to_string(),
                            destination: spec.destination().to_string(),
                            stats: *stats,
                        });
                        if let Ok(mut list) = synced.lock() {
                            list.push((spec.name().to_string(), *stats));
                        }
                    },
                );
                ctx.synced = synced.into_inner().unwrap_or_default();
                result.map(|_| None)
            }
            Stage::Permissions => {
                let s = &ctx.settings;
                PermissionFixer::new(self.executor.clone(), timeout).apply(
                    &s.target,
                    &s.permissions,
                    &s.workspace.path,
                    &s.trees,
                )?;
                Ok(None)
            }
            Stage::Provision => {
                let s = &ctx.settings;
                match &s.provision {
                    Some(env) => {
                        DependencyProvisioner::new(self.executor.clone(), timeout)
                            .provision(&s.target, env)?;
                    }
                    None => tracing::debug!("provisioning disabled"),
                }
                Ok(None)
            }
            Stage::StartServices => {
                let s = &ctx.settings;
                match self
                    .controller(s)
                    .start_all(&s.target)
                    .map_err(StageError::ServiceControl)?
                {
                    StartOutcome::Started => Ok(None),
                    StartOutcome::PartialFailure(failed) => Err(StageError::ServiceStart {
                        failed: describe(&failed),
                    }),
                }
            }
        }
    }

    fn probe_stage(&self, ctx: &mut RunContext) -> StageResult<Option<String>> {
        let probe = ConnectivityProbe::new(self.executor.clone());
        let s = &ctx.settings;
        if let ProbeResult::Unreachable(reason) = probe.check(&s.target, s.probe_timeout) {
            return Err(StageError::Connectivity(reason));
        }
        if s.needs_remote_home() {
            let home = probe
                .remote_home(&s.target, s.probe_timeout)
                .map_err(|e| StageError::remote(Stage::Probe, e))?
                .ok_or_else(|| {
                    StageError::Connectivity("remote shell did not report $HOME".to_string())
                })?;
            tracing::debug!(home = %home, "resolved remote home");
            ctx.settings = ctx.settings.clone().with_remote_home(&home);
        }
        Ok(None)
    }

    fn controller(&self, settings: &Settings) -> ServiceController {
        ServiceController::new(
            self.executor.clone(),
            settings.services.clone(),
            settings.supervisor_conf.clone(),
            settings.command_timeout,
        )
    }

    /// Probe only.
    pub fn check(&self, settings: &Settings) -> ProbeResult {
        ConnectivityProbe::new(self.executor.clone()).check(&settings.target, settings.probe_timeout)
    }

    /// Probe, then report the state of every configured service.
    pub fn status(&self, settings: &Settings) -> StageResult<ServiceStatus> {
        if let ProbeResult::Unreachable(reason) = self.check(settings) {
            return Err(StageError::Connectivity(reason));
        }
        self.controller(settings)
            .status(&settings.target)
            .map_err(StageError::ServiceControl)
    }
}

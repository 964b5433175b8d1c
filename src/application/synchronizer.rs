//! Tree Synchronizer
//!
//! Runs the configured transport over every sync spec. Sequential by default;
//! with `parallel` set, all specs run on scoped threads and the stage waits
//! for every one of them before deciding. Either way the reported failure is
//! the first failing spec in configuration order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::domain::entities::SyncSpec;
use crate::domain::ports::{SyncStats, TransferError, TreeTransfer};
use crate::domain::value_objects::RemoteTarget;
use crate::error::{StageError, StageResult};

pub struct TreeSynchronizer {
    transfer: Arc<dyn TreeTransfer>,
    parallel: bool,
}

impl TreeSynchronizer {
    pub fn new(transfer: Arc<dyn TreeTransfer>, parallel: bool) -> Self {
        Self { transfer, parallel }
    }

    pub fn transport(&self) -> &'static str {
        self.transfer.name()
    }

    /// Mirror every spec; `on_synced` fires once per successful spec.
    pub fn sync_all<F>(
        &self,
        target: &RemoteTarget,
        specs: &[SyncSpec],
        on_synced: F,
    ) -> StageResult<SyncStats>
    where
        F: Fn(&SyncSpec, &SyncStats) + Sync,
    {
        let results = if self.parallel && specs.len() > 1 {
            self.run_parallel(target, specs, &on_synced)
        } else {
            self.run_sequential(target, specs, &on_synced)
        };

        let mut total = SyncStats::default();
        for (spec, result) in specs.iter().zip(results) {
            match result {
                Some(Ok(stats)) => total.merge(&stats),
                Some(Err(source)) => {
                    return Err(StageError::Sync {
                        spec: spec.name().to_string(),
                        source,
                    })
                }
                None => {}
            }
        }
        Ok(total)
    }

    fn mirror_one<F>(
        &self,
        target: &RemoteTarget,
        spec: &SyncSpec,
        on_synced: &F,
    ) -> Result<SyncStats, TransferError>
    where
        F: Fn(&SyncSpec, &SyncStats) + Sync,
    {
        let span = tracing::info_span!("sync", tree = spec.name(), transport = self.transfer.name());
        let _guard = span.enter();
        if !spec.source().exists() {
            return Err(TransferError::MissingSource(spec.source().to_path_buf()));
        }
        let stats = self.transfer.mirror(target, spec)?;
        tracing::info!(
            destination = spec.destination(),
            files = stats.files_transferred,
            deleted = stats.files_deleted,
            "tree mirrored"
        );
        on_synced(spec, &stats);
        Ok(stats)
    }

    /// Stops at the first failure; later specs are never attempted.
    fn run_sequential<F>(
        &self,
        target: &RemoteTarget,
        specs: &[SyncSpec],
        on_synced: &F,
    ) -> Vec<Option<Result<SyncStats, TransferError>>>
    where
        F: Fn(&SyncSpec, &SyncStats) + Sync,
    {
        let mut results = Vec::with_capacity(specs.len());
        let mut failed = false;
        for spec in specs {
            if failed {
                results.push(None);
                continue;
            }
            let result = self.mirror_one(target, spec, on_synced);
            failed = result.is_err();
            results.push(Some(result));
        }
        results
    }

    /// Specs not yet started when one fails are skipped; running ones finish.
    fn run_parallel<F>(
        &self,
        target: &RemoteTarget,
        specs: &[SyncSpec],
        on_synced: &F,
    ) -> Vec<Option<Result<SyncStats, TransferError>>>
    where
        F: Fn(&SyncSpec, &SyncStats) + Sync,
    {
        let failed = AtomicBool::new(false);
        thread::scope(|scope| {
            let handles: Vec<_> = specs
                .iter()
                .map(|spec| {
                    let failed = &failed;
                    scope.spawn(move || {
                        if failed.load(Ordering::SeqCst) {
                            return None;
                        }
                        let result = self.mirror_one(target, spec, on_synced);
                        if result.is_err() {
                            failed.store(true, Ordering::SeqCst);
                        }
                        Some(result)
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|h| match h.join() {
                    Ok(result) => result,
                    Err(_) => Some(Err(TransferError::Staging(
                        "transfer thread panicked".to_string(),
                    ))),
                })
                .collect()
        })
    }
}

//! Backup record entity
//!
//! Created once per run, immediately before the wipe. Never overwritten and
//! never deleted by the pipeline; it is the manual recovery path.

use crate::domain::services::shell::{remote_file_name, remote_join};
use crate::domain::value_objects::RunStamp;

/// Best-effort size information gathered after the copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackupManifest {
    pub size_kb: u64,
    pub file_count: u64,
}

/// Outcome of the backup stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupRecord {
    stamp: RunStamp,
    path: Option<String>,
    manifest: Option<BackupManifest>,
}

impl BackupRecord {
    /// Record for a workspace that did not exist yet (first deployment).
    pub fn empty(stamp: RunStamp) -> Self {
        Self {
            stamp,
            path: None,
            manifest: None,
        }
    }

    pub fn created(stamp: RunStamp, path: impl Into<String>) -> Self {
        Self {
            stamp,
            path: Some(path.into()),
            manifest: None,
        }
    }

    pub fn with_manifest(mut self, manifest: Option<BackupManifest>) -> Self {
        self.manifest = manifest;
        self
    }

    /// Backup location for a workspace, derived only from the run stamp.
    ///
    /// `/srv/app` backed up under `/srv/backups` at `20240305-071502`
    /// becomes `/srv/backups/app-20240305-071502`.
    pub fn path_for(backup_root: &str, workspace: &str, stamp: &RunStamp) -> String {
        let base = remote_file_name(workspace);
        let base = if base.is_empty() { "workspace" } else { base };
        remote_join(backup_root, &format!("{}-{}", base, stamp))
    }

    pub fn stamp(&self) -> &RunStamp {
        &self.stamp
    }

    /// Remote path of the copy, `None` when there was nothing to back up.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn manifest(&self) -> Option<&BackupManifest> {
        self.manifest.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_none()
    }
}

//! Backup Manager
//!
//! Copies the live workspace to a run-scoped path before anything is removed.
//! The copy preserves ownership, modes and timestamps (`cp -a`). A previous
//! backup is never overwritten: an existing destination aborts the stage.

use std::sync::Arc;
use std::time::Duration;

use crate::config::WorkspaceLayout;
use crate::domain::entities::{BackupManifest, BackupRecord};
use crate::domain::ports::{RemoteCommand, RemoteError, RemoteExecutor};
use crate::domain::services::quote_path;
use crate::domain::value_objects::{RemoteTarget, RunStamp};
use crate::error::{StageError, StageResult};

/// Exit status the backup script uses for "destination already exists"
const COLLISION_STATUS: i32 = 17;

const ABSENT_MARKER: &str = "absent";
const CREATED_MARKER: &str = "created";

pub struct BackupManager {
    executor: Arc<dyn RemoteExecutor>,
    timeout: Duration,
}

impl BackupManager {
    pub fn new(executor: Arc<dyn RemoteExecutor>, timeout: Duration) -> Self {
        Self { executor, timeout }
    }

    /// Script that copies `workspace` to `dest`, or reports it absent.
    pub fn backup_script(target: &RemoteTarget, workspace: &WorkspaceLayout, dest: &str) -> String {
        let sudo = target.privileged_prefix();
        format!(
            "src={src}\n\
             dest={dest}\n\
             if [ ! -e \"$src\" ]; then echo {absent}; exit 0; fi\n\
             if [ -e \"$dest\" ]; then echo \"$dest exists\" >&2; exit {collision}; fi\n\
             {sudo}mkdir -p {root} || exit 1\n\
             {sudo}cp -a \"$src\" \"$dest\" || exit 1\n\
             echo {created}\n",
            src = quote_path(&workspace.path),
            dest = quote_path(dest),
            absent = ABSENT_MARKER,
            collision = COLLISION_STATUS,
            sudo = sudo,
            root = quote_path(&workspace.backup_root),
            created = CREATED_MARKER,
        )
    }

    /// `<size_kb> <file_count>` for an existing backup.
    pub fn manifest_script(dest: &str) -> String {
        let dest = quote_path(dest);
        format!(
            "printf '%s %s\\n' \"$(du -sk {dest} | cut -f1)\" \"$(find {dest} -type f | wc -l)\"",
            dest = dest
        )
    }

    /// Back up the workspace for this run.
    ///
    /// Returns the record plus an optional warning when the copy succeeded
    /// but its manifest could not be gathered.
    pub fn backup(
        &self,
        target: &RemoteTarget,
        workspace: &WorkspaceLayout,
        stamp: &RunStamp,
    ) -> StageResult<(BackupRecord, Option<String>)> {
        let dest = BackupRecord::path_for(&workspace.backup_root, &workspace.path, stamp);
        let command = RemoteCommand::script(Self::backup_script(target, workspace, &dest))
            .with_timeout(self.timeout);

        let out = self
            .executor
            .execute(target, &command)
            .map_err(|e| StageError::Backup(e.to_string()))?;

        if out.status == COLLISION_STATUS {
            return Err(StageError::BackupCollision(dest));
        }
        if !out.success() {
            // A partial copy stays where it is for inspection.
            let reason = RemoteError::NonZeroExit {
                status: out.status,
                stderr: out.stderr.trim().to_string(),
            };
            return Err(StageError::Backup(reason.to_string()));
        }

        match out.stdout.trim() {
            ABSENT_MARKER => {
                tracing::info!(workspace = %workspace.path, "workspace absent, nothing to back up");
                Ok((BackupRecord::empty(*stamp), None))
            }
            CREATED_MARKER => {
                let (manifest, warning) = match self.manifest(target, &dest) {
                    Ok(m) => (Some(m), None),
                    Err(e) => (None, Some(format!("backup manifest unavailable: {}", e))),
                };
                tracing::info!(path = %dest, "workspace backed up");
                Ok((
                    BackupRecord::created(*stamp, dest).with_manifest(manifest),
                    warning,
                ))
            }
            other => Err(StageError::Backup(format!(
                "unexpected backup script output: {}",
                other
            ))),
        }
    }

    fn manifest(&self, target: &RemoteTarget, dest: &str) -> Result<BackupManifest, String> {
        let command =
            RemoteCommand::command(Self::manifest_script(dest)).with_timeout(self.timeout);
        let out = self
            .executor
            .execute_checked(target, &command)
            .map_err(|e| e.to_string())?;
        parse_manifest(&out.stdout).ok_or_else(|| format!("could not parse '{}'", out.stdout.trim()))
    }
}

fn parse_manifest(output: &str) -> Option<BackupManifest> {
    let mut parts = output.split_whitespace();
    let size_kb = parts.next()?.parse().ok()?;
    let file_count = parts.next()?.parse().ok()?;
    Some(BackupManifest {
        size_kb,
        file_count,
    })
}

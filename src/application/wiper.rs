//! Workspace Wiper
//!
//! Removes stray junk files next to the workspace, deletes the workspace and
//! recreates it empty. Only ever called after a backup record exists for the
//! current run.

use std::sync::Arc;
use std::time::Duration;

use crate::config::WorkspaceLayout;
use crate::domain::ports::{RemoteCommand, RemoteExecutor};
use crate::domain::services::{quote_path, shell_quote};
use crate::domain::value_objects::RemoteTarget;
use crate::error::{StageError, StageResult};

pub struct WorkspaceWiper {
    executor: Arc<dyn RemoteExecutor>,
    timeout: Duration,
}

/// Paths that must never be handed to `rm -rf`.
fn is_protected(path: &str) -> bool {
    let trimmed = path.trim_end_matches('/');
    trimmed.is_empty() || trimmed == "~" || trimmed == "." || !trimmed.contains('/')
}

impl WorkspaceWiper {
    pub fn new(executor: Arc<dyn RemoteExecutor>, timeout: Duration) -> Self {
        Self { executor, timeout }
    }

    /// `find` expression deleting top-level junk files in the junk directory.
    /// A missing junk directory (first deployment) is skipped.
    fn junk_command(target: &RemoteTarget, workspace: &WorkspaceLayout) -> Option<String> {
        if workspace.junk_patterns.is_empty() {
            return None;
        }
        let names = workspace
            .junk_patterns
            .iter()
            .map(|p| format!("-name {}", shell_quote(p)))
            .collect::<Vec<_>>()
            .join(" -o ");
        let dir = quote_path(&workspace.junk_dir);
        Some(format!(
            "if [ -d {dir} ]; then {sudo}find {dir} -maxdepth 1 -type f \\( {names} \\) -delete; fi",
            dir = dir,
            sudo = target.privileged_prefix(),
            names = names
        ))
    }

    pub fn wipe_script(target: &RemoteTarget, workspace: &WorkspaceLayout) -> String {
        let sudo = target.privileged_prefix();
        let ws = quote_path(&workspace.path);
        let mut script = String::from("set -e\n");
        if let Some(junk) = Self::junk_command(target, workspace) {
            script.push_str(&junk);
            script.push('\n');
        }
        script.push_str(&format!("{}rm -rf {}\n", sudo, ws));
        script.push_str(&format!("mkdir -p {}\n", ws));
        script
    }

    pub fn wipe(&self, target: &RemoteTarget, workspace: &WorkspaceLayout) -> StageResult<()> {
        if is_protected(&workspace.path) {
            return Err(StageError::Wipe(format!(
                "refusing to remove '{}'",
                workspace.path
            )));
        }
        let command = RemoteCommand::script(Self::wipe_script(target, workspace))
            .with_timeout(self.timeout);
        self.executor
            .execute_checked(target, &command)
            .map_err(|e| StageError::Wipe(e.to_string()))?;
        tracing::info!(workspace = %workspace.path, "workspace reset");
        Ok(())
    }
}

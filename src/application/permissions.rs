//! Permission Fixer
//!
//! Applies ownership and executable bits to freshly mirrored content.

use std::sync::Arc;
use std::time::Duration;

use crate::config::PermissionPolicy;
use crate::domain::entities::SyncSpec;
use crate::domain::ports::{RemoteCommand, RemoteExecutor};
use crate::domain::services::{quote_path, shell_quote};
use crate::domain::value_objects::RemoteTarget;
use crate::error::{StageError, StageResult};

pub struct PermissionFixer {
    executor: Arc<dyn RemoteExecutor>,
    timeout: Duration,
}

/// Workspace plus every tree destination that lives outside it.
pub fn affected_roots(workspace: &str, trees: &[SyncSpec]) -> Vec<String> {
    let prefix = format!("{}/", workspace.trim_end_matches('/'));
    let mut roots = vec![workspace.to_string()];
    for tree in trees {
        let dest = tree.destination();
        if dest != workspace && !dest.starts_with(&prefix) && !roots.iter().any(|r| r == dest) {
            roots.push(dest.to_string());
        }
    }
    roots
}

impl PermissionFixer {
    pub fn new(executor: Arc<dyn RemoteExecutor>, timeout: Duration) -> Self {
        Self { executor, timeout }
    }

    /// `None` when the policy has nothing to apply.
    pub fn script(target: &RemoteTarget, policy: &PermissionPolicy, roots: &[String]) -> Option<String> {
        let chown = policy.chown_spec();
        if chown.is_none() && policy.executable.is_empty() {
            return None;
        }
        let sudo = target.privileged_prefix();
        let paths = roots
            .iter()
            .map(|r| quote_path(r))
            .collect::<Vec<_>>()
            .join(" ");

        let mut script = String::from("set -e\n");
        if let Some(spec) = chown {
            script.push_str(&format!("{}chown -R {} {}\n", sudo, shell_quote(&spec), paths));
        }
        if !policy.executable.is_empty() {
            let names = policy
                .executable
                .iter()
                .map(|g| format!("-name {}", shell_quote(g)))
                .collect::<Vec<_>>()
                .join(" -o ");
            script.push_str(&format!(
                "{}find {} -type f \\( {} \\) -exec chmod +x {{}} +\n",
                sudo, paths, names
            ));
        }
        Some(script)
    }

    pub fn apply(
        &self,
        target: &RemoteTarget,
        policy: &PermissionPolicy,
        workspace: &str,
        trees: &[SyncSpec],
    ) -> StageResult<()> {
        let roots = affected_roots(workspace, trees);
        let Some(script) = Self::script(target, policy, &roots) else {
            tracing::debug!("no permission policy configured");
            return Ok(());
        };
        let command = RemoteCommand::script(script).with_timeout(self.timeout);
        self.executor
            .execute_checked(target, &command)
            .map_err(|e| StageError::Permission(e.to_string()))?;
        Ok(())
    }
}

//! Dependency Provisioner
//!
//! Ensures the isolated runtime environment exists on the remote host and
//! installs the dependency manifest into it. An existing environment is
//! reused, not recreated.

use std::sync::Arc;
use std::time::Duration;

use crate::config::EnvSpec;
use crate::domain::ports::{RemoteCommand, RemoteError, RemoteExecutor};
use crate::domain::services::{quote_path, shell_quote};
use crate::domain::value_objects::RemoteTarget;
use crate::error::{StageError, StageResult};

/// Exit status the script uses when the manifest is missing
const MISSING_MANIFEST_STATUS: i32 = 3;

pub struct DependencyProvisioner {
    executor: Arc<dyn RemoteExecutor>,
    timeout: Duration,
}

impl DependencyProvisioner {
    pub fn new(executor: Arc<dyn RemoteExecutor>, timeout: Duration) -> Self {
        Self { executor, timeout }
    }

    pub fn script(env: &EnvSpec) -> String {
        let mut script = format!(
            "set -e\n\
             env={env}\n\
             manifest={manifest}\n\
             if [ ! -f \"$manifest\" ]; then echo \"$manifest not found\" >&2; exit {missing}; fi\n\
             if [ ! -x \"$env/bin/python\" ]; then {interp} -m venv \"$env\"; fi\n",
            env = quote_path(&env.env_dir),
            manifest = quote_path(&env.manifest),
            missing = MISSING_MANIFEST_STATUS,
            interp = shell_quote(&env.interpreter),
        );
        if env.upgrade_installer {
            script.push_str("\"$env/bin/python\" -m pip install --quiet --upgrade pip\n");
        }
        script.push_str("\"$env/bin/python\" -m pip install --quiet -r \"$manifest\"\n");
        script
    }

    pub fn provision(&self, target: &RemoteTarget, env: &EnvSpec) -> StageResult<()> {
        let command = RemoteCommand::script(Self::script(env)).with_timeout(self.timeout);
        let out = self
            .executor
            .execute(target, &command)
            .map_err(|e| StageError::Provision(e.to_string()))?;
        match out.status {
            0 => {
                tracing::info!(env = %env.env_dir, "dependencies installed");
                Ok(())
            }
            MISSING_MANIFEST_STATUS => Err(StageError::Provision(format!(
                "dependency manifest {} does not exist on the remote host",
                env.manifest
            ))),
            status => Err(StageError::Provision(
                RemoteError::NonZeroExit {
                    status,
                    stderr: last_lines(&out.stderr, 5),
                }
                .to_string(),
            )),
        }
    }
}

/// Installer output is long; the tail carries the actual error.
fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.trim().lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

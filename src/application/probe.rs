//! Connectivity Probe
//!
//! A trivial remote command with a short timeout, issued exactly once before
//! anything destructive happens.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::ports::{RemoteCommand, RemoteError, RemoteExecutor};
use crate::domain::value_objects::RemoteTarget;

/// Marker echoed back by the remote shell
const PROBE_MARKER: &str = "treemirror-ok";

/// Outcome of a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    Reachable,
    Unreachable(String),
}

impl ProbeResult {
    pub fn is_reachable(&self) -> bool {
        matches!(self, ProbeResult::Reachable)
    }
}

pub struct ConnectivityProbe {
    executor: Arc<dyn RemoteExecutor>,
}

/// Last non-empty line, so login banners printed before the marker are ignored.
fn last_line(stdout: &str) -> Option<&str> {
    stdout.lines().map(str::trim).rev().find(|l| !l.is_empty())
}

impl ConnectivityProbe {
    pub fn new(executor: Arc<dyn RemoteExecutor>) -> Self {
        Self { executor }
    }

    pub fn command() -> String {
        format!("echo {}", PROBE_MARKER)
    }

    pub fn check(&self, target: &RemoteTarget, timeout: Duration) -> ProbeResult {
        let command = RemoteCommand::command(Self::command()).with_timeout(timeout);
        match self.executor.execute(target, &command) {
            Ok(out) if out.success() && last_line(&out.stdout) == Some(PROBE_MARKER) => {
                ProbeResult::Reachable
            }
            Ok(out) if out.success() => ProbeResult::Unreachable(format!(
                "unexpected probe response: {}",
                out.stdout.trim()
            )),
            Ok(out) => ProbeResult::Unreachable(
                RemoteError::NonZeroExit {
                    status: out.status,
                    stderr: out.stderr.trim().to_string(),
                }
                .to_string(),
            ),
            Err(e) => ProbeResult::Unreachable(e.to_string()),
        }
    }

    /// Ask the remote shell for `$HOME`, used to resolve `~/` paths.
    pub fn remote_home(
        &self,
        target: &RemoteTarget,
        timeout: Duration,
    ) -> Result<Option<String>, RemoteError> {
        let command = RemoteCommand::command("echo $HOME").with_timeout(timeout);
        let out = self.executor.execute_checked(target, &command)?;
        let home = out.stdout.trim();
        if home.is_empty() || !home.starts_with('/') {
            Ok(None)
        } else {
            Ok(Some(home.to_string()))
        }
    }
}

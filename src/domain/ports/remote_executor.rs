//! Remote Executor Port
//!
//! Runs a command or a multi-line script on a remote host and returns its
//! exit status and captured output. Every remote side effect in the pipeline
//! goes through this port; the ssh implementation lives in
//! `infrastructure::ssh`, tests use scripted fakes.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::domain::value_objects::RemoteTarget;

/// Whether the body is a single command line or a script piped to a shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Passed as the ssh command argument
    Command,
    /// Written to the stdin of a remote `sh -s`
    Script,
}

/// A unit of remote work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCommand {
    body: String,
    kind: CommandKind,
    timeout: Option<Duration>,
}

impl RemoteCommand {
    pub fn command(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            kind: CommandKind::Command,
            timeout: None,
        }
    }

    pub fn script(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            kind: CommandKind::Script,
            timeout: None,
        }
    }

    /// Override the executor's default timeout for this command.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Captured result of a remote process that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn new(status: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Turn a non-zero exit into [`RemoteError::NonZeroExit`].
    pub fn into_success(self) -> Result<Self, RemoteError> {
        if self.success() {
            Ok(self)
        } else {
            Err(RemoteError::NonZeroExit {
                status: self.status,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Failure to run a remote command.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("connection refused by {0}")]
    ConnectionRefused(String),

    #[error("authentication failed for {0}")]
    AuthenticationFailed(String),

    #[error("remote command timed out after {}s", .after.as_secs())]
    RemoteTimeout { after: Duration },

    #[error("remote command exited with status {status}{}", stderr_suffix(.stderr))]
    NonZeroExit { status: i32, stderr: String },

    #[error("host unreachable: {0}")]
    Unreachable(String),

    #[error("failed to launch ssh: {0}")]
    Spawn(#[from] std::io::Error),
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

impl RemoteError {
    /// Errors that mean the host itself could not be used.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::ConnectionRefused(_)
                | Self::AuthenticationFailed(_)
                | Self::RemoteTimeout { .. }
                | Self::Unreachable(_)
        )
    }
}

/// Port for executing work on a remote host.
pub trait RemoteExecutor: Send + Sync {
    /// Run `command` on `target`, blocking until it exits or times out.
    ///
    /// A non-zero remote exit status is returned as `Ok` with the status in
    /// [`CommandOutput`]; callers decide whether it is fatal.
    fn execute(
        &self,
        target: &RemoteTarget,
        command: &RemoteCommand,
    ) -> Result<CommandOutput, RemoteError>;

    /// Run and require a zero exit status.
    fn execute_checked(
        &self,
        target: &RemoteTarget,
        command: &RemoteCommand,
    ) -> Result<CommandOutput, RemoteError> {
        self.execute(target, command)?.into_success()
    }
}

impl<T: RemoteExecutor + ?Sized> RemoteExecutor for Arc<T> {
    fn execute(
        &self,
        target: &RemoteTarget,
        command: &RemoteCommand,
    ) -> Result<CommandOutput, RemoteError> {
        (**self).execute(target, command)
    }
}

impl<T: RemoteExecutor + ?Sized> RemoteExecutor for &T {
    fn execute(
        &self,
        target: &RemoteTarget,
        command: &RemoteCommand,
    ) -> Result<CommandOutput, RemoteError> {
        (**self).execute(target, command)
    }
}

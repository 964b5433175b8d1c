//! SSH Remote Executor
//!
//! Implements the RemoteExecutor port by shelling out to the system `ssh`
//! client. Single commands are passed as the ssh command argument; scripts
//! are piped to a remote `sh -s`.

use std::process::Command;
use std::time::Duration;

use crate::domain::ports::{CommandKind, CommandOutput, RemoteCommand, RemoteError, RemoteExecutor};
use crate::domain::services::shell::abbreviate;
use crate::domain::value_objects::RemoteTarget;

use super::options::SshOptions;
use super::process::run_captured;

/// Exit status ssh uses for its own failures
const SSH_FAILURE_STATUS: i32 = 255;

/// Remote executor backed by the OpenSSH client.
#[derive(Debug, Clone, Default)]
pub struct SshExecutor {
    options: SshOptions,
}

impl SshExecutor {
    pub fn new(options: SshOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SshOptions {
        &self.options
    }

    fn build_command(&self, target: &RemoteTarget, command: &RemoteCommand) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.args(self.options.ssh_args(target)).arg(target.destination());

        match command.kind() {
            CommandKind::Command => cmd.arg(command.body()),
            CommandKind::Script => cmd.arg("sh -s"),
        };
        cmd
    }
}

/// Map an ssh-level failure (exit 255) to a typed error.
///
/// Returns `None` when stderr does not look like an ssh client error, in
/// which case the remote command itself exited with 255.
pub(crate) fn classify_ssh_failure(
    stderr: &str,
    target: &RemoteTarget,
    connect_timeout: Duration,
) -> Option<RemoteError> {
    let lower = stderr.to_lowercase();
    let destination = target.to_string();

    if lower.contains("connection refused") {
        Some(RemoteError::ConnectionRefused(destination))
    } else if lower.contains("permission denied")
        || lower.contains("too many authentication failures")
        || lower.contains("host key verification failed")
    {
        Some(RemoteError::AuthenticationFailed(destination))
    } else if lower.contains("timed out") {
        Some(RemoteError::RemoteTimeout {
            after: connect_timeout,
        })
    } else if lower.contains("could not resolve")
        || lower.contains("no route to host")
        || lower.contains("network is unreachable")
        || lower.contains("connection closed")
        || lower.contains("connection reset")
        || lower.starts_with("ssh:")
    {
        Some(RemoteError::Unreachable(stderr.trim().to_string()))
    } else {
        None
    }
}

impl RemoteExecutor for SshExecutor {
    fn execute(
        &self,
        target: &RemoteTarget,
        command: &RemoteCommand,
    ) -> Result<CommandOutput, RemoteError> {
        let timeout = command.timeout().unwrap_or(self.options.command_timeout);
        tracing::debug!(
            destination = %target,
            kind = ?command.kind(),
            timeout_secs = timeout.as_secs(),
            command = %abbreviate(command.body(), 80),
            "remote exec"
        );

        let input = match command.kind() {
            CommandKind::Script => Some(command.body().to_string()),
            CommandKind::Command => None,
        };
        let Some(finished) = run_captured(self.build_command(target, command), input, timeout)?
        else {
            tracing::warn!(destination = %target, timeout_secs = timeout.as_secs(), "remote command timed out");
            return Err(RemoteError::RemoteTimeout { after: timeout });
        };

        let code = finished.code();
        if code == SSH_FAILURE_STATUS {
            if let Some(err) =
                classify_ssh_failure(&finished.stderr, target, self.options.connect_timeout)
            {
                tracing::debug!(destination = %target, error = %err, "ssh failure");
                return Err(err);
            }
        }

        tracing::trace!(destination = %target, status = code, "remote command finished");
        Ok(CommandOutput::new(code, finished.stdout, finished.stderr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> RemoteTarget {
        RemoteTarget::new("box", "ops", "/k")
    }

    #[test]
    fn classifies_connection_refused() {
        let err = classify_ssh_failure(
            "ssh: connect to host box port 22: Connection refused\n",
            &target(),
            Duration::from_secs(5),
        );
        assert!(matches!(err, Some(RemoteError::ConnectionRefused(_))));
    }

    #[test]
    fn classifies_authentication_failure() {
        let err = classify_ssh_failure(
            "ops@box: Permission denied (publickey).\n",
            &target(),
            Duration::from_secs(5),
        );
        assert!(matches!(err, Some(RemoteError::AuthenticationFailed(_))));
    }

    #[test]
    fn classifies_connect_timeout() {
        let err = classify_ssh_failure(
            "ssh: connect to host box port 22: Connection timed out\n",
            &target(),
            Duration::from_secs(5),
        );
        match err {
            Some(RemoteError::RemoteTimeout { after }) => {
                assert_eq!(after, Duration::from_secs(5))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn classifies_dns_failure_as_unreachable() {
        let err = classify_ssh_failure(
            "ssh: Could not resolve hostname box: Name or service not known\n",
            &target(),
            Duration::from_secs(5),
        );
        assert!(matches!(err, Some(RemoteError::Unreachable(_))));
    }

    #[test]
    fn remote_exit_255_without_ssh_noise_is_not_an_ssh_error() {
        assert!(classify_ssh_failure("custom failure\n", &target(), Duration::from_secs(5)).is_none());
    }

    #[test]
    fn script_commands_pipe_to_sh() {
        let executor = SshExecutor::default();
        let cmd = executor.build_command(&target(), &RemoteCommand::script("echo hi"));
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args.last().map(String::as_str), Some("sh -s"));
        assert!(args.contains(&"ops@box".to_string()));
    }
}

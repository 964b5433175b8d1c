//! SSH connection options
//!
//! One place that renders the ssh flags for a target, so that the executor,
//! rsync's `-e` shell and scp all authenticate the same way.

use std::time::Duration;

use crate::domain::services::shell_quote;
use crate::domain::value_objects::RemoteTarget;

/// Default time allowed for the TCP/SSH handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default time allowed for a remote command to finish
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(900);

/// Flags shared by every ssh-based tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshOptions {
    /// Handshake timeout (`-o ConnectTimeout`)
    pub connect_timeout: Duration,
    /// Default wall-clock limit for a remote command
    pub command_timeout: Duration,
    /// Accept unknown host keys on first contact
    pub accept_new_host_keys: bool,
}

impl Default for SshOptions {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            accept_new_host_keys: true,
        }
    }
}

impl SshOptions {
    fn common(&self, target: &RemoteTarget) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout.as_secs().max(1)),
            "-o".to_string(),
            "ServerAliveInterval=15".to_string(),
            "-o".to_string(),
            "ServerAliveCountMax=3".to_string(),
        ];
        if self.accept_new_host_keys {
            args.push("-o".to_string());
            args.push("StrictHostKeyChecking=accept-new".to_string());
        }
        args.push("-i".to_string());
        args.push(target.key().display().to_string());
        args
    }

    /// Arguments for `ssh`, excluding the destination and command.
    pub fn ssh_args(&self, target: &RemoteTarget) -> Vec<String> {
        let mut args = self.common(target);
        args.push("-p".to_string());
        args.push(target.port().to_string());
        args
    }

    /// Arguments for `scp` (which spells the port `-P`).
    pub fn scp_args(&self, target: &RemoteTarget) -> Vec<String> {
        let mut args = self.common(target);
        args.push("-P".to_string());
        args.push(target.port().to_string());
        args
    }

    /// Remote shell command line for `rsync -e`.
    pub fn rsync_shell(&self, target: &RemoteTarget) -> String {
        let mut parts = vec!["ssh".to_string()];
        parts.extend(self.ssh_args(target).iter().map(|a| {
            if a.chars().all(|c| c.is_ascii_alphanumeric() || "-_=./~".contains(c)) {
                a.clone()
            } else {
                shell_quote(a)
            }
        }));
        parts.join(" ")
    }
}

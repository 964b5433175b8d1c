//! Rsync Transfer Strategy
//!
//! Mirrors a tree with `rsync -a --delete`, which preserves times and modes,
//! compresses in transit, and natively protects excluded paths from
//! deletion. This is the preferred transport.

use std::process::{Command, Stdio};
use std::sync::Arc;

use crate::domain::entities::SyncSpec;
use crate::domain::ports::{
    RemoteCommand, RemoteError, RemoteExecutor, SyncStats, TransferError, TreeTransfer,
};
use crate::domain::services::quote_path;
use crate::domain::services::shell::remote_parent;
use crate::domain::value_objects::RemoteTarget;
use crate::infrastructure::ssh::{run_captured, SshOptions};

/// rsync: "partial transfer due to vanished source files"
const RSYNC_VANISHED: i32 = 24;

/// Transfer strategy using rsync over ssh
pub struct RsyncTransfer {
    executor: Arc<dyn RemoteExecutor>,
    options: SshOptions,
}

impl RsyncTransfer {
    pub fn new(executor: Arc<dyn RemoteExecutor>, options: SshOptions) -> Self {
        Self { executor, options }
    }

    /// Check if rsync is installed and available
    pub fn check_available() -> bool {
        Command::new("rsync")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Full argument list for one spec.
    pub fn rsync_args(&self, target: &RemoteTarget, spec: &SyncSpec) -> Vec<String> {
        let single_file = spec.is_single_file();
        let mut args = vec![
            "-a".to_string(),
            "-z".to_string(),
            "--itemize-changes".to_string(),
            "--stats".to_string(),
        ];
        if spec.delete_extraneous() && !single_file {
            args.push("--delete".to_string());
        }
        for pattern in spec.exclude().patterns() {
            args.push(format!("--exclude={}", pattern));
        }
        args.push("-e".to_string());
        args.push(self.options.rsync_shell(target));

        let source = spec.source().display().to_string();
        if single_file {
            args.push(source);
            args.push(format!("{}:{}", target.destination(), spec.destination()));
        } else {
            // trailing slash = copy contents
            args.push(format!("{}/", source.trim_end_matches('/')));
            args.push(format!(
                "{}:{}/",
                target.destination(),
                spec.destination().trim_end_matches('/')
            ));
        }
        args
    }

    fn ensure_destination(&self, target: &RemoteTarget, spec: &SyncSpec) -> Result<(), TransferError> {
        let dir = if spec.is_single_file() {
            remote_parent(spec.destination())
        } else {
            spec.destination().to_string()
        };
        self.executor.execute_checked(
            target,
            &RemoteCommand::command(format!("mkdir -p {}", quote_path(&dir))),
        )?;
        Ok(())
    }
}

/// Extract counters from `--itemize-changes --stats` output.
pub fn parse_rsync_output(stdout: &str) -> SyncStats {
    let mut stats = SyncStats::default();
    for line in stdout.lines() {
        if line.starts_with("<f") || line.starts_with(">f") {
            stats.files_transferred += 1;
        } else if line.starts_with("*deleting ") {
            stats.files_deleted += 1;
        } else if let Some(rest) = line.strip_prefix("Total transferred file size:") {
            let digits: String = rest
                .trim()
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .chars()
                .filter(|c| c.is_ascii_digit())
                .collect();
            stats.bytes_transferred = digits.parse().unwrap_or(0);
        }
    }
    stats
}

impl TreeTransfer for RsyncTransfer {
    fn name(&self) -> &'static str {
        "rsync"
    }

    fn is_available(&self) -> bool {
        Self::check_available()
    }

    fn mirror(&self, target: &RemoteTarget, spec: &SyncSpec) -> Result<SyncStats, TransferError> {
        if !spec.source().exists() {
            return Err(TransferError::MissingSource(spec.source().to_path_buf()));
        }
        self.ensure_destination(target, spec)?;

        let args = self.rsync_args(target, spec);
        tracing::debug!(tree = spec.name(), args = ?args, "rsync");

        let mut cmd = Command::new("rsync");
        cmd.args(&args);
        let Some(output) = run_captured(cmd, None, self.options.command_timeout)? else {
            tracing::warn!(tree = spec.name(), timeout_secs = self.options.command_timeout.as_secs(), "rsync timed out");
            return Err(TransferError::Remote(RemoteError::RemoteTimeout {
                after: self.options.command_timeout,
            }));
        };

        let status = output.code();
        let stdout = output.stdout;
        let stderr = output.stderr;

        match status {
            0 => Ok(parse_rsync_output(&stdout)),
            RSYNC_VANISHED => {
                tracing::warn!(tree = spec.name(), "some source files vanished during transfer");
                Ok(parse_rsync_output(&stdout))
            }
            _ => Err(TransferError::CommandFailed {
                program: "rsync",
                status,
                stderr: stderr.trim().to_string(),
            }),
        }
    }
}

//! SCP Transfer Strategy
//!
//! Fallback when rsync is not installed. scp has no notion of exclusion or
//! deletion, so this strategy computes a [`MirrorPlan`] locally:
//!
//! 1. List the remote tree over ssh
//! 2. Plan copies and deletions with the tree's exclude rules
//! 3. Delete extraneous remote files and then-empty directories
//! 4. Stage the non-excluded local files (times and modes preserved)
//! 5. Copy the staged tree with `scp -r -p -C`

use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;

use crate::domain::entities::SyncSpec;
use crate::domain::ports::{
    RemoteCommand, RemoteError, RemoteExecutor, SyncStats, TransferError, TreeTransfer,
};
use crate::domain::services::shell::remote_parent;
use crate::domain::services::{quote_path, shell_quote, MirrorPlan, TreeListing};
use crate::domain::value_objects::RemoteTarget;
use crate::infrastructure::ssh::{run_captured, SshOptions};

/// Transfer strategy using scp plus ssh-side bookkeeping
pub struct ScpTransfer {
    executor: Arc<dyn RemoteExecutor>,
    options: SshOptions,
}

impl ScpTransfer {
    pub fn new(executor: Arc<dyn RemoteExecutor>, options: SshOptions) -> Self {
        Self { executor, options }
    }

    /// Check if scp is installed and available
    pub fn check_available() -> bool {
        // scp without args returns non-zero, but if we can spawn it, it's available
        Command::new("scp")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }

    /// Script that prints `d ./dir` and `f ./file` lines for a remote tree.
    pub fn listing_script(destination: &str) -> String {
        format!(
            "dest={}\n\
             [ -d \"$dest\" ] || exit 0\n\
             cd \"$dest\" || exit 1\n\
             find . -mindepth 1 -type d -exec printf 'd %s\\n' {{}} +\n\
             find . -mindepth 1 ! -type d -exec printf 'f %s\\n' {{}} +\n",
            quote_path(destination)
        )
    }

    /// Script that removes the plan's extraneous entries and creates its
    /// directories.
    pub fn prepare_script(destination: &str, plan: &MirrorPlan) -> String {
        let mut script = format!(
            "set -e\ndest={}\nmkdir -p \"$dest\"\ncd \"$dest\"\n",
            quote_path(destination)
        );
        for file in &plan.delete_files {
            script.push_str(&format!("rm -f -- {}\n", shell_quote(&file.to_string_lossy())));
        }
        for dir in &plan.delete_dirs {
            // keeps directories that still hold excluded files
            script.push_str(&format!(
                "rmdir -- {} 2>/dev/null || true\n",
                shell_quote(&dir.to_string_lossy())
            ));
        }
        for dir in &plan.copy_dirs {
            script.push_str(&format!("mkdir -p -- {}\n", shell_quote(&dir.to_string_lossy())));
        }
        script
    }

    fn run_scp(
        &self,
        target: &RemoteTarget,
        sources: &[String],
        remote: &str,
    ) -> Result<(), TransferError> {
        let mut cmd = Command::new("scp");
        cmd.arg("-r")
            .arg("-p")
            .arg("-C")
            .arg("-q")
            .args(self.options.scp_args(target))
            .args(sources)
            .arg(format!("{}:{}", target.destination(), remote));
        let Some(output) = run_captured(cmd, None, self.options.command_timeout)? else {
            tracing::warn!(timeout_secs = self.options.command_timeout.as_secs(), "scp timed out");
            return Err(TransferError::Remote(RemoteError::RemoteTimeout {
                after: self.options.command_timeout,
            }));
        };

        if !output.status.success() {
            return Err(TransferError::CommandFailed {
                program: "scp",
                status: output.code(),
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(())
    }

    fn mirror_file(&self, target: &RemoteTarget, spec: &SyncSpec) -> Result<SyncStats, TransferError> {
        let parent = remote_parent(spec.destination());
        self.executor.execute_checked(
            target,
            &RemoteCommand::command(format!("mkdir -p {}", quote_path(&parent))),
        )?;
        let size = fs::metadata(spec.source())?.len();
        self.run_scp(
            target,
            &[spec.source().display().to_string()],
            spec.destination(),
        )?;
        Ok(SyncStats {
            files_transferred: 1,
            files_deleted: 0,
            bytes_transferred: size,
        })
    }

    fn mirror_tree(&self, target: &RemoteTarget, spec: &SyncSpec) -> Result<SyncStats, TransferError> {
        let listing = self.executor.execute_checked(
            target,
            &RemoteCommand::script(Self::listing_script(spec.destination())),
        )?;
        let remote = TreeListing::parse_remote(&listing.stdout);
        let local = TreeListing::scan_local(spec.source())?;
        let plan = MirrorPlan::compute(&local, &remote, spec.exclude(), spec.delete_extraneous());

        tracing::debug!(
            tree = spec.name(),
            copy = plan.copy_files.len(),
            delete = plan.delete_files.len(),
            "scp mirror plan"
        );

        self.executor.execute_checked(
            target,
            &RemoteCommand::script(Self::prepare_script(spec.destination(), &plan)),
        )?;

        let staging = tempfile::tempdir()?;
        let bytes = stage_plan(spec.source(), &plan, staging.path())?;

        let mut sources = Vec::new();
        for entry in fs::read_dir(staging.path())? {
            sources.push(entry?.path().display().to_string());
        }
        sources.sort();
        if !sources.is_empty() {
            let remote_dir = format!("{}/", spec.destination().trim_end_matches('/'));
            self.run_scp(target, &sources, &remote_dir)?;
        }

        Ok(SyncStats {
            files_transferred: plan.copy_files.len() as u64,
            files_deleted: plan.delete_files.len() as u64,
            bytes_transferred: bytes,
        })
    }
}

/// Copy the plan's files into `staging`, preserving modes and mtimes.
/// Returns the number of bytes staged.
pub fn stage_plan(root: &Path, plan: &MirrorPlan, staging: &Path) -> Result<u64, TransferError> {
    for dir in &plan.copy_dirs {
        fs::create_dir_all(staging.join(dir))?;
    }

    let mut bytes = 0;
    for rel in &plan.copy_files {
        let from = root.join(rel);
        let to = staging.join(rel);
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        let meta = fs::symlink_metadata(&from)?;
        if meta.file_type().is_symlink() {
            copy_symlink(&from, &to)?;
            continue;
        }
        bytes += fs::copy(&from, &to)?;
        let modified = meta.modified()?;
        fs::OpenOptions::new()
            .write(true)
            .open(&to)?
            .set_modified(modified)
            .map_err(|e| TransferError::Staging(format!("{}: {}", to.display(), e)))?;
    }
    Ok(bytes)
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> Result<(), TransferError> {
    let link = fs::read_link(from)?;
    std::os::unix::fs::symlink(link, to)?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> Result<(), TransferError> {
    fs::copy(from, to)?;
    Ok(())
}

impl TreeTransfer for ScpTransfer {
    fn name(&self) -> &'static str {
        "scp"
    }

    fn is_available(&self) -> bool {
        Self::check_available()
    }

    fn mirror(&self, target: &RemoteTarget, spec: &SyncSpec) -> Result<SyncStats, TransferError> {
        if !spec.source().exists() {
            return Err(TransferError::MissingSource(spec.source().to_path_buf()));
        }
        if spec.is_single_file() {
            self.mirror_file(target, spec)
        } else {
            self.mirror_tree(target, spec)
        }
    }
}

//! Validated, resolved settings for one run
//!
//! Built once from a [`Config`]; every stage receives these values and none of
//! them read configuration or the environment afterwards.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::domain::entities::{ServiceSet, SyncSpec};
use crate::domain::services::shell::remote_parent;
use crate::domain::services::{expand_home, remote_join};
use crate::domain::value_objects::{ExcludePatterns, RemoteTarget};
use crate::infrastructure::transfer::TransferMode;

use super::loader::expand_local_tilde;
use super::types::{Config, ConfigError};

/// Remote workspace paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    pub path: String,
    pub backup_root: String,
    pub junk_dir: String,
    pub junk_patterns: Vec<String>,
}

/// Ownership and executable-bit policy applied after sync.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PermissionPolicy {
    pub owner: Option<String>,
    pub group: Option<String>,
    /// Basename globs that receive `+x`
    pub executable: Vec<String>,
}

impl PermissionPolicy {
    /// `owner:group`, `owner` or `:group` for `chown`.
    pub fn chown_spec(&self) -> Option<String> {
        match (&self.owner, &self.group) {
            (Some(o), Some(g)) => Some(format!("{}:{}", o, g)),
            (Some(o), None) => Some(o.clone()),
            (None, Some(g)) => Some(format!(":{}", g)),
            (None, None) => None,
        }
    }
}

/// Isolated runtime environment to (re)provision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvSpec {
    pub env_dir: String,
    pub interpreter: String,
    pub manifest: String,
    pub upgrade_installer: bool,
}

/// Everything a pipeline run needs, fully resolved.
#[derive(Debug, Clone)]
pub struct Settings {
    pub target: RemoteTarget,
    pub workspace: WorkspaceLayout,
    pub trees: Vec<SyncSpec>,
    pub services: ServiceSet,
    pub supervisor_conf: Option<String>,
    pub permissions: PermissionPolicy,
    pub provision: Option<EnvSpec>,
    pub probe_timeout: Duration,
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
    pub transfer: TransferMode,
    pub parallel_sync: bool,
}

fn is_remote_absolute(path: &str) -> bool {
    path.starts_with('/') || path == "~" || path.starts_with("~/")
}

impl Config {
    /// Validate and resolve against `base_dir` (the configuration file's directory).
    pub fn resolve(&self, base_dir: &Path) -> Result<Settings, ConfigError> {
        let t = &self.target;
        if t.host.trim().is_empty() {
            return Err(ConfigError::Invalid("target.host must not be empty".into()));
        }
        if t.user.trim().is_empty() {
            return Err(ConfigError::Invalid("target.user must not be empty".into()));
        }
        if t.key.trim().is_empty() {
            return Err(ConfigError::Invalid("target.key must not be empty".into()));
        }
        let target = RemoteTarget::new(t.host.trim(), t.user.trim(), expand_local_tilde(&t.key))
            .with_port(t.port)
            .with_sudo(t.sudo);

        let ws = &self.workspace;
        let path = ws.path.trim().trim_end_matches('/').to_string();
        if path.is_empty() || !is_remote_absolute(&path) || path == "~" {
            return Err(ConfigError::Invalid(format!(
                "workspace.path must be an absolute remote path below / or ~/, got '{}'",
                ws.path
            )));
        }
        let parent = remote_parent(&path);
        let backup_root = ws
            .backup_root
            .clone()
            .unwrap_or_else(|| remote_join(&parent, "backups"));
        let junk_dir = ws.junk_dir.clone().unwrap_or_else(|| parent.clone());
        if !is_remote_absolute(&backup_root) || !is_remote_absolute(&junk_dir) {
            return Err(ConfigError::Invalid(
                "workspace.backup_root and workspace.junk_dir must be absolute".into(),
            ));
        }
        if backup_root == path || backup_root.starts_with(&format!("{}/", path)) {
            return Err(ConfigError::Invalid(
                "workspace.backup_root must not be inside the workspace it backs up".into(),
            ));
        }
        let workspace = WorkspaceLayout {
            path: path.clone(),
            backup_root,
            junk_dir,
            junk_patterns: ws.junk_patterns.clone(),
        };

        if self.sync.is_empty() {
            return Err(ConfigError::Invalid("at least one [[sync]] entry is required".into()));
        }
        let mut trees = Vec::with_capacity(self.sync.len());
        for entry in &self.sync {
            let source = base_dir.join(expand_local_tilde(&entry.source.to_string_lossy()));
            if !source.exists() {
                return Err(ConfigError::Invalid(format!(
                    "sync source {} does not exist",
                    source.display()
                )));
            }
            let exclude = ExcludePatterns::new(&entry.exclude)
                .map_err(|e| ConfigError::Invalid(format!("sync exclude: {}", e)))?;
            let mut spec = SyncSpec::new(source, remote_join(&path, entry.destination.trim()))
                .with_exclude(exclude)
                .with_delete_extraneous(entry.delete);
            if let Some(name) = &entry.name {
                spec = spec.with_name(name.clone());
            }
            trees.push(spec);
        }

        let mut seen = HashSet::new();
        for name in &self.services.names {
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "service '{}' is listed more than once",
                    name
                )));
            }
        }
        let services = ServiceSet::new(self.services.names.iter().cloned());

        let tm = &self.timeouts;
        if tm.probe_secs == 0 || tm.connect_secs == 0 || tm.command_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be greater than zero".into()));
        }

        let provision = self.provision.enabled.then(|| EnvSpec {
            env_dir: remote_join(&path, &self.provision.env_dir),
            interpreter: self.provision.interpreter.clone(),
            manifest: remote_join(&path, &self.provision.manifest),
            upgrade_installer: self.provision.upgrade_installer,
        });

        Ok(Settings {
            target,
            workspace,
            trees,
            services,
            supervisor_conf: self.services.supervisor_conf.clone(),
            permissions: PermissionPolicy {
                owner: self.permissions.owner.clone(),
                group: self.permissions.group.clone(),
                executable: self.permissions.executable.clone(),
            },
            provision,
            probe_timeout: Duration::from_secs(tm.probe_secs),
            connect_timeout: Duration::from_secs(tm.connect_secs),
            command_timeout: Duration::from_secs(tm.command_secs),
            transfer: self.transfer.strategy,
            parallel_sync: self.transfer.parallel,
        })
    }
}

impl Settings {
    /// Whether any remote path still needs `~` resolution.
    pub fn needs_remote_home(&self) -> bool {
        let mut paths = vec![
            self.workspace.path.as_str(),
            self.workspace.backup_root.as_str(),
            self.workspace.junk_dir.as_str(),
        ];
        paths.extend(self.trees.iter().map(|t| t.destination()));
        if let Some(env) = &self.provision {
            paths.push(env.env_dir.as_str());
            paths.push(env.manifest.as_str());
        }
        paths.iter().any(|p| p.starts_with('~'))
    }

    /// Rewrite every `~`-relative remote path against `home`.
    pub fn with_remote_home(mut self, home: &str) -> Self {
        let ws = &mut self.workspace;
        ws.path = expand_home(&ws.path, home);
        ws.backup_root = expand_home(&ws.backup_root, home);
        ws.junk_dir = expand_home(&ws.junk_dir, home);
        self.trees = self
            .trees
            .into_iter()
            .map(|t| {
                let dest = expand_home(t.destination(), home);
                t.with_destination(dest)
            })
            .collect();
        if let Some(env) = self.provision.as_mut() {
            env.env_dir = expand_home(&env.env_dir, home);
            env.manifest = expand_home(&env.manifest, home);
        }
        self
    }
}

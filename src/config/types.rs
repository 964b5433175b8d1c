//! Configuration type definitions

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::transfer::TransferMode;

use super::loader::{self, ConfigWarning};

/// Configuration loading or validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Connection details (`[target]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub key: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub sudo: bool,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            user: String::new(),
            key: String::new(),
            port: default_port(),
            sudo: false,
        }
    }
}

fn default_port() -> u16 {
    crate::domain::value_objects::DEFAULT_SSH_PORT
}

/// Remote workspace layout (`[workspace]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default)]
    pub path: String,

    /// Defaults to `<parent of path>/backups`
    #[serde(default)]
    pub backup_root: Option<String>,

    /// Defaults to the parent of `path`
    #[serde(default)]
    pub junk_dir: Option<String>,

    #[serde(default = "default_junk_patterns")]
    pub junk_patterns: Vec<String>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            backup_root: None,
            junk_dir: None,
            junk_patterns: default_junk_patterns(),
        }
    }
}

fn default_junk_patterns() -> Vec<String> {
    ["._*", ".DS_Store", "*.tar.gz", "*.zip", "*.sql", "*.dump"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// One tree to mirror (`[[sync]]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Label for logs; defaults to the source's file name
    #[serde(default)]
    pub name: Option<String>,

    /// Local path, relative to the configuration file's directory
    pub source: PathBuf,

    /// Remote path, relative to the workspace unless absolute
    pub destination: String,

    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default = "default_true")]
    pub delete: bool,
}

/// Supervisor-managed services (`[services]`)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServicesConfig {
    #[serde(default)]
    pub names: Vec<String>,

    /// Passed to `supervisorctl -c`
    #[serde(default)]
    pub supervisor_conf: Option<String>,
}

/// Ownership and executable bits (`[permissions]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionsConfig {
    #[serde(default)]
    pub owner: Option<String>,

    #[serde(default)]
    pub group: Option<String>,

    #[serde(default = "default_executable")]
    pub executable: Vec<String>,
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            owner: None,
            group: None,
            executable: default_executable(),
        }
    }
}

fn default_executable() -> Vec<String> {
    vec!["*.sh".to_string()]
}

/// Runtime environment (`[provision]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_env_dir")]
    pub env_dir: String,

    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    #[serde(default = "default_manifest")]
    pub manifest: String,

    #[serde(default = "default_true")]
    pub upgrade_installer: bool,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            env_dir: default_env_dir(),
            interpreter: default_interpreter(),
            manifest: default_manifest(),
            upgrade_installer: true,
        }
    }
}

fn default_env_dir() -> String {
    "venv".to_string()
}

fn default_interpreter() -> String {
    "python3".to_string()
}

fn default_manifest() -> String {
    "requirements.txt".to_string()
}

/// Time limits (`[timeouts]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    #[serde(default = "default_probe_secs")]
    pub probe_secs: u64,

    #[serde(default = "default_connect_secs")]
    pub connect_secs: u64,

    #[serde(default = "default_command_secs")]
    pub command_secs: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            probe_secs: default_probe_secs(),
            connect_secs: default_connect_secs(),
            command_secs: default_command_secs(),
        }
    }
}

fn default_probe_secs() -> u64 {
    5
}

fn default_connect_secs() -> u64 {
    10
}

fn default_command_secs() -> u64 {
    900
}

/// Transport selection (`[transfer]`)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TransferConfig {
    #[serde(default)]
    pub strategy: TransferMode,

    /// Mirror independent trees concurrently
    #[serde(default)]
    pub parallel: bool,
}

fn default_true() -> bool {
    true
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub target: TargetConfig,

    #[serde(default)]
    pub workspace: WorkspaceConfig,

    #[serde(default)]
    pub sync: Vec<SyncConfig>,

    #[serde(default)]
    pub services: ServicesConfig,

    #[serde(default)]
    pub permissions: PermissionsConfig,

    #[serde(default)]
    pub provision: ProvisionConfig,

    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    #[serde(default)]
    pub transfer: TransferConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_warnings(path).map(|(config, _)| config)
    }

    /// Load configuration and return non-fatal warnings (e.g. unknown keys).
    pub fn load_with_warnings(path: &Path) -> Result<(Self, Vec<ConfigWarning>), ConfigError> {
        loader::load_with_warnings(path)
    }

    /// Apply environment variable overrides (TREEMIRROR_* prefix)
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        loader::with_env_overrides(self)
    }
}

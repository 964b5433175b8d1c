//! Configuration module for treemirror
//!
//! Resolution order for the configuration file:
//! 1. `--config <PATH>`
//! 2. `TREEMIRROR_CONFIG`
//! 3. `./treemirror.toml`
//!
//! `TREEMIRROR_HOST`, `TREEMIRROR_USER`, `TREEMIRROR_KEY` and
//! `TREEMIRROR_TRANSPORT` override the file once, at load.

mod loader;
mod settings;
mod types;

pub use loader::{resolve_config_path, ConfigWarning, CONFIG_ENV, DEFAULT_CONFIG_FILE};
pub use settings::{EnvSpec, PermissionPolicy, Settings, WorkspaceLayout};
pub use types::{
    Config, ConfigError, PermissionsConfig, ProvisionConfig, ServicesConfig, SyncConfig,
    TargetConfig, TimeoutsConfig, TransferConfig, WorkspaceConfig,
};

use std::path::Path;

/// Load, override from the environment, and validate in one step.
pub fn load_settings(path: &Path) -> Result<(Settings, Vec<ConfigWarning>), ConfigError> {
    let (config, warnings) = Config::load_with_warnings(path)?;
    let config = config.with_env_overrides()?;
    let base_dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    let settings = config.resolve(&base_dir)?;
    Ok((settings, warnings))
}

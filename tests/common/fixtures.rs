//! Reusable settings and configuration content.

use std::fs;
use std::path::Path;
use std::time::Duration;

use treemirror::config::{PermissionPolicy, Settings, WorkspaceLayout};
use treemirror::domain::entities::{ServiceSet, SyncSpec};
use treemirror::domain::value_objects::{RemoteTarget, RunStamp};
use treemirror::infrastructure::TransferMode;

/// Stamp used by runs that need a predictable backup path
pub const STAMP: &str = "20240305-071502";

pub fn stamp() -> RunStamp {
    RunStamp::parse(STAMP).unwrap()
}

/// Settings for a host with two services and two trees under `root`.
///
/// Creates `root/backend` and `root/frontend` so the sources exist.
pub fn two_tree_settings(root: &Path) -> Settings {
    for dir in ["backend", "frontend"] {
        fs::create_dir_all(root.join(dir)).unwrap();
    }
    Settings {
        target: RemoteTarget::new("203.0.113.7", "deploy", "/home/op/.ssh/id_ed25519"),
        workspace: WorkspaceLayout {
            path: "/srv/app".to_string(),
            backup_root: "/srv/backups".to_string(),
            junk_dir: "/srv".to_string(),
            junk_patterns: vec![".DS_Store".to_string(), "*.tar.gz".to_string()],
        },
        trees: vec![
            SyncSpec::new(root.join("backend"), "/srv/app/backend"),
            SyncSpec::new(root.join("frontend"), "/srv/app/frontend"),
        ],
        services: ServiceSet::new(["api", "worker"]),
        supervisor_conf: None,
        permissions: PermissionPolicy {
            owner: Some("deploy".to_string()),
            group: Some("www-data".to_string()),
            executable: vec!["*.sh".to_string()],
        },
        provision: None,
        probe_timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(10),
        command_timeout: Duration::from_secs(900),
        transfer: TransferMode::Auto,
        parallel_sync: false,
    }
}

/// Minimal configuration file mirroring `backend/` into `/srv/app`.
pub const CONFIG_TOML: &str = r#"
[target]
host = "203.0.113.7"
user = "deploy"
key = "/home/op/.ssh/id_ed25519"

[workspace]
path = "/srv/app"

[[sync]]
source = "backend"
destination = "backend"
exclude = ["__pycache__/", "*.pyc"]

[services]
names = ["api"]

[transfer]
strategy = "rsync"
"#;

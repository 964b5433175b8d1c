//! Dry-run plan
//!
//! Renders the remote commands each stage would issue, without touching the
//! host. Paths still starting with `~` are shown unresolved.

use crate::application::backup::BackupManager;
use crate::application::permissions::{affected_roots, PermissionFixer};
use crate::application::probe::ConnectivityProbe;
use crate::application::provisioner::DependencyProvisioner;
use crate::application::services::ServiceController;
use crate::application::wiper::WorkspaceWiper;
use crate::config::Settings;
use crate::domain::entities::{BackupRecord, Stage};
use crate::domain::value_objects::RunStamp;

/// What one stage would do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStage {
    pub stage: Stage,
    /// Remote commands or scripts, or a description of local work
    pub steps: Vec<String>,
}

/// Build the plan for a run stamped `stamp` using `transport`.
pub fn describe_plan(settings: &Settings, stamp: &RunStamp, transport: &str) -> Vec<PlannedStage> {
    let target = &settings.target;
    let conf = settings.supervisor_conf.as_deref();
    let backup_path =
        BackupRecord::path_for(&settings.workspace.backup_root, &settings.workspace.path, stamp);

    Stage::ALL
        .iter()
        .map(|&stage| {
            let steps = match stage {
                Stage::Probe => {
                    let mut steps = vec![ConnectivityProbe::command()];
                    if settings.needs_remote_home() {
                        steps.push("echo $HOME".to_string());
                    }
                    steps
                }
                Stage::StopServices if settings.services.is_empty() => vec![],
                Stage::StopServices => vec![
                    ServiceController::stop_script(target, conf, &settings.services),
                    ServiceController::supervisorctl(target, conf, "status"),
                ],
                Stage::Backup => vec![
                    BackupManager::backup_script(target, &settings.workspace, &backup_path),
                    BackupManager::manifest_script(&backup_path),
                ],
                Stage::Wipe => vec![WorkspaceWiper::wipe_script(target, &settings.workspace)],
                Stage::Sync => settings
                    .trees
                    .iter()
                    .map(|tree| {
                        let mut line = format!(
                            "{} {} -> {}:{}",
                            transport,
                            tree.source().display(),
                            target.destination(),
                            tree.destination()
                        );
                        if !tree.exclude().is_empty() {
                            line.push_str(&format!(" (exclude {})", tree.exclude().patterns().join(", ")));
                        }
                        if !tree.delete_extraneous() {
                            line.push_str(" (keep extraneous)");
                        }
                        line
                    })
                    .collect(),
                Stage::Permissions => {
                    let roots = affected_roots(&settings.workspace.path, &settings.trees);
                    PermissionFixer::script(target, &settings.permissions, &roots)
                        .into_iter()
                        .collect()
                }
                Stage::Provision => settings
                    .provision
                    .iter()
                    .map(DependencyProvisioner::script)
                    .collect(),
                Stage::StartServices if settings.services.is_empty() => vec![],
                Stage::StartServices => vec![
                    ServiceController::start_script(target, conf, &settings.services),
                    ServiceController::supervisorctl(target, conf, "status"),
                ],
            };
            PlannedStage { stage, steps }
        })
        .collect()
}

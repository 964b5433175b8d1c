//! CONTRACT: a failed stage is the last stage that touches the host.

use std::sync::Arc;

use treemirror::config::EnvSpec;
use treemirror::domain::entities::{RunState, Stage};
use treemirror::domain::ports::CommandOutput;
use treemirror::StageError;

use crate::common::*;

#[test]
fn contract_stages_touch_the_host_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(ScriptedRemote::healthy());
    let transfer = Arc::new(RecordingTransfer::default());
    let events = Arc::new(EventLog::default());

    let report = orchestrator(&remote, &transfer, &events)
        .run_with_stamp(&two_tree_settings(dir.path()), stamp());

    assert!(report.is_success(), "{:?}", report.error);
    let order = [
        "echo treemirror-ok",
        "supervisorctl stop",
        "cp -a",
        "rm -rf",
        "chown -R",
        "supervisorctl start",
    ];
    let positions: Vec<usize> = order
        .iter()
        .map(|needle| {
            remote
                .position(needle)
                .unwrap_or_else(|| panic!("'{}' never ran; log: {:#?}", needle, remote.log()))
        })
        .collect();
    assert!(
        positions.windows(2).all(|w| w[0] < w[1]),
        "out of order: {:?}",
        positions
    );
    assert_eq!(transfer.calls(), vec!["/srv/app/backend", "/srv/app/frontend"]);
}

#[test]
fn contract_unreachable_host_gets_only_the_probe() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(ScriptedRemote::healthy().fail("treemirror-ok", refused));
    let transfer = Arc::new(RecordingTransfer::default());
    let events = Arc::new(EventLog::default());

    let report = orchestrator(&remote, &transfer, &events)
        .run_with_stamp(&two_tree_settings(dir.path()), stamp());

    assert_eq!(report.failed_stage(), Some(Stage::Probe));
    assert_eq!(report.exit_code(), 1);
    assert!(matches!(
        report.error.as_ref().map(|e| &e.reason),
        Some(StageError::Connectivity(_))
    ));
    assert_eq!(remote.log().len(), 1);
    assert!(transfer.calls().is_empty());
}

#[test]
fn contract_failed_backup_never_wipes() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(ScriptedRemote::healthy().reply(
        "cp -a",
        CommandOutput::new(1, "", "cp: cannot create directory: No space left on device"),
    ));
    let transfer = Arc::new(RecordingTransfer::default());
    let events = Arc::new(EventLog::default());

    let report = orchestrator(&remote, &transfer, &events)
        .run_with_stamp(&two_tree_settings(dir.path()), stamp());

    assert_eq!(report.failed_stage(), Some(Stage::Backup));
    assert!(!remote.saw("rm -rf"), "workspace wiped without a backup");
    assert!(transfer.calls().is_empty());
    assert!(!remote.saw("supervisorctl start"));
}

#[test]
fn contract_existing_backup_is_never_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(ScriptedRemote::healthy().reply("cp -a", CommandOutput::new(17, "", "")));
    let transfer = Arc::new(RecordingTransfer::default());
    let events = Arc::new(EventLog::default());

    let report = orchestrator(&remote, &transfer, &events)
        .run_with_stamp(&two_tree_settings(dir.path()), stamp());

    assert!(matches!(
        report.error.as_ref().map(|e| &e.reason),
        Some(StageError::BackupCollision(path)) if path == "/srv/backups/app-20240305-071502"
    ));
    assert!(!remote.saw("rm -rf"));
}

#[test]
fn contract_sync_failure_keeps_services_down() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(ScriptedRemote::healthy());
    let transfer = Arc::new(RecordingTransfer::failing_on("/srv/app/backend"));
    let events = Arc::new(EventLog::default());

    let report = orchestrator(&remote, &transfer, &events)
        .run_with_stamp(&two_tree_settings(dir.path()), stamp());

    assert_eq!(report.failed_stage(), Some(Stage::Sync));
    assert!(matches!(report.state, RunState::Aborted { stage: Stage::Sync, .. }));
    assert_eq!(transfer.calls(), vec!["/srv/app/backend"], "sequential sync stops early");
    assert!(report.error.as_ref().unwrap().to_string().contains("backend"));
    assert!(!remote.saw("chown"));
    assert!(!remote.saw("supervisorctl start"));
    // The backup taken before the wipe is what an operator restores from.
    assert!(report.backup.as_ref().and_then(|b| b.path()).is_some());
}

#[test]
fn contract_permission_failure_keeps_services_down() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(ScriptedRemote::healthy().reply(
        "chown -R",
        CommandOutput::new(1, "", "chown: invalid group: 'deploy:www-data'"),
    ));
    let transfer = Arc::new(RecordingTransfer::default());
    let events = Arc::new(EventLog::default());

    let report = orchestrator(&remote, &transfer, &events)
        .run_with_stamp(&two_tree_settings(dir.path()), stamp());

    assert_eq!(report.failed_stage(), Some(Stage::Permissions));
    assert_eq!(report.exit_code(), 1);
    let error = report.error.as_ref().unwrap();
    assert!(matches!(error.reason, StageError::Permission(_)));
    let message = error.to_string();
    assert!(message.contains("aborted at permissions"), "{}", message);
    assert!(message.contains("invalid group"), "{}", message);
    assert_eq!(transfer.calls().len(), 2);
    assert!(!remote.saw("pip install"));
    assert!(!remote.saw("supervisorctl start"));
}

#[test]
fn contract_provisioning_failure_keeps_services_down() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(ScriptedRemote::healthy().reply(
        "pip install",
        CommandOutput::new(1, "", "ERROR: No matching distribution found for flask==99"),
    ));
    let transfer = Arc::new(RecordingTransfer::default());
    let events = Arc::new(EventLog::default());
    let mut settings = two_tree_settings(dir.path());
    settings.provision = Some(EnvSpec {
        env_dir: "/srv/app/venv".to_string(),
        interpreter: "python3".to_string(),
        manifest: "/srv/app/requirements.txt".to_string(),
        upgrade_installer: true,
    });

    let report = orchestrator(&remote, &transfer, &events).run_with_stamp(&settings, stamp());

    assert_eq!(report.failed_stage(), Some(Stage::Provision));
    assert!(report
        .error
        .as_ref()
        .unwrap()
        .to_string()
        .contains("No matching distribution"));
    assert!(!remote.saw("supervisorctl start"));
}

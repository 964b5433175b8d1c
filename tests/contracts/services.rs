//! CONTRACT: stopping is best-effort, starting is not.

use std::sync::Arc;

use treemirror::domain::entities::{ServiceSet, Stage};
use treemirror::domain::ports::{CommandOutput, PipelineEvent};
use treemirror::StageError;

use crate::common::*;

#[test]
fn contract_stop_timeout_is_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(ScriptedRemote::healthy().fail("supervisorctl stop", timed_out));
    let transfer = Arc::new(RecordingTransfer::default());
    let events = Arc::new(EventLog::default());

    let report = orchestrator(&remote, &transfer, &events)
        .run_with_stamp(&two_tree_settings(dir.path()), stamp());

    assert!(report.is_success(), "{:?}", report.error);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("api (TIMEOUT)"));
    assert!(events.events().iter().any(|e| matches!(
        e,
        PipelineEvent::StageWarning {
            stage: Stage::StopServices,
            ..
        }
    )));
}

#[test]
fn contract_service_failing_after_start_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(ScriptedRemote::healthy().reply(
        "supervisorctl status",
        stdout("api      RUNNING   pid 812, uptime 0:00:03\nworker   FATAL     Exited too quickly\n"),
    ));
    let transfer = Arc::new(RecordingTransfer::default());
    let events = Arc::new(EventLog::default());

    let report = orchestrator(&remote, &transfer, &events)
        .run_with_stamp(&two_tree_settings(dir.path()), stamp());

    // `api` still running after stop is tolerated; `worker` FATAL after start is not.
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("api (RUNNING)"));
    assert_eq!(report.failed_stage(), Some(Stage::StartServices));
    match report.error.map(|e| e.reason) {
        Some(StageError::ServiceStart { failed }) => assert_eq!(failed, vec!["worker (FATAL)"]),
        other => panic!("expected ServiceStart, got {:?}", other),
    }
}

#[test]
fn contract_unknown_service_fails_the_start() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(ScriptedRemote::healthy().reply(
        "supervisorctl status",
        CommandOutput::new(
            4,
            "api      RUNNING   pid 812, uptime 0:00:03\nworker: ERROR (no such process)\n",
            "",
        ),
    ));
    let transfer = Arc::new(RecordingTransfer::default());
    let events = Arc::new(EventLog::default());

    let report = orchestrator(&remote, &transfer, &events)
        .run_with_stamp(&two_tree_settings(dir.path()), stamp());

    assert_eq!(report.failed_stage(), Some(Stage::StartServices));
    assert!(report.error.unwrap().to_string().contains("worker (MISSING)"));
}

#[test]
fn contract_no_services_means_no_supervisor_calls() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(ScriptedRemote::healthy());
    let transfer = Arc::new(RecordingTransfer::default());
    let events = Arc::new(EventLog::default());
    let mut settings = two_tree_settings(dir.path());
    settings.services = ServiceSet::default();

    let report = orchestrator(&remote, &transfer, &events).run_with_stamp(&settings, stamp());

    assert!(report.is_success(), "{:?}", report.error);
    assert!(!remote.saw("supervisorctl"));
}

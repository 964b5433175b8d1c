//! CONTRACT: every run gets its own backup, and a missing workspace is not an error.

use std::sync::Arc;

use chrono::Duration as ChronoDuration;

use treemirror::domain::ports::CommandOutput;
use treemirror::RunStamp;

use crate::common::*;

#[test]
fn contract_runs_get_distinct_backup_paths() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(ScriptedRemote::healthy());
    let transfer = Arc::new(RecordingTransfer::default());
    let events = Arc::new(EventLog::default());
    let orchestrator = orchestrator(&remote, &transfer, &events);
    let settings = two_tree_settings(dir.path());

    let first = stamp();
    let second = RunStamp::from_datetime(first.datetime() + ChronoDuration::seconds(1));
    let a = orchestrator.run_with_stamp(&settings, first);
    let b = orchestrator.run_with_stamp(&settings, second);

    let a = a.backup.as_ref().and_then(|r| r.path()).unwrap().to_string();
    let b = b.backup.as_ref().and_then(|r| r.path()).unwrap().to_string();
    assert_eq!(a, "/srv/backups/app-20240305-071502");
    assert_eq!(b, "/srv/backups/app-20240305-071503");
}

#[test]
fn contract_missing_workspace_continues_with_empty_backup() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(ScriptedRemote::healthy().reply("cp -a", stdout("absent\n")));
    let transfer = Arc::new(RecordingTransfer::default());
    let events = Arc::new(EventLog::default());

    let report = orchestrator(&remote, &transfer, &events)
        .run_with_stamp(&two_tree_settings(dir.path()), stamp());

    assert!(report.is_success(), "{:?}", report.error);
    let backup = report.backup.unwrap();
    assert!(backup.is_empty());
    assert_eq!(backup.path(), None);
    assert!(!remote.saw("du -sk"), "no manifest for a backup that was never taken");
}

#[test]
fn contract_manifest_failure_is_only_a_warning() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(
        ScriptedRemote::healthy()
            .reply("du -sk", CommandOutput::new(1, "", "du: cannot read directory")),
    );
    let transfer = Arc::new(RecordingTransfer::default());
    let events = Arc::new(EventLog::default());

    let report = orchestrator(&remote, &transfer, &events)
        .run_with_stamp(&two_tree_settings(dir.path()), stamp());

    assert!(report.is_success(), "{:?}", report.error);
    assert!(report
        .warnings
        .iter()
        .any(|w| w.starts_with("backup manifest unavailable")));
    assert!(report.backup.unwrap().manifest().is_none());
}

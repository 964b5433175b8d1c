//! Scenario: an operator mirrors a backend tree onto a host running one service.

use serde_json::Value;

use crate::common::TestEnv;

#[test]
fn scenario_full_run_mirrors_and_restarts() {
    let env = TestEnv::new();

    let result = env.run(&["--ascii"]);

    assert!(result.is_success(), "{}", result.combined_output());
    assert!(result.stdout.contains("[OK] Mirror complete"), "{}", result.stdout);
    assert!(result.stdout.contains("backup     /srv/backups/app-"));

    let log = env.remote_log();
    let order = [
        "echo treemirror-ok",
        "supervisorctl stop 'api'",
        "cp -a",
        "rm -rf '/srv/app'",
        "rsync ",
        "supervisorctl start 'api'",
    ];
    let mut last = 0;
    for needle in order {
        let pos = log[last..]
            .find(needle)
            .unwrap_or_else(|| panic!("'{}' missing or out of order in:\n{}", needle, log));
        last += pos;
    }
    assert!(log.contains("--exclude=*.pyc"), "{}", log);
    assert!(log.contains("deploy@203.0.113.7:/srv/app/backend"), "{}", log);
}

#[test]
fn scenario_json_run_streams_events_then_report() {
    let env = TestEnv::new();

    let result = env.run(&["run", "--json"]);

    assert!(result.is_success(), "{}", result.combined_output());
    let lines: Vec<Value> = result
        .stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap_or_else(|e| panic!("{}: {}", e, l)))
        .collect();
    assert!(lines.len() > 2, "{}", result.stdout);

    let report = lines.last().unwrap();
    assert_eq!(report["event"], "report");
    assert_eq!(report["success"], true);
    assert_eq!(report["transport"], "rsync");
    assert_eq!(report["stages"].as_array().map(|s| s.len()), Some(8));
    assert!(report["backup"].to_string().contains("/srv/backups/app-"));
}

#[test]
fn scenario_unreachable_host_changes_nothing() {
    let env = TestEnv::new().host_down();

    let result = env.run(&["--ascii"]);

    assert_eq!(result.exit_code, 1, "{}", result.combined_output());
    assert!(result.stdout.contains("[FAIL] Mirror aborted"), "{}", result.stdout);
    assert!(result.stdout.contains("remote workspace was not modified"));
    assert!(result.stderr.contains("aborted at probe"), "{}", result.stderr);

    let log = env.remote_log();
    assert!(log.contains("echo treemirror-ok"));
    assert!(!log.contains("supervisorctl"), "{}", log);
    assert!(!log.contains("rsync"), "{}", log);
}

#[test]
fn scenario_stalled_rsync_is_killed_at_the_command_timeout() {
    let config = format!("{}\n[timeouts]\ncommand_secs = 1\n", crate::common::CONFIG_TOML);
    let env = TestEnv::with_config(&config).rsync_hangs();

    let start = std::time::Instant::now();
    let result = env.run(&["--ascii"]);

    assert!(start.elapsed() < std::time::Duration::from_secs(20));
    assert_eq!(result.exit_code, 1, "{}", result.combined_output());
    assert!(result.stderr.contains("aborted at sync"), "{}", result.stderr);
    assert!(result.stderr.contains("timed out after 1s"), "{}", result.stderr);
    assert!(!env.remote_log().contains("supervisorctl start"));
}

//! Scenario: read-only commands an operator runs before or after a mirror.

use serde_json::Value;

use crate::common::TestEnv;

#[test]
fn scenario_check_reports_reachability() {
    let env = TestEnv::new();
    let result = env.run(&["check", "--ascii"]);
    assert!(result.is_success(), "{}", result.combined_output());
    assert!(result.stdout.contains("[OK] deploy@203.0.113.7 reachable"));

    let down = TestEnv::new().host_down();
    let result = down.run(&["check", "--json"]);
    assert_eq!(result.exit_code, 1);
    let json: Value = serde_json::from_str(result.stdout.trim()).unwrap();
    assert_eq!(json["reachable"], false);
}

#[test]
fn scenario_status_lists_configured_services() {
    let env = TestEnv::new();
    let result = env.run(&["status", "--json"]);
    assert!(result.is_success(), "{}", result.combined_output());

    let json: Value = serde_json::from_str(result.stdout.trim()).unwrap();
    assert_eq!(json["services"][0]["name"], "api");
    assert_eq!(json["services"][0]["state"], "RUNNING");
    assert_eq!(json["services"][0]["running"], true);
}

#[test]
fn scenario_plan_never_contacts_the_host() {
    let env = TestEnv::new();
    let result = env.run(&["plan", "--ascii"]);

    assert!(result.is_success(), "{}", result.combined_output());
    assert!(result.stdout.contains("transport rsync"), "{}", result.stdout);
    assert!(result.stdout.contains("[1/8] probe"));
    assert!(result.stdout.contains("supervisorctl stop 'api'"));
    assert!(result.stdout.contains("/srv/backups/app-"));
    assert!(env.remote_log().is_empty(), "plan ran: {}", env.remote_log());
}

#[test]
fn scenario_unknown_keys_warn_but_do_not_block() {
    let config = format!("{}\n[timeouts]\nprobe_sec = 3\n", crate::common::CONFIG_TOML);
    let env = TestEnv::with_config(&config);

    let result = env.run(&["plan"]);

    assert!(result.is_success(), "{}", result.combined_output());
    assert!(result.stderr.contains("unknown key"), "{}", result.stderr);
    assert!(result.stderr.contains("probe_sec"), "{}", result.stderr);
}

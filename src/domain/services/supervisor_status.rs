//! Supervisor status parsing
//!
//! Turns `supervisorctl status` output into per-service states for a
//! [`ServiceSet`]. Group members (`group:process`) are folded into their
//! group's name.

use std::collections::BTreeMap;

use crate::domain::entities::{ServiceSet, ServiceState};

/// Parse raw status lines into `process name -> state`.
pub fn parse_status_lines(output: &str) -> BTreeMap<String, ServiceState> {
    let mut states = BTreeMap::new();
    for line in output.lines() {
        let mut parts = line.split_whitespace();
        let (name, state) = match (parts.next(), parts.next()) {
            (Some(name), Some(state)) => (name, state),
            _ => continue,
        };

        // `api: ERROR (no such process)`
        if state == "ERROR" {
            if line.contains("no such process") {
                states.insert(name.trim_end_matches(':').to_string(), ServiceState::Missing);
            }
            continue;
        }

        states.insert(name.to_string(), ServiceState::parse(state));
    }
    states
}

/// Resolve the state of every service in `set`, in set order.
///
/// A service whose processes disagree (some running, some down) is reported
/// as `Unknown("MIXED")` so it satisfies neither the stopped nor the running
/// check.
pub fn states_for(set: &ServiceSet, output: &str) -> Vec<(String, ServiceState)> {
    let parsed = parse_status_lines(output);
    set.iter()
        .map(|name| {
            let group_prefix = format!("{}:", name);
            let members: Vec<&ServiceState> = parsed
                .iter()
                .filter(|(process, _)| *process == name || process.starts_with(&group_prefix))
                .map(|(_, state)| state)
                .collect();
            (name.to_string(), aggregate(&members))
        })
        .collect()
}

fn aggregate(members: &[&ServiceState]) -> ServiceState {
    if members.is_empty() {
        return ServiceState::Missing;
    }
    if members.iter().all(|s| s.is_running()) {
        return ServiceState::Running;
    }
    if members.iter().all(|s| s.is_down()) {
        return members[0].clone();
    }
    members
        .iter()
        .find(|s| !s.is_running() && !s.is_down())
        .map(|s| (*s).clone())
        .unwrap_or_else(|| ServiceState::Unknown("MIXED".to_string()))
}

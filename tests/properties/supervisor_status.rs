//! Property tests for supervisor status parsing.

use proptest::prelude::*;

use treemirror::domain::entities::{ServiceSet, ServiceState};
use treemirror::domain::services::{parse_status_lines, states_for};

fn state_word() -> impl Strategy<Value = &'static str> {
    proptest::sample::select(vec![
        "RUNNING", "STARTING", "STOPPING", "STOPPED", "EXITED", "BACKOFF", "FATAL",
    ])
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: parsing arbitrary supervisorctl output never panics.
    #[test]
    fn property_parse_never_panics(output in "(?s).{0,512}") {
        let _ = parse_status_lines(&output);
    }

    /// PROPERTY: every configured service gets exactly one state, in order,
    /// and services absent from the output are reported missing.
    #[test]
    fn property_every_service_gets_a_state(
        listed in proptest::collection::vec(("[a-z]{1,6}", state_word()), 0..6),
        extra in "[A-Z]{1,6}",
    ) {
        let output: String = listed
            .iter()
            .map(|(name, state)| format!("{:<12} {:<10} pid 1, uptime 0:00:01\n", name, state))
            .collect();
        let mut names: Vec<String> = listed.iter().map(|(n, _)| n.clone()).collect();
        names.push(extra.clone());
        let set = ServiceSet::new(names);

        let states = states_for(&set, &output);

        let got: Vec<&str> = states.iter().map(|(n, _)| n.as_str()).collect();
        let want: Vec<&str> = set.iter().collect();
        prop_assert_eq!(got, want);
        let last = states.last().map(|(_, s)| s.clone());
        prop_assert_eq!(last, Some(ServiceState::Missing));
    }
}

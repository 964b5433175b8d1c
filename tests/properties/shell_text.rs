//! Property tests for remote shell text helpers.

use proptest::prelude::*;

use treemirror::domain::services::{expand_home, remote_join, shell_quote};

/// Undo POSIX single quoting as a shell would.
fn unquote(quoted: &str) -> Option<String> {
    let mut out = String::new();
    let mut rest = quoted;
    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix("\\'") {
            out.push('\'');
            rest = tail;
            continue;
        }
        let tail = rest.strip_prefix('\'')?;
        let end = tail.find('\'')?;
        out.push_str(&tail[..end]);
        rest = &tail[end + 1..];
    }
    Some(out)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: quoting any text yields exactly that text back in the shell.
    #[test]
    fn property_shell_quote_is_lossless(s in "(?s).{0,64}") {
        prop_assert_eq!(unquote(&shell_quote(&s)), Some(s));
    }

    /// PROPERTY: `~/x` expands below the home directory, other paths are untouched.
    #[test]
    fn property_expand_home_only_touches_tilde(
        rest in "[a-z0-9_/.-]{0,32}",
        home in "/[a-z]{1,8}(/[a-z]{1,8})?",
    ) {
        let tilde = format!("~/{}", rest);
        prop_assert_eq!(expand_home(&tilde, &home), format!("{}/{}", home, rest));
        let absolute = format!("/{}", rest);
        prop_assert_eq!(expand_home(&absolute, &home), absolute.clone());
    }

    /// PROPERTY: relative destinations always land inside the workspace.
    #[test]
    fn property_remote_join_stays_below_base(
        rel in "[a-z]{1,8}(/[a-z]{1,8}){0,3}",
    ) {
        let joined = remote_join("/srv/app", &rel);
        prop_assert!(joined.starts_with("/srv/app/"), "{}", joined);
    }
}

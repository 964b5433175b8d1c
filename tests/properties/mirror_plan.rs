//! Property tests for mirror planning and exclusion.

use std::collections::BTreeSet;
use std::path::PathBuf;

use proptest::prelude::*;

use treemirror::domain::services::{MirrorPlan, TreeListing};
use treemirror::domain::value_objects::ExcludePatterns;

fn rel_path() -> impl Strategy<Value = PathBuf> {
    let segment = proptest::string::string_regex("[a-z]{1,4}(\\.(py|pyc|log))?").unwrap();
    proptest::collection::vec(segment, 1..=3).prop_map(|s| PathBuf::from(s.join("/")))
}

fn listing() -> impl Strategy<Value = TreeListing> {
    (
        proptest::collection::btree_set(rel_path(), 0..12),
        proptest::collection::btree_set(rel_path(), 0..6),
    )
        .prop_map(|(files, dirs)| TreeListing {
            dirs: dirs.difference(&files).cloned().collect(),
            files,
        })
}

fn excludes() -> impl Strategy<Value = ExcludePatterns> {
    proptest::sample::subsequence(vec!["*.pyc", "*.log", "__pycache__/", "a*", "tmp/"], 0..=3)
        .prop_map(|patterns| ExcludePatterns::new(&patterns).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: an excluded path is never copied and never deleted.
    #[test]
    fn property_exclusion_is_symmetric(
        local in listing(),
        remote in listing(),
        exclude in excludes(),
    ) {
        let plan = MirrorPlan::compute(&local, &remote, &exclude, true);
        for path in plan.copy_files.iter().chain(&plan.delete_files) {
            prop_assert!(!exclude.is_excluded(path, false), "{:?} touched", path);
        }
        for path in plan.copy_dirs.iter().chain(&plan.delete_dirs) {
            prop_assert!(!exclude.is_excluded(path, true), "{:?} touched", path);
        }
    }

    /// PROPERTY: without deletion the remote side is never pruned.
    #[test]
    fn property_keep_extraneous_deletes_nothing(
        local in listing(),
        remote in listing(),
        exclude in excludes(),
    ) {
        let plan = MirrorPlan::compute(&local, &remote, &exclude, false);
        prop_assert!(plan.delete_files.is_empty());
        prop_assert!(plan.delete_dirs.is_empty());
    }

    /// PROPERTY: deletions only name remote paths the source lacks.
    #[test]
    fn property_deletes_only_extraneous_paths(
        local in listing(),
        remote in listing(),
    ) {
        let plan = MirrorPlan::compute(&local, &remote, &ExcludePatterns::empty(), true);
        let deleted: BTreeSet<_> = plan.delete_files.iter().collect();
        for path in &deleted {
            prop_assert!(remote.files.contains(*path));
            prop_assert!(!local.files.contains(*path));
        }
        let expected = remote.files.difference(&local.files).count();
        prop_assert_eq!(deleted.len(), expected);
    }

    /// PROPERTY: directories are removed deepest first.
    #[test]
    fn property_delete_dirs_deepest_first(
        remote in listing(),
    ) {
        let plan = MirrorPlan::compute(&TreeListing::default(), &remote, &ExcludePatterns::empty(), true);
        let depths: Vec<usize> = plan.delete_dirs.iter().map(|d| d.components().count()).collect();
        prop_assert!(depths.windows(2).all(|w| w[0] >= w[1]), "{:?}", plan.delete_dirs);
    }
}

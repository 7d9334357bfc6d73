//! Property-based tests for ignore matching and key layout

use dirsnap::ignore::IgnoreList;
use dirsnap::tree::path::{join_key, KeyLayout};
use proptest::prelude::*;
use std::path::Path;

fn segments() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-z.]{1,5}".prop_filter("not a dot segment", |s| s != "." && s != ".."), 1..5)
}

/// An entry ignores every path it prefixes, however written
#[test]
fn test_entry_ignores_its_subtree() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(segments(), segments()), |(entry, rest)| {
            let pattern = format!("./{}/", join_key(&entry));
            let ignore = IgnoreList::new(&[pattern]);

            let mut path = entry.clone();
            prop_assert!(ignore.is_ignored(&path));
            path.extend(rest);
            prop_assert!(ignore.is_ignored(&path));
            Ok(())
        })
        .unwrap();
}

/// Paths that diverge from the entry in any segment are kept
#[test]
fn test_diverging_paths_are_kept() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(segments(), segments()), |(entry, path)| {
            prop_assume!(!path.starts_with(&entry));
            let ignore = IgnoreList::new(&[join_key(&entry)]);
            prop_assert!(!ignore.is_ignored(&path));
            Ok(())
        })
        .unwrap();
}

/// Root keys strip back to the traversal-relative segments
#[test]
fn test_layout_keys_strip_back() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(segments(), segments(), 0usize..6), |(root, relative, cutoff)| {
            let root_path = Path::new("/").join(join_key(&root));
            prop_assume!(cutoff <= root.len());
            let layout = KeyLayout::new(&root_path, Some(cutoff)).unwrap();

            let key = layout.root_key(&relative);
            let stripped: Vec<String> = layout
                .strip_prefix(&key)
                .unwrap()
                .into_iter()
                .map(str::to_string)
                .collect();
            prop_assert_eq!(stripped, relative);
            Ok(())
        })
        .unwrap();
}

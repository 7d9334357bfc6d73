//! Property-based tests for digest determinism

use dirsnap::manifest::digest::{compute_digest, ParsedSnapshot, SealedManifest};
use dirsnap::manifest::{FileRecord, Manifest};
use dirsnap::types::Identity;
use proptest::prelude::*;
use std::path::Path;

fn record_strategy() -> impl Strategy<Value = FileRecord> {
    let identity = prop_oneof![
        Just(None),
        any::<u64>().prop_map(|ms| Some(Identity::Millis(ms))),
        "[0-9a-f]{40}".prop_map(|hex| Some(Identity::Hash(hex))),
    ];
    (identity, proptest::option::of(1u64..=4_102_444_800_000))
        .prop_map(|(identity, created_at)| FileRecord::new(identity, created_at))
}

fn entries_strategy() -> impl Strategy<Value = Vec<(String, FileRecord)>> {
    proptest::collection::vec(("[a-z]{1,6}(/[a-z]{1,6}){0,2}\\.txt", record_strategy()), 0..24)
}

/// The digest depends on the set of records, never on insertion order
#[test]
fn test_digest_insertion_order_independent() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&entries_strategy(), |entries| {
            let forward: Manifest = entries.iter().cloned().collect();
            let backward: Manifest = entries.iter().rev().cloned().collect();

            // Later duplicates win in `forward`, earlier ones in `backward`;
            // compare only when keys are unique
            let unique: std::collections::BTreeSet<&String> =
                entries.iter().map(|(k, _)| k).collect();
            prop_assume!(unique.len() == entries.len());

            prop_assert_eq!(
                compute_digest(&forward).unwrap(),
                compute_digest(&backward).unwrap()
            );
            Ok(())
        })
        .unwrap();
}

/// Rendering and re-reading a sealed manifest keeps its digest valid
#[test]
fn test_sealed_manifest_verifies_after_reading() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(entries_strategy(), 0usize..5), |(entries, indent)| {
            let manifest: Manifest = entries.into_iter().collect();
            let sealed = SealedManifest::seal(manifest).unwrap();
            let bytes = sealed.render(indent).unwrap();

            let parsed = ParsedSnapshot::parse(Path::new("manifest.json"), &bytes).unwrap();
            prop_assert_eq!(parsed.recorded_digest.as_deref(), Some(sealed.digest()));
            prop_assert_eq!(parsed.computed_digest().unwrap(), sealed.digest());
            Ok(())
        })
        .unwrap();
}

/// Changing any single record changes the digest
#[test]
fn test_any_record_change_changes_digest() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(entries_strategy(), any::<prop::sample::Index>()),
            |(entries, index)| {
                let mut manifest: Manifest = entries.into_iter().collect();
                prop_assume!(!manifest.is_empty());
                let before = compute_digest(&manifest).unwrap();

                let key = manifest.keys().nth(index.index(manifest.len())).unwrap().to_string();
                let record = manifest.get_mut(&key).unwrap();
                record.created_at = Some(record.created_at.map_or(1, |ms| ms + 1));

                prop_assert_ne!(before, compute_digest(&manifest).unwrap());
                Ok(())
            },
        )
        .unwrap();
}

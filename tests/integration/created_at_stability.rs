//! Integration tests for createdAt carry-over and deletion

use super::test_utils::{content_config, keys, run, snapshot_in, write_file};
use dirsnap::config::SnapshotConfig;
use dirsnap::types::Identity;
use std::fs;
use tempfile::TempDir;

/// A previous createdAt survives while the identity is refreshed
#[tokio::test]
async fn test_previous_created_at_is_kept() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "a.txt", "a");
    fs::write(
        root.join("manifest.json"),
        r#"{"a.txt": {"createdAt": 1000, "identity": 1}, "digest": "old"}"#,
    )
    .unwrap();

    let report = run(SnapshotConfig::for_root(root)).await;

    let record = report
        .root_snapshot()
        .unwrap()
        .sealed
        .manifest()
        .get("a.txt")
        .unwrap()
        .clone();
    assert_eq!(record.created_at, Some(1000));
    assert!(matches!(record.identity, Some(Identity::Millis(ms)) if ms > 1));

    let persisted = snapshot_in(root).await;
    assert_eq!(persisted.manifest.get("a.txt").unwrap().created_at, Some(1000));
}

/// createdAt stays fixed across content changes
#[tokio::test]
async fn test_created_at_stable_across_edits() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "notes/a.txt", "first");

    run(content_config(root)).await;
    let first = snapshot_in(&root.join("notes")).await;
    let first_record = first.manifest.get("a.txt").unwrap().clone();

    write_file(root, "notes/a.txt", "second");
    run(content_config(root)).await;
    let second = snapshot_in(&root.join("notes")).await;
    let second_record = second.manifest.get("a.txt").unwrap();

    assert_eq!(second_record.created_at, first_record.created_at);
    assert_ne!(second_record.identity, first_record.identity);
}

/// Deleted files disappear from every view on the next run
#[tokio::test]
async fn test_deleted_file_disappears() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "docs/keep.md", "keep");
    write_file(root, "docs/drop.md", "drop");

    run(content_config(root)).await;
    assert_eq!(keys(&snapshot_in(root).await), vec!["docs/drop.md", "docs/keep.md"]);

    fs::remove_file(root.join("docs/drop.md")).unwrap();
    run(content_config(root)).await;

    assert_eq!(keys(&snapshot_in(root).await), vec!["docs/keep.md"]);
    assert_eq!(keys(&snapshot_in(&root.join("docs")).await), vec!["keep.md"]);
}

/// A malformed previous snapshot is replaced, not fatal
#[tokio::test]
async fn test_malformed_previous_snapshot_is_replaced() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "a.txt", "a");
    fs::write(root.join("manifest.json"), "[not, a, manifest").unwrap();

    let report = run(content_config(root)).await;

    assert!(report.failures.is_empty());
    let persisted = snapshot_in(root).await;
    assert!(persisted.manifest.get("a.txt").unwrap().created_at.unwrap() > 0);
}

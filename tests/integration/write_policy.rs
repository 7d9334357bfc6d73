//! Integration tests for the write policy and atomic writes

use super::test_utils::{content_config, run, write_file};
use dirsnap::config::SnapshotConfig;
use dirsnap::manifest::writer::WritePolicy;
use std::fs;
use tempfile::TempDir;

/// `if-exists` leaves absent targets alone and refreshes existing ones
#[tokio::test]
async fn test_if_exists_only_refreshes_existing_targets() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "tracked/a.txt", "a");
    write_file(root, "untracked/b.txt", "b");
    fs::write(root.join("tracked/manifest.json"), "{}").unwrap();

    let report = run(SnapshotConfig {
        write_policy: WritePolicy::IfExists,
        ..content_config(root)
    })
    .await;

    assert!(!root.join("manifest.json").exists());
    assert!(!root.join("untracked/manifest.json").exists());
    let refreshed = fs::read_to_string(root.join("tracked/manifest.json")).unwrap();
    assert!(refreshed.contains("\"a.txt\""));
    assert!(refreshed.contains("\"digest\""));
    assert_eq!(report.written.len(), 1);
    assert_eq!(report.skipped.len(), 2);
}

/// `always` creates every target
#[tokio::test]
async fn test_always_creates_targets() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "x/y/z.txt", "z");

    let report = run(content_config(root)).await;

    assert_eq!(report.written.len(), 3);
    assert!(report.skipped.is_empty());
    for dir in ["", "x", "x/y"] {
        assert!(root.join(dir).join("manifest.json").is_file());
    }
}

/// Temporary files never survive a run
#[tokio::test]
async fn test_no_temporary_files_left_behind() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "a/b.txt", "b");

    run(content_config(root)).await;

    for dir in ["", "a"] {
        assert!(!root.join(dir).join(".manifest.json.tmp").exists());
    }
}

/// Custom target name and compact output
#[tokio::test]
async fn test_custom_target_and_compact_indent() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "a.txt", "a");

    run(SnapshotConfig {
        target_name: "snapshot.json".to_string(),
        indent: 0,
        ..content_config(root)
    })
    .await;

    let text = fs::read_to_string(root.join("snapshot.json")).unwrap();
    assert!(!text.contains('\n'));
    assert!(text.starts_with("{\"a.txt\":{\"createdAt\":"));
    assert!(!root.join("manifest.json").exists());
}

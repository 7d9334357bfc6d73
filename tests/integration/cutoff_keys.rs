//! Integration tests for cutoff-shaped root keys

use super::test_utils::{content_config, keys, run, snapshot_in, write_file};
use dirsnap::config::SnapshotConfig;
use dirsnap::engine::SnapshotEngine;
use dirsnap::error::SnapshotError;
use dirsnap::tree::path::root_segments;
use tempfile::TempDir;

/// The default cutoff strips the whole root
#[tokio::test]
async fn test_default_keys_are_relative_to_root() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("site");
    write_file(&root, "pages/index.html", "<html/>");

    let report = run(content_config(&root)).await;
    assert_eq!(
        report.root_manifest.manifest().keys().collect::<Vec<_>>(),
        vec!["pages/index.html"]
    );
}

/// Keeping the last root segment prefixes root keys with it; subdirectory
/// views stay relative to their own directory
#[tokio::test]
async fn test_cutoff_keeps_trailing_root_segments() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("site");
    write_file(&root, "pages/index.html", "<html/>");
    let cutoff = root_segments(&root).len() - 1;

    run(SnapshotConfig {
        cutoff: Some(cutoff),
        ..content_config(&root)
    })
    .await;

    assert_eq!(keys(&snapshot_in(&root).await), vec!["site/pages/index.html"]);
    assert_eq!(keys(&snapshot_in(&root.join("pages")).await), vec!["index.html"]);
}

/// A cutoff beyond the root's segments fails the whole run
#[tokio::test]
async fn test_cutoff_beyond_root_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().to_path_buf();
    write_file(&root, "a.txt", "a");
    let cutoff = root_segments(&root).len() + 1;

    let engine = SnapshotEngine::new(SnapshotConfig {
        cutoff: Some(cutoff),
        ..content_config(&root)
    })
    .unwrap();

    assert!(matches!(
        engine.run().await,
        Err(SnapshotError::InvalidConfig(_))
    ));
    assert!(!root.join("manifest.json").exists());
}

//! Integration tests for ignore rules and the extension filter

use super::test_utils::{content_config, keys, run, snapshot_in, write_file};
use dirsnap::config::SnapshotConfig;
use tempfile::TempDir;

/// `.git` contents never reach any manifest
#[tokio::test]
async fn test_git_directory_is_ignored() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, ".git/HEAD", "ref: refs/heads/main");
    write_file(root, ".git/objects/ab/cdef", "blob");
    write_file(root, ".github/workflows/ci.yml", "on: push");
    write_file(root, "src/main.rs", "fn main() {}");

    let report = run(content_config(root)).await;

    for written in &report.written {
        for key in written.sealed.manifest().keys() {
            assert!(!key.starts_with(".git/"), "{} leaked into {}", key, written.directory);
        }
    }
    assert!(!root.join(".git/manifest.json").exists());
    assert_eq!(
        keys(&snapshot_in(root).await),
        vec![".github/workflows/ci.yml", "src/main.rs"]
    );
}

/// Nested entries match only at their position relative to the root
#[tokio::test]
async fn test_nested_ignore_entry_is_segment_aligned() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "web/node_modules/pkg/index.js", "x");
    write_file(root, "node_modules/pkg/index.js", "x");
    write_file(root, "build/out.js", "x");
    write_file(root, "web/build/out.js", "x");

    run(SnapshotConfig {
        ignore: vec!["./build/".to_string(), "web/node_modules".to_string()],
        ..content_config(root)
    })
    .await;

    assert_eq!(
        keys(&snapshot_in(root).await),
        vec!["node_modules/pkg/index.js", "web/build/out.js"]
    );
}

/// An extension filter keeps only matching files
#[tokio::test]
async fn test_extension_filter() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "a.txt", "a");
    write_file(root, "b.json", "{}");

    let report = run(SnapshotConfig {
        extension: Some(".json".to_string()),
        ..content_config(root)
    })
    .await;

    assert_eq!(
        report.root_manifest.manifest().keys().collect::<Vec<_>>(),
        vec!["b.json"]
    );
    // The snapshot itself ends in .json but is never recorded
    let second = run(SnapshotConfig {
        extension: Some(".json".to_string()),
        ..content_config(root)
    })
    .await;
    assert_eq!(second.files(), 1);
}

/// Files named `digest` are kept out of the view where they would collide
#[tokio::test]
async fn test_file_named_digest_is_left_out_of_its_view() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "sub/digest", "d");

    run(content_config(root)).await;

    assert_eq!(keys(&snapshot_in(root).await), vec!["sub/digest"]);
    assert!(snapshot_in(&root.join("sub")).await.manifest.is_empty());
}

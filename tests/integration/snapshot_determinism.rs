//! Integration tests for run-to-run determinism

use super::test_utils::{content_config, run, snapshot_in, write_file};
use dirsnap::engine::SnapshotEngine;
use dirsnap::manifest::digest::compute_digest;
use std::fs;
use tempfile::TempDir;

fn populate(root: &std::path::Path) {
    write_file(root, "README.md", "readme");
    write_file(root, "src/lib.rs", "pub fn lib() {}");
    write_file(root, "src/bin/main.rs", "fn main() {}");
    write_file(root, "assets/logo.svg", "<svg/>");
}

/// Two runs without a previous snapshot produce identical digests
#[tokio::test]
async fn test_runs_without_previous_snapshot_agree() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    populate(root);

    let first = run(content_config(root)).await;
    let first_digest = first.root_digest().unwrap().to_string();

    for dir in ["", "src", "src/bin", "assets"] {
        fs::remove_file(root.join(dir).join("manifest.json")).unwrap();
    }
    let second = run(content_config(root)).await;

    assert_eq!(second.root_digest().unwrap(), first_digest);
    assert_eq!(first.written.len(), second.written.len());
    for (a, b) in first.written.iter().zip(second.written.iter()) {
        assert_eq!(a.sealed.digest(), b.sealed.digest(), "{}", a.directory);
    }
}

/// Computing twice yields the same root manifest
#[tokio::test]
async fn test_compute_is_repeatable() {
    let temp_dir = TempDir::new().unwrap();
    populate(temp_dir.path());
    let engine = SnapshotEngine::new(content_config(temp_dir.path())).unwrap();

    let a = engine.compute().await.unwrap();
    let b = engine.compute().await.unwrap();

    assert_eq!(a.root_manifest, b.root_manifest);
    assert_eq!(
        compute_digest(a.root_manifest.manifest()).unwrap(),
        compute_digest(b.root_manifest.manifest()).unwrap()
    );
}

/// Every directory gets a view of its own descendants with stripped keys
#[tokio::test]
async fn test_views_are_rooted_at_their_directory() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    populate(root);

    run(content_config(root)).await;

    let root_view = snapshot_in(root).await;
    assert_eq!(root_view.manifest.len(), 4);
    assert!(root_view.manifest.contains_key("src/bin/main.rs"));

    let src = snapshot_in(&root.join("src")).await;
    let src_keys: Vec<&str> = src.manifest.keys().collect();
    assert_eq!(src_keys, vec!["bin/main.rs", "lib.rs"]);

    let bin = snapshot_in(&root.join("src/bin")).await;
    assert_eq!(bin.manifest.keys().collect::<Vec<_>>(), vec!["main.rs"]);

    // Records are shared between views
    assert_eq!(
        root_view.manifest.get("src/bin/main.rs"),
        bin.manifest.get("main.rs")
    );
}

/// A second run over an unchanged tree rewrites byte-identical files
#[tokio::test]
async fn test_unchanged_tree_rewrites_identical_bytes() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    populate(root);

    run(content_config(root)).await;
    let before = fs::read(root.join("src/manifest.json")).unwrap();
    run(content_config(root)).await;
    let after = fs::read(root.join("src/manifest.json")).unwrap();

    assert_eq!(before, after);
}

/// A link beside a real directory never changes the keys between runs
#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_directory_link_keys_are_stable() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_file(root, "y/z/file.txt", "payload");
    write_file(root, "x/other.txt", "other");
    std::os::unix::fs::symlink(root.join("y/z"), root.join("x/l1")).unwrap();
    let engine = SnapshotEngine::new(content_config(root)).unwrap();

    let first = engine.compute().await.unwrap();
    let expected: Vec<String> = first
        .root_manifest
        .manifest()
        .keys()
        .map(str::to_string)
        .collect();
    assert_eq!(expected, vec!["x/other.txt", "y/z/file.txt"]);

    for _ in 0..50 {
        let again = engine.compute().await.unwrap();
        assert_eq!(again.root_manifest, first.root_manifest);
    }

    let first_run = run(content_config(root)).await;
    let second_run = run(content_config(root)).await;
    assert_eq!(first_run.root_digest(), second_run.root_digest());
    assert!(first_run.walk_errors.is_empty());
}

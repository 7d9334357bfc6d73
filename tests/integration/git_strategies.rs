//! Integration tests for the version-control strategies

use super::test_utils::{run, snapshot_in, write_file};
use dirsnap::config::SnapshotConfig;
use dirsnap::error::FingerprintError;
use dirsnap::fingerprint::Strategy;
use dirsnap::types::Identity;
use git2::{Repository, Signature};
use std::path::Path;
use tempfile::TempDir;

fn commit(repo: &Repository, paths: &[&str], message: &str) -> git2::Oid {
    let mut index = repo.index().unwrap();
    for path in paths {
        index.add_path(Path::new(path)).unwrap();
    }
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let signature = Signature::now("Test", "test@example.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .unwrap()
}

/// Tracked files get blob ids; untracked files are recorded without identity
#[tokio::test]
async fn test_git_blob_strategy() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let repo = Repository::init(root).unwrap();
    write_file(root, "src/hello.txt", "hello\n");
    commit(&repo, &["src/hello.txt"], "init");
    write_file(root, "scratch.txt", "wip");

    let report = run(SnapshotConfig {
        strategy: Strategy::GitBlobHash,
        ..SnapshotConfig::for_root(root)
    })
    .await;

    let manifest = report.root_manifest.manifest();
    assert_eq!(
        manifest.get("src/hello.txt").unwrap().identity,
        Some(Identity::Hash(
            "ce013625030ba8dba906f756967f9e9ca394464a".to_string()
        ))
    );
    let scratch = manifest.get("scratch.txt").unwrap();
    assert_eq!(scratch.identity, None);
    assert_eq!(scratch.created_at, None);
    assert_eq!(report.fingerprint_failures.len(), 1);
    assert!(matches!(
        report.fingerprint_failures[0].error,
        FingerprintError::Untracked(_)
    ));

    // Null identities are persisted as null
    let persisted = snapshot_in(root).await;
    assert_eq!(persisted.manifest.get("scratch.txt").unwrap().identity, None);
}

/// Each file is identified by the last commit that changed it
#[tokio::test]
async fn test_git_commit_strategy() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let repo = Repository::init(root).unwrap();
    write_file(root, "a.txt", "a1");
    write_file(root, "b.txt", "b1");
    let first = commit(&repo, &["a.txt", "b.txt"], "first");
    write_file(root, "b.txt", "b2");
    let second = commit(&repo, &["b.txt"], "second");

    let report = run(SnapshotConfig {
        strategy: Strategy::GitCommitHash,
        ..SnapshotConfig::for_root(root)
    })
    .await;

    let manifest = report.root_manifest.manifest();
    assert_eq!(
        manifest.get("a.txt").unwrap().identity,
        Some(Identity::Hash(first.to_string()))
    );
    assert_eq!(
        manifest.get("b.txt").unwrap().identity,
        Some(Identity::Hash(second.to_string()))
    );
    assert!(report.fingerprint_failures.is_empty());
}

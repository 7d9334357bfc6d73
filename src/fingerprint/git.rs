//! Version-control fingerprints backed by libgit2.
//!
//! Each call discovers the repository containing the file and runs on the
//! blocking pool. Untracked paths and paths outside any working tree fail
//! closed with an error, which the engine records as a null identity.

use super::{Fingerprinter, Strategy};
use crate::error::FingerprintError;
use crate::types::Identity;
use async_trait::async_trait;
use git2::{ObjectType, Oid, Repository, Sort, Tree};
use std::path::{Path, PathBuf};
use tokio::task;

/// Blob id of the current working-tree content of a tracked file
#[derive(Debug, Clone, Copy, Default)]
pub struct GitBlobHash;

/// Id of the most recent commit reachable from HEAD that changed the path
#[derive(Debug, Clone, Copy, Default)]
pub struct GitCommitHash;

#[async_trait]
impl Fingerprinter for GitBlobHash {
    fn strategy(&self) -> Strategy {
        Strategy::GitBlobHash
    }

    async fn fingerprint(&self, path: &Path) -> Result<Identity, FingerprintError> {
        let path = path.to_path_buf();
        task::spawn_blocking(move || blob_hash(&path)).await?
    }
}

#[async_trait]
impl Fingerprinter for GitCommitHash {
    fn strategy(&self) -> Strategy {
        Strategy::GitCommitHash
    }

    async fn fingerprint(&self, path: &Path) -> Result<Identity, FingerprintError> {
        let path = path.to_path_buf();
        task::spawn_blocking(move || last_commit(&path)).await?
    }
}

fn blob_hash(path: &Path) -> Result<Identity, FingerprintError> {
    let located = locate(path)?;
    let index = located.repo.index()?;
    if index.get_path(&located.relative, 0).is_none() {
        return Err(FingerprintError::Untracked(path.to_path_buf()));
    }
    let oid = Oid::hash_file(ObjectType::Blob, &located.absolute)?;
    Ok(Identity::Hash(oid.to_string()))
}

fn last_commit(path: &Path) -> Result<Identity, FingerprintError> {
    let located = locate(path)?;
    match last_commit_touching(&located.repo, &located.relative)? {
        Some(oid) => Ok(Identity::Hash(oid.to_string())),
        None => Err(FingerprintError::Untracked(path.to_path_buf())),
    }
}

struct Located {
    repo: Repository,
    absolute: PathBuf,
    relative: PathBuf,
}

fn locate(path: &Path) -> Result<Located, FingerprintError> {
    let absolute = dunce::canonicalize(path).map_err(|e| FingerprintError::io(path, e))?;
    let start = absolute.parent().unwrap_or(&absolute);
    let repo = Repository::discover(start)
        .map_err(|_| FingerprintError::NoRepository(path.to_path_buf()))?;
    let workdir = repo
        .workdir()
        .ok_or_else(|| FingerprintError::NoRepository(path.to_path_buf()))?;
    let workdir = dunce::canonicalize(workdir).map_err(|e| FingerprintError::io(workdir, e))?;
    let relative = absolute
        .strip_prefix(&workdir)
        .map_err(|_| FingerprintError::Untracked(path.to_path_buf()))?
        .to_path_buf();
    Ok(Located {
        repo,
        absolute,
        relative,
    })
}

/// Walk history newest first; a commit touches the path when its entry
/// differs from the entry in every parent (merges that keep one side's
/// version are skipped, matching `git log -- <path>`).
fn last_commit_touching(repo: &Repository, relative: &Path) -> Result<Option<Oid>, git2::Error> {
    let mut revwalk = repo.revwalk()?;
    revwalk.push_head()?;
    revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;

    for oid in revwalk {
        let commit = repo.find_commit(oid?)?;
        let current = entry_id(&commit.tree()?, relative);
        if current.is_none() {
            continue;
        }
        let mut changed = true;
        for parent in commit.parents() {
            if entry_id(&parent.tree()?, relative) == current {
                changed = false;
                break;
            }
        }
        if changed {
            return Ok(Some(commit.id()));
        }
    }
    Ok(None)
}

fn entry_id(tree: &Tree<'_>, relative: &Path) -> Option<Oid> {
    tree.get_path(relative).ok().map(|entry| entry.id())
}

//! Persists sealed manifests and reads them back.

use crate::error::SnapshotError;
use crate::manifest::digest::{ParsedSnapshot, SealedManifest};
use crate::manifest::merge::{merge, PreviousSnapshot};
use crate::manifest::Manifest;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;
use tracing::{debug, warn};

/// Default snapshot file name
pub const DEFAULT_TARGET_NAME: &str = "manifest.json";

/// Default indentation (spaces per level)
pub const DEFAULT_INDENT: usize = 2;

/// When a view's snapshot may be written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WritePolicy {
    /// Always write, creating the target if absent
    #[default]
    Always,
    /// Only overwrite targets that already exist
    IfExists,
}

impl WritePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            WritePolicy::Always => "always",
            WritePolicy::IfExists => "if-exists",
        }
    }
}

impl fmt::Display for WritePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WritePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(WritePolicy::Always),
            "if-exists" => Ok(WritePolicy::IfExists),
            other => Err(format!(
                "Unknown write policy '{}' (expected 'always' or 'if-exists')",
                other
            )),
        }
    }
}

/// Result of processing one view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The snapshot was written with this content
    Written(SealedManifest),
    /// The policy did not allow writing
    Skipped,
}

/// Name of the temporary file a target is staged in before the rename
pub fn temp_name_for(target_name: &str) -> String {
    format!(".{}.tmp", target_name)
}

/// Reads previous snapshots, merges and writes views
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    target_name: String,
    indent: usize,
    policy: WritePolicy,
}

impl SnapshotWriter {
    pub fn new(target_name: impl Into<String>, indent: usize, policy: WritePolicy) -> Self {
        Self {
            target_name: target_name.into(),
            indent,
            policy,
        }
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    /// Snapshot path for a directory
    pub fn target_for(&self, directory: &Path) -> PathBuf {
        directory.join(&self.target_name)
    }

    /// Read the snapshot previously written at `target`.
    ///
    /// Missing and malformed snapshots both yield `None`; the merge then
    /// keeps every derived `createdAt`.
    pub async fn read_previous(&self, target: &Path) -> Option<PreviousSnapshot> {
        let bytes = match fs::read(target).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(target = %target.display(), "No previous snapshot");
                return None;
            }
            Err(e) => {
                warn!(target = %target.display(), error = %e, "Previous snapshot unreadable");
                return None;
            }
        };
        match PreviousSnapshot::from_json(target, &bytes) {
            Ok(previous) => Some(previous),
            Err(e) => {
                warn!(target = %target.display(), error = %e, "Previous snapshot malformed");
                None
            }
        }
    }

    /// Read previous, merge, seal and write one view (in that order).
    pub async fn reconcile(
        &self,
        directory: &Path,
        fresh: Manifest,
    ) -> Result<WriteOutcome, SnapshotError> {
        let target = self.target_for(directory);
        let exists = fs::try_exists(&target)
            .await
            .map_err(|e| SnapshotError::io(&target, e))?;
        if !exists && self.policy == WritePolicy::IfExists {
            debug!(target = %target.display(), "Target absent; skipped by policy");
            return Ok(WriteOutcome::Skipped);
        }

        let previous = if exists {
            self.read_previous(&target).await
        } else {
            None
        };
        let merged = merge(fresh, previous.as_ref());
        let sealed = SealedManifest::seal(merged)?;
        self.write_atomic(&target, &sealed).await?;
        Ok(WriteOutcome::Written(sealed))
    }

    /// Write through a temporary file in the same directory, then rename
    /// over the target.
    pub async fn write_atomic(
        &self,
        target: &Path,
        sealed: &SealedManifest,
    ) -> Result<(), SnapshotError> {
        let bytes = sealed.render(self.indent)?;
        let temp = target.with_file_name(temp_name_for(&self.target_name));

        fs::write(&temp, &bytes)
            .await
            .map_err(|e| SnapshotError::io(&temp, e))?;
        if let Err(e) = fs::rename(&temp, target).await {
            let _ = fs::remove_file(&temp).await;
            return Err(SnapshotError::io(target, e));
        }
        debug!(target = %target.display(), entries = sealed.manifest().len(), "Snapshot written");
        Ok(())
    }
}

/// Read and strictly parse a persisted snapshot
pub async fn read_snapshot(path: &Path) -> Result<ParsedSnapshot, SnapshotError> {
    let bytes = fs::read(path)
        .await
        .map_err(|e| SnapshotError::io(path, e))?;
    ParsedSnapshot::parse(path, &bytes)
}

/// Outcome of checking a snapshot's digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub path: PathBuf,
    pub entries: usize,
    pub recorded: Option<String>,
    pub computed: String,
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        self.recorded.as_deref() == Some(self.computed.as_str())
    }

    /// Convert a failed verification into an error
    pub fn into_result(self) -> Result<Self, SnapshotError> {
        if self.is_valid() {
            return Ok(self);
        }
        Err(SnapshotError::DigestMismatch {
            recorded: self.recorded.clone().unwrap_or_else(|| "<none>".to_string()),
            computed: self.computed.clone(),
            path: self.path,
        })
    }
}

/// Recompute the digest of a persisted snapshot and compare it with the
/// recorded one
pub async fn verify_snapshot(path: &Path) -> Result<Verification, SnapshotError> {
    let parsed = read_snapshot(path).await?;
    Ok(Verification {
        path: path.to_path_buf(),
        entries: parsed.manifest.len(),
        computed: parsed.computed_digest()?,
        recorded: parsed.recorded_digest,
    })
}

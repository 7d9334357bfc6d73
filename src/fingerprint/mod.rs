//! Fingerprint strategies.
//!
//! A strategy maps a file path to an [`Identity`] that changes exactly when
//! the file is considered changed. One strategy is chosen per run.

mod content;
mod git;
mod mtime;

pub use content::ContentHash;
pub use git::{GitBlobHash, GitCommitHash};
pub use mtime::ModTime;

use crate::error::FingerprintError;
use crate::types::Identity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Available fingerprint strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Strategy {
    /// Last-modified time in epoch milliseconds
    #[default]
    #[serde(rename = "mtime")]
    ModTime,
    /// BLAKE3 digest of the file content
    #[serde(rename = "content")]
    ContentHash,
    /// Git blob id of the working-tree content (tracked files only)
    #[serde(rename = "git-blob")]
    GitBlobHash,
    /// Id of the most recent commit touching the path
    #[serde(rename = "git-commit")]
    GitCommitHash,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::ModTime,
        Strategy::ContentHash,
        Strategy::GitBlobHash,
        Strategy::GitCommitHash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::ModTime => "mtime",
            Strategy::ContentHash => "content",
            Strategy::GitBlobHash => "git-blob",
            Strategy::GitCommitHash => "git-commit",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Unknown strategy '{}' (expected one of: mtime, content, git-blob, git-commit)",
                    s
                )
            })
    }
}

/// Computes identities for files
#[async_trait]
pub trait Fingerprinter: Send + Sync {
    fn strategy(&self) -> Strategy;

    async fn fingerprint(&self, path: &Path) -> Result<Identity, FingerprintError>;
}

/// Fingerprinter implementing `strategy`
pub fn fingerprinter_for(strategy: Strategy) -> Arc<dyn Fingerprinter> {
    match strategy {
        Strategy::ModTime => Arc::new(ModTime),
        Strategy::ContentHash => Arc::new(ContentHash),
        Strategy::GitBlobHash => Arc::new(GitBlobHash),
        Strategy::GitCommitHash => Arc::new(GitCommitHash),
    }
}

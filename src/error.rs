//! Error types for the directory snapshot engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while computing, reading or persisting snapshots
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Invalid root: {0}")]
    InvalidRoot(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed snapshot {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("Digest mismatch in {path}: recorded {recorded}, computed {computed}")]
    DigestMismatch {
        path: PathBuf,
        recorded: String,
        computed: String,
    },

    #[error("Task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl SnapshotError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SnapshotError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Per-entry traversal errors. These never abort a walk.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Link {path} resolves outside the root: {target}")]
    OutsideRoot { path: PathBuf, target: PathBuf },
}

impl WalkError {
    /// Path of the entry the error was recorded against
    pub fn path(&self) -> &PathBuf {
        match self {
            WalkError::Io { path, .. } | WalkError::OutsideRoot { path, .. } => path,
        }
    }
}

/// Per-file fingerprint errors. A failure yields a null identity, never an aborted run.
#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Path is not tracked by git: {0}")]
    Untracked(PathBuf),

    #[error("No git repository found for {0}")]
    NoRepository(PathBuf),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Fingerprint task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl FingerprintError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FingerprintError::Io {
            path: path.into(),
            source,
        }
    }
}

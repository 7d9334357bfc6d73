//! Configuration System
//!
//! Layered configuration built with the `config` crate. Sources, lowest to
//! highest precedence: built-in defaults, the global file
//! (`$XDG_CONFIG_HOME/dirsnap/config.toml`), the workspace file
//! (`<root>/dirsnap.toml`) and `DIRSNAP_*` environment variables, e.g.
//! `DIRSNAP_SNAPSHOT__STRATEGY=content` or
//! `DIRSNAP_SNAPSHOT__IGNORE=.git,target`. CLI flags are applied on top by
//! the binary.

use crate::fingerprint::Strategy;
use crate::ignore::{BUILTIN_DEFAULTS, DEFAULT_IGNORE_FILE};
use crate::logging::LoggingConfig;
use crate::manifest::writer::{WritePolicy, DEFAULT_INDENT, DEFAULT_TARGET_NAME};
use crate::manifest::DIGEST_KEY;
use crate::tree::walker::DEFAULT_MAX_CONCURRENCY;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirsnapConfig {
    /// Snapshot engine settings
    #[serde(default)]
    pub snapshot: SnapshotConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Everything one snapshot run needs.
///
/// | field             | default                     |
/// |-------------------|-----------------------------|
/// | `root`            | `.`                         |
/// | `ignore`          | `[".git", "node_modules"]`  |
/// | `ignore_file`     | `.dirsnapignore`            |
/// | `cutoff`          | all root segments           |
/// | `extension`       | none                        |
/// | `indent`          | 2                           |
/// | `write_policy`    | `always`                    |
/// | `target_name`     | `manifest.json`             |
/// | `strategy`        | `mtime`                     |
/// | `max_concurrency` | 64                          |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Traversal root
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Ignore entries, matched as segment-aligned prefixes of root-relative paths
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    /// Optional ignore file, relative to the root; read when present
    #[serde(default = "default_ignore_file")]
    pub ignore_file: Option<PathBuf>,

    /// Leading segments of `root/relative` stripped from root-manifest keys
    #[serde(default)]
    pub cutoff: Option<usize>,

    /// Only files whose name ends with this suffix are recorded
    #[serde(default)]
    pub extension: Option<String>,

    /// Spaces per indentation level in written snapshots (0 = compact)
    #[serde(default = "default_indent")]
    pub indent: usize,

    /// Whether snapshots are created or only refreshed
    #[serde(default)]
    pub write_policy: WritePolicy,

    /// File name of each per-directory snapshot
    #[serde(default = "default_target_name")]
    pub target_name: String,

    /// Fingerprint strategy for the whole run
    #[serde(default)]
    pub strategy: Strategy,

    /// Cap on concurrently open directories, fingerprints and writes
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_ignore() -> Vec<String> {
    BUILTIN_DEFAULTS.iter().map(|s| (*s).to_string()).collect()
}

fn default_ignore_file() -> Option<PathBuf> {
    Some(PathBuf::from(DEFAULT_IGNORE_FILE))
}

fn default_indent() -> usize {
    DEFAULT_INDENT
}

fn default_target_name() -> String {
    DEFAULT_TARGET_NAME.to_string()
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            ignore: default_ignore(),
            ignore_file: default_ignore_file(),
            cutoff: None,
            extension: None,
            indent: default_indent(),
            write_policy: WritePolicy::default(),
            target_name: default_target_name(),
            strategy: Strategy::default(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl SnapshotConfig {
    /// Config for `root` with every other field at its default
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Validate field values (the root itself is checked when a run starts)
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.target_name.is_empty() {
            errors.push(ValidationError::new("target_name", "cannot be empty"));
        } else if self.target_name.contains(['/', '\\']) {
            errors.push(ValidationError::new(
                "target_name",
                "must be a file name, not a path",
            ));
        } else if self.target_name == DIGEST_KEY {
            errors.push(ValidationError::new("target_name", "'digest' is reserved"));
        }

        if self.max_concurrency == 0 {
            errors.push(ValidationError::new("max_concurrency", "must be at least 1"));
        }

        if matches!(self.extension.as_deref(), Some("")) {
            errors.push(ValidationError::new(
                "extension",
                "cannot be empty (omit it to record every file)",
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "snapshot.{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

//! Ignore rules for the walker.
//!
//! Matching is segment-aligned prefix matching against the path relative to
//! the traversal root: an entry matches when the path's leading segments are
//! exactly the entry's segments. `.git` matches `.git` and `.git/config`, but
//! neither `.github` nor `sub/.git`. Entries may be written with a leading
//! `./` and a trailing `/`.
//!
//! Besides the configured list, an optional ignore file inside the root (by
//! default `.dirsnapignore`) contributes one entry per non-empty line; lines
//! starting with `#` are comments.

use crate::error::WalkError;
use crate::tree::path::pattern_segments;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Default ignore entries
pub const BUILTIN_DEFAULTS: &[&str] = &[".git", "node_modules"];

/// Default name of the in-root ignore file
pub const DEFAULT_IGNORE_FILE: &str = ".dirsnapignore";

/// Ordered collection of compiled ignore entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreList {
    entries: Vec<Vec<String>>,
}

impl IgnoreList {
    /// Compile ignore entries. Entries that reduce to nothing (`""`, `./`)
    /// are dropped; they would otherwise ignore the whole root.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let entries = patterns
            .iter()
            .map(|p| pattern_segments(p.as_ref()))
            .filter(|segments| !segments.is_empty())
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append more entries, keeping order
    pub fn extend<S: AsRef<str>>(&mut self, patterns: &[S]) {
        self.entries.extend(
            patterns
                .iter()
                .map(|p| pattern_segments(p.as_ref()))
                .filter(|segments| !segments.is_empty()),
        );
    }

    /// Whether a root-relative path (as segments) is ignored
    pub fn is_ignored<S: AsRef<str>>(&self, relative: &[S]) -> bool {
        self.entries.iter().any(|entry| {
            entry.len() <= relative.len()
                && entry
                    .iter()
                    .zip(relative.iter())
                    .all(|(want, have)| want == have.as_ref())
        })
    }
}

/// Read ignore entries from a file: trim, skip empty lines and `#` comments.
///
/// A missing file yields no entries. An unreadable one is a traversal error
/// against that file, never a failed run.
pub fn read_ignore_file(path: &Path) -> Result<Vec<String>, WalkError> {
    if !path.is_file() {
        debug!(path = %path.display(), "No ignore file");
        return Ok(Vec::new());
    }
    let contents = fs::read_to_string(path).map_err(|source| WalkError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

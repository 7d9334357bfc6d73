//! Path canonicalization and manifest key formation

use crate::error::SnapshotError;
use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Separator used in manifest keys on every platform
pub const KEY_SEPARATOR: char = '/';

/// Canonicalize the traversal root.
///
/// The root must exist and be a directory; anything else is a fatal
/// configuration error for the whole run.
pub fn canonicalize_root(root: &Path) -> Result<PathBuf, SnapshotError> {
    let canonical = dunce::canonicalize(root).map_err(|e| {
        SnapshotError::InvalidRoot(format!("{}: {}", root.display(), e))
    })?;
    if !canonical.is_dir() {
        return Err(SnapshotError::InvalidRoot(format!(
            "{} is not a directory",
            root.display()
        )));
    }
    Ok(canonical)
}

/// Normalize a single path segment (Unicode NFC)
pub fn normalize_segment(segment: &str) -> String {
    segment.nfc().collect()
}

/// Segments of the root path exactly as the caller supplied it.
///
/// `.` and `..` are kept as segments, the filesystem root and any drive
/// prefix are dropped. `"."` yields `["."]`, `"/srv/site"` yields
/// `["srv", "site"]`.
pub fn root_segments(root: &Path) -> Vec<String> {
    root.components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(normalize_segment(&name.to_string_lossy())),
            Component::CurDir => Some(".".to_string()),
            Component::ParentDir => Some("..".to_string()),
            Component::RootDir | Component::Prefix(_) => None,
        })
        .collect()
}

/// Segments of `path` relative to `root`, or `None` when `path` is not under `root`.
pub fn relative_segments(root: &Path, path: &Path) -> Option<Vec<String>> {
    let relative = path.strip_prefix(root).ok()?;
    Some(
        relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(name) => Some(normalize_segment(&name.to_string_lossy())),
                _ => None,
            })
            .collect(),
    )
}

/// Split an ignore pattern or key into segments.
///
/// Leading `./`, repeated separators and trailing separators are dropped.
/// Backslashes are treated as separators so patterns written on Windows
/// behave the same way.
pub fn pattern_segments(pattern: &str) -> Vec<String> {
    pattern
        .split(|c| c == '/' || c == '\\')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .map(normalize_segment)
        .collect()
}

/// Join segments into a manifest key
pub fn join_key<S: AsRef<str>>(segments: &[S]) -> String {
    let mut key = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            key.push(KEY_SEPARATOR);
        }
        key.push_str(segment.as_ref());
    }
    key
}

/// How root-manifest keys are formed from traversal-relative paths.
///
/// Every file's full key is `root segments ++ relative segments`; the first
/// `cutoff` segments are stripped. The default cutoff strips the whole root
/// so keys are relative to the traversal root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    retained: Vec<String>,
}

impl KeyLayout {
    /// Build the layout for `root` as supplied by the caller.
    pub fn new(root: &Path, cutoff: Option<usize>) -> Result<Self, SnapshotError> {
        let segments = root_segments(root);
        let cutoff = cutoff.unwrap_or(segments.len());
        if cutoff > segments.len() {
            return Err(SnapshotError::InvalidConfig(format!(
                "cutoff {} exceeds the {} segment(s) of root {}",
                cutoff,
                segments.len(),
                root.display()
            )));
        }
        Ok(Self {
            retained: segments[cutoff..].to_vec(),
        })
    }

    /// Layout whose keys are relative to the traversal root
    pub fn relative() -> Self {
        Self {
            retained: Vec::new(),
        }
    }

    /// Root segments that survive the cutoff and prefix every root key
    pub fn retained(&self) -> &[String] {
        &self.retained
    }

    /// Key prefix (without trailing separator); empty when nothing is retained
    pub fn prefix(&self) -> String {
        join_key(&self.retained)
    }

    /// Root-manifest key for a traversal-relative path
    pub fn root_key(&self, relative: &[String]) -> String {
        let mut segments: Vec<&str> = self.retained.iter().map(String::as_str).collect();
        segments.extend(relative.iter().map(String::as_str));
        join_key(&segments)
    }

    /// Traversal-relative segments of a root-manifest key, or `None` when
    /// the key does not carry this layout's prefix.
    pub fn strip_prefix<'a>(&self, key: &'a str) -> Option<Vec<&'a str>> {
        let mut segments = key.split(KEY_SEPARATOR);
        for expected in &self.retained {
            if segments.next()? != expected.as_str() {
                return None;
            }
        }
        let rest: Vec<&str> = segments.collect();
        if rest.is_empty() {
            None
        } else {
            Some(rest)
        }
    }
}

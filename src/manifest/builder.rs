//! Builds the root manifest and its per-directory views.
//!
//! A file at `a/b/c.txt` appears in the view of the traversal root, of `a`
//! and of `a/b`, keyed `a/b/c.txt`, `b/c.txt` and `c.txt` respectively, so
//! each directory carries a self-contained manifest of everything beneath it.
//! The root view uses the root-manifest keys, which include whatever root
//! segments the cutoff retained.

use crate::manifest::{FileRecord, Manifest, DIGEST_KEY};
use crate::tree::path::{join_key, KeyLayout};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Collects fingerprinted files into a root manifest
#[derive(Debug)]
pub struct ManifestBuilder {
    layout: KeyLayout,
    manifest: Manifest,
}

impl ManifestBuilder {
    pub fn new(layout: KeyLayout) -> Self {
        Self {
            layout,
            manifest: Manifest::new(),
        }
    }

    /// Add a file by its traversal-relative segments. Insertion order does
    /// not matter; keys are unique per file so merging is commutative.
    pub fn add(&mut self, relative: &[String], record: FileRecord) {
        if relative.is_empty() {
            return;
        }
        let key = self.layout.root_key(relative);
        if self.manifest.insert(key.clone(), record).is_some() {
            warn!(key = %key, "Two files share one key; the earlier record was replaced");
        }
    }

    pub fn finish(self) -> RootManifest {
        RootManifest {
            layout: self.layout,
            manifest: self.manifest,
        }
    }
}

/// The manifest of the whole traversal root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootManifest {
    layout: KeyLayout,
    manifest: Manifest,
}

impl RootManifest {
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn layout(&self) -> &KeyLayout {
        &self.layout
    }

    pub fn into_manifest(self) -> Manifest {
        self.manifest
    }

    /// Derive one view per directory that has files beneath it, root first,
    /// then in lexicographic order of directory key.
    pub fn views(&self) -> Vec<DirectoryView> {
        let mut root_view = Manifest::new();
        let mut subdirectories: BTreeMap<Vec<String>, Manifest> = BTreeMap::new();

        for (key, record) in &self.manifest {
            insert_view_entry(&mut root_view, &[], key, record);

            let Some(segments) = self.layout.strip_prefix(key) else {
                continue;
            };
            for depth in 1..segments.len() {
                let dir: Vec<String> = segments[..depth].iter().map(|s| s.to_string()).collect();
                let view_key = join_key(&segments[depth..]);
                let view = subdirectories.entry(dir.clone()).or_default();
                insert_view_entry(view, &dir, &view_key, record);
            }
        }

        let mut views = Vec::with_capacity(subdirectories.len() + 1);
        views.push(DirectoryView {
            dir: Vec::new(),
            manifest: root_view,
        });
        views.extend(
            subdirectories
                .into_iter()
                .map(|(dir, manifest)| DirectoryView { dir, manifest }),
        );
        views
    }
}

fn insert_view_entry(view: &mut Manifest, dir: &[String], key: &str, record: &FileRecord) {
    if key == DIGEST_KEY {
        warn!(
            directory = %join_key(dir),
            "File named '{}' collides with the digest field; left out of this view",
            DIGEST_KEY
        );
        return;
    }
    view.insert(key, record.clone());
}

/// A manifest re-rooted at one directory, containing only its descendants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryView {
    /// Directory segments relative to the traversal root; empty for the root
    pub dir: Vec<String>,
    pub manifest: Manifest,
}

impl DirectoryView {
    /// Empty view for a directory that no longer has any files
    pub fn empty(dir: Vec<String>) -> Self {
        Self {
            dir,
            manifest: Manifest::new(),
        }
    }

    /// Directory key relative to the traversal root (`""` for the root)
    pub fn key(&self) -> String {
        join_key(&self.dir)
    }

    /// Directory on disk this view belongs to
    pub fn directory(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(self.dir.iter());
        path
    }
}

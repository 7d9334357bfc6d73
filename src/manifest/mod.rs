//! Manifests: path-keyed fingerprint records and their on-disk form.
//!
//! A [`Manifest`] maps forward-slash keys, relative to the directory that owns
//! the manifest, to [`FileRecord`]s. Keys are kept sorted so serialization is
//! canonical. The persisted form appends a `digest` field computed over the
//! records (see [`digest`]).

pub mod builder;
pub mod digest;
pub mod merge;
pub mod writer;

use crate::types::{EpochMillis, Identity};
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Reserved key carrying the digest in persisted manifests
pub const DIGEST_KEY: &str = "digest";

/// One file's fingerprint entry.
///
/// Fields are declared in lexicographic order of their JSON names so that
/// serializing a record and serializing its parsed JSON object agree byte for
/// byte. Unknown members are rejected: the digest only covers the fields
/// modelled here, so anything else would pass verification unseen.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileRecord {
    /// First-seen time, stable across runs once established
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<EpochMillis>,
    /// Strategy output; `None` when fingerprinting failed
    #[serde(default)]
    pub identity: Option<Identity>,
}

impl FileRecord {
    pub fn new(identity: Option<Identity>, created_at: Option<EpochMillis>) -> Self {
        Self {
            created_at,
            identity,
        }
    }
}

/// Sorted mapping from relative key to record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, FileRecord>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the record previously stored under `key`
    pub fn insert(&mut self, key: impl Into<String>, record: FileRecord) -> Option<FileRecord> {
        self.entries.insert(key.into(), record)
    }

    pub fn get(&self, key: &str) -> Option<&FileRecord> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut FileRecord> {
        self.entries.get_mut(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<FileRecord> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FileRecord> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> btree_map::IterMut<'_, String, FileRecord> {
        self.entries.iter_mut()
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = (&'a String, &'a FileRecord);
    type IntoIter = btree_map::Iter<'a, String, FileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for Manifest {
    type Item = (String, FileRecord);
    type IntoIter = btree_map::IntoIter<String, FileRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, FileRecord)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (String, FileRecord)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

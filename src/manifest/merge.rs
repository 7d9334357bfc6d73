//! Reconciles a fresh view with the snapshot previously persisted for it.
//!
//! Fresh records arrive carrying the `createdAt` derived from the filesystem
//! (birth time, falling back to change time). When the previous snapshot holds
//! a valid `createdAt` for the same key it replaces the derived one. Keys only
//! present in the previous snapshot are not carried over.

use crate::error::SnapshotError;
use crate::manifest::{Manifest, DIGEST_KEY};
use crate::types::{system_time_millis, EpochMillis};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::Metadata;
use std::path::Path;

/// `createdAt` values recovered from a previously persisted snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviousSnapshot {
    created: BTreeMap<String, EpochMillis>,
}

impl PreviousSnapshot {
    /// Parse a persisted snapshot. Only the top-level shape must be valid;
    /// individual records with a missing or unusable `createdAt` are simply
    /// not remembered.
    pub fn from_json(path: &Path, bytes: &[u8]) -> Result<Self, SnapshotError> {
        let value: Value = serde_json::from_slice(bytes).map_err(|e| SnapshotError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let Value::Object(object) = value else {
            return Err(SnapshotError::Malformed {
                path: path.to_path_buf(),
                reason: "top-level value is not an object".to_string(),
            });
        };

        let created = object
            .iter()
            .filter(|(key, _)| key.as_str() != DIGEST_KEY)
            .filter_map(|(key, record)| {
                record
                    .get("createdAt")
                    .and_then(valid_created_at)
                    .map(|ts| (key.clone(), ts))
            })
            .collect();
        Ok(Self { created })
    }

    pub fn created_at(&self, key: &str) -> Option<EpochMillis> {
        self.created.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.created.len()
    }

    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
    }
}

impl FromIterator<(String, EpochMillis)> for PreviousSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, EpochMillis)>>(iter: I) -> Self {
        Self {
            created: iter.into_iter().filter(|(_, ts)| *ts > 0).collect(),
        }
    }
}

/// A finite positive number; fractional milliseconds are truncated.
fn valid_created_at(value: &Value) -> Option<EpochMillis> {
    if let Some(ms) = value.as_u64() {
        return (ms > 0).then_some(ms);
    }
    let ms = value.as_f64()?;
    (ms.is_finite() && ms >= 1.0).then_some(ms as EpochMillis)
}

/// Carry stable `createdAt` values forward from `previous` into `fresh`.
///
/// Without a previous snapshot the derived values are kept as they are.
pub fn merge(mut fresh: Manifest, previous: Option<&PreviousSnapshot>) -> Manifest {
    let Some(previous) = previous else {
        return fresh;
    };
    for (key, record) in fresh.iter_mut() {
        if let Some(created_at) = previous.created_at(key) {
            record.created_at = Some(created_at);
        }
    }
    fresh
}

/// `createdAt` derived from filesystem metadata: birth time when the
/// platform reports a positive one, otherwise change time.
pub fn derive_created_at(metadata: &Metadata) -> Option<EpochMillis> {
    if let Some(born) = metadata
        .created()
        .ok()
        .and_then(system_time_millis)
        .filter(|ms| *ms > 0)
    {
        return Some(born);
    }
    change_time_millis(metadata)
}

#[cfg(unix)]
fn change_time_millis(metadata: &Metadata) -> Option<EpochMillis> {
    use std::os::unix::fs::MetadataExt;

    let millis = metadata.ctime() as i128 * 1000 + metadata.ctime_nsec() as i128 / 1_000_000;
    (millis > 0).then_some(millis as EpochMillis)
}

#[cfg(not(unix))]
fn change_time_millis(metadata: &Metadata) -> Option<EpochMillis> {
    metadata
        .modified()
        .ok()
        .and_then(system_time_millis)
        .filter(|ms| *ms > 0)
}

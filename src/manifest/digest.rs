//! Canonical digest over a manifest and the sealed (persisted) form.
//!
//! The digest input is the compact JSON of the records alone: keys sorted,
//! record fields sorted, no whitespace. The digest field itself is never part
//! of its input. The persisted form lists the records in the same order and
//! appends `"digest"` as the last member.

use crate::error::SnapshotError;
use crate::manifest::{FileRecord, Manifest, DIGEST_KEY};
use crate::tree::hasher;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::path::Path;

/// Canonical byte form of the records
pub fn canonical_bytes(manifest: &Manifest) -> Result<Vec<u8>, SnapshotError> {
    Ok(serde_json::to_vec(manifest)?)
}

/// Hex BLAKE3 digest over the canonical bytes
pub fn compute_digest(manifest: &Manifest) -> Result<String, SnapshotError> {
    let bytes = canonical_bytes(manifest)?;
    Ok(hasher::to_hex(&hasher::compute_content_hash(&bytes)))
}

/// A manifest together with the digest computed over it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedManifest {
    manifest: Manifest,
    digest: String,
}

impl SealedManifest {
    /// Compute the digest for `manifest`
    pub fn seal(manifest: Manifest) -> Result<Self, SnapshotError> {
        let digest = compute_digest(&manifest)?;
        Ok(Self { manifest, digest })
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn into_parts(self) -> (Manifest, String) {
        (self.manifest, self.digest)
    }

    /// Render for disk. `indent` is the number of spaces per level; zero
    /// renders compact JSON.
    pub fn render(&self, indent: usize) -> Result<Vec<u8>, SnapshotError> {
        if indent == 0 {
            return Ok(serde_json::to_vec(self)?);
        }
        let indent = " ".repeat(indent);
        let mut out = Vec::new();
        let formatter = PrettyFormatter::with_indent(indent.as_bytes());
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        out.push(b'\n');
        Ok(out)
    }
}

impl Serialize for SealedManifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.manifest.len() + 1))?;
        for (key, record) in &self.manifest {
            map.serialize_entry(key, record)?;
        }
        map.serialize_entry(DIGEST_KEY, &self.digest)?;
        map.end()
    }
}

/// A persisted snapshot as read back from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSnapshot {
    pub manifest: Manifest,
    /// Digest recorded in the file, if any
    pub recorded_digest: Option<String>,
}

impl ParsedSnapshot {
    /// Strictly parse a persisted snapshot: every member except `digest`
    /// must be a valid record, and `digest` must be a string when present.
    pub fn parse(path: &Path, bytes: &[u8]) -> Result<Self, SnapshotError> {
        let malformed = |reason: String| SnapshotError::Malformed {
            path: path.to_path_buf(),
            reason,
        };

        let value: Value = serde_json::from_slice(bytes).map_err(|e| malformed(e.to_string()))?;
        let Value::Object(mut object) = value else {
            return Err(malformed("top-level value is not an object".to_string()));
        };

        let recorded_digest = match object.remove(DIGEST_KEY) {
            None => None,
            Some(Value::String(digest)) => Some(digest),
            Some(_) => return Err(malformed("digest is not a string".to_string())),
        };

        let mut manifest = Manifest::new();
        for (key, value) in object {
            let record: FileRecord = serde_json::from_value(value)
                .map_err(|e| malformed(format!("record '{}': {}", key, e)))?;
            manifest.insert(key, record);
        }

        Ok(Self {
            manifest,
            recorded_digest,
        })
    }

    /// Recompute the digest over the parsed records
    pub fn computed_digest(&self) -> Result<String, SnapshotError> {
        compute_digest(&self.manifest)
    }
}

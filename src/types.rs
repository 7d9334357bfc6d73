//! Shared value types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch
pub type EpochMillis = u64;

/// BLAKE3 output
pub type Hash = [u8; 32];

/// Fingerprint value produced by the active strategy.
///
/// Serialized untagged: modification times as JSON numbers, digests and
/// version-control object ids as hex strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identity {
    Millis(EpochMillis),
    Hash(String),
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Millis(ms) => write!(f, "{}", ms),
            Identity::Hash(hash) => f.write_str(hash),
        }
    }
}

/// Convert a filesystem timestamp to epoch milliseconds.
///
/// Times before the epoch map to `None`.
pub fn system_time_millis(time: SystemTime) -> Option<EpochMillis> {
    time.duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| d.as_millis() as EpochMillis)
}

//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::SnapshotError;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &SnapshotError) -> String {
    match e {
        SnapshotError::InvalidRoot(_) | SnapshotError::InvalidConfig(_) | SnapshotError::Config(_) => {
            format!("configuration error: {}", e)
        }
        _ => format!("error: {}", e),
    }
}

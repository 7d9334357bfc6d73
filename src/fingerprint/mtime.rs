use super::{Fingerprinter, Strategy};
use crate::error::FingerprintError;
use crate::types::{system_time_millis, Identity};
use async_trait::async_trait;
use std::path::Path;
use tokio::fs;

/// Modification time in epoch milliseconds. Resolution is whatever the
/// filesystem clock provides.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModTime;

#[async_trait]
impl Fingerprinter for ModTime {
    fn strategy(&self) -> Strategy {
        Strategy::ModTime
    }

    async fn fingerprint(&self, path: &Path) -> Result<Identity, FingerprintError> {
        let metadata = fs::metadata(path)
            .await
            .map_err(|e| FingerprintError::io(path, e))?;
        let modified = metadata
            .modified()
            .map_err(|e| FingerprintError::io(path, e))?;
        Ok(Identity::Millis(system_time_millis(modified).unwrap_or(0)))
    }
}

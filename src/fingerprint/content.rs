use super::{Fingerprinter, Strategy};
use crate::error::FingerprintError;
use crate::tree::hasher;
use crate::types::Identity;
use async_trait::async_trait;
use std::path::Path;

/// BLAKE3 digest of the full file content, hex encoded.
///
/// Re-reads every file on every run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHash;

#[async_trait]
impl Fingerprinter for ContentHash {
    fn strategy(&self) -> Strategy {
        Strategy::ContentHash
    }

    async fn fingerprint(&self, path: &Path) -> Result<Identity, FingerprintError> {
        let hash = hasher::hash_file(path)
            .await
            .map_err(|e| FingerprintError::io(path, e))?;
        Ok(Identity::Hash(hasher::to_hex(&hash)))
    }
}

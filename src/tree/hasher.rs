//! BLAKE3 hashing for file contents and manifest digests

use crate::types::Hash;
use blake3::Hasher;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

const READ_CHUNK: usize = 64 * 1024;

/// Compute content hash for in-memory bytes
pub fn compute_content_hash(content: &[u8]) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(content);
    *hasher.finalize().as_bytes()
}

/// Hash a file's full content, reading it in fixed-size chunks.
pub async fn hash_file(path: &Path) -> std::io::Result<Hash> {
    let mut file = File::open(path).await?;
    let mut hasher = Hasher::new();
    let mut buffer = vec![0u8; READ_CHUNK];
    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(*hasher.finalize().as_bytes())
}

/// Lowercase hex rendering used everywhere a hash is persisted
pub fn to_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

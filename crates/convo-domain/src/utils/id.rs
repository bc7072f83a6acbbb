//! Content hashing helpers shared by the Skeleton Builder, the Skeleton
//! Cache (source-file checksums) and the Indexing Decision Service
//! (content hash for reindex detection).

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// SHA-256 hex digest of content, used for `content_hash` / dedup.
#[must_use]
pub fn compute_content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// SHA-256 hex digest of a file's bytes, used for the per-skeleton
/// `source_file_checksums` that gate idempotent Pass 1/Pass 2 runs.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let file = File::open(path)
        .map_err(|e| Error::io(format!("failed to open file {}: {e}", path.display())))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let count = reader
            .read(&mut buffer)
            .map_err(|e| Error::io(format!("failed to read file {}: {e}", path.display())))?;
        if count == 0 {
            break;
        }
        hasher.update(&buffer[..count]);
    }
    Ok(hex::encode(hasher.finalize()))
}

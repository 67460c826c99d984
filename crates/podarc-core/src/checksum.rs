//! Content digests recorded in the manifest.
//!
//! Computed after a file reaches its final state (post-embedding), off the
//! download path, so the manifest describes exactly what is on disk.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// Length and optional SHA-256 of an archived file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDigest {
    pub len: u64,
    pub sha256: Option<String>,
}

/// Compute SHA-256 of a file and return the digest as lowercase hex.
/// Reads in chunks to keep memory use bounded; suitable for large files.
pub fn sha256_path(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Length (always) and SHA-256 (when `with_checksum`) of the file at `path`.
pub fn digest_path(path: &Path, with_checksum: bool) -> Result<ContentDigest> {
    let len = std::fs::metadata(path)
        .with_context(|| format!("stat {}", path.display()))?
        .len();
    let sha256 = if with_checksum {
        Some(sha256_path(path)?)
    } else {
        None
    };
    Ok(ContentDigest { len, sha256 })
}

//! Content fingerprints of tracked files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Size and SHA-256 digest of a file's content.
///
/// Timestamps are not part of it: a file rewritten with identical bytes is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Content length in bytes
    pub size: u64,
    /// Digest in `sha256:<hex>` form
    pub sha256: String,
}

impl Fingerprint {
    /// Fingerprint in-memory content.
    #[must_use]
    pub fn of_bytes(content: &[u8]) -> Self {
        Self {
            size: content.len() as u64,
            sha256: checksum(content),
        }
    }

    /// Fingerprint a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn of_file(path: &Path) -> Result<Self> {
        let content = fs::read(path)
            .with_context(|| format!("Cannot read file for fingerprinting: {}", path.display()))?;
        Ok(Self::of_bytes(&content))
    }
}

/// SHA-256 of `content` in `sha256:<hex>` form.
#[must_use]
pub fn checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

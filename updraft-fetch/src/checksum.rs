//! SHA-256 verification of staged archives.

use std::fs::File;
use std::path::Path;

use sha2::{Digest, Sha256};

use updraft_core::FetchError;

/// Lowercase hex SHA-256 of the file at `path`.
pub fn sha256_file(path: &Path) -> Result<String, FetchError> {
    let mut file = File::open(path).map_err(|e| FetchError::io(path, e))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(|e| FetchError::io(path, e))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Compare the digest of `path` with `expected` (hex, case-insensitive).
pub fn verify_sha256(path: &Path, expected: &str) -> Result<(), FetchError> {
    let actual = sha256_file(path)?;
    let expected = expected.trim().to_ascii_lowercase();
    if actual != expected {
        return Err(FetchError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected,
            actual,
        });
    }
    tracing::debug!(path = %path.display(), "checksum verified");
    Ok(())
}

//! Size-based rotation of the log sink.
//!
//! Once the sink reaches [`MAX_LOG_BYTES`] it is shifted to `<name>.1`,
//! older copies move up one number, and anything past [`MAX_ROTATED_FILES`]
//! is dropped. A fresh empty sink is left in place.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 10 MiB.
pub const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

pub const MAX_ROTATED_FILES: usize = 5;

/// Rotate `log_path` if it holds at least `max_bytes`.
///
/// Returns `Ok(false)` when the file is smaller or absent.
pub fn rotate_if_needed(log_path: &Path, max_bytes: u64, max_files: usize) -> io::Result<bool> {
    let size = match fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    if size < max_bytes {
        return Ok(false);
    }

    let oldest = numbered_path(log_path, max_files);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }
    for n in (1..max_files).rev() {
        let from = numbered_path(log_path, n);
        if from.exists() {
            fs::rename(&from, numbered_path(log_path, n + 1))?;
        }
    }
    fs::rename(log_path, numbered_path(log_path, 1))?;
    fs::File::create(log_path)?;
    Ok(true)
}

/// Rotate the sink with the default limits. Never fails the caller.
pub fn rotate_sink(log_file: &Path) {
    match rotate_if_needed(log_file, MAX_LOG_BYTES, MAX_ROTATED_FILES) {
        Ok(true) => tracing::info!(path = %log_file.display(), "log sink rotated"),
        Ok(false) => {}
        Err(err) => {
            tracing::warn!(path = %log_file.display(), error = %err, "log sink rotation failed")
        }
    }
}

fn numbered_path(base: &Path, n: usize) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(format!(".{n}"));
    PathBuf::from(name)
}

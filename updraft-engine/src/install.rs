//! Executable swap.
//!
//! 1. Copy the current executable to `<exe>.previous` (one-level rollback copy).
//! 2. Copy the new executable to `<exe>.new` next to the target.
//! 3. Mark `<exe>.new` executable (`0o755`).
//! 4. Rename `<exe>.new` over `<exe>` (atomic on POSIX).
//!
//! Until step 4 succeeds the installed executable is untouched; on any
//! failure the staged `.new` file is removed.

use std::path::{Path, PathBuf};

use updraft_core::InstallError;

pub const STAGED_SUFFIX: &str = ".new";
pub const PREVIOUS_SUFFIX: &str = ".previous";

pub fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Install `new_executable` at `installed`.
pub fn replace_executable(new_executable: &Path, installed: &Path) -> Result<(), InstallError> {
    let dir = installed
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .ok_or_else(|| InstallError::NoParent {
            path: installed.to_path_buf(),
        })?;
    std::fs::create_dir_all(dir).map_err(|e| InstallError::io(dir, e))?;

    if installed.is_file() {
        let previous = sibling(installed, PREVIOUS_SUFFIX);
        std::fs::copy(installed, &previous).map_err(|e| InstallError::io(&previous, e))?;
    }

    let staged = sibling(installed, STAGED_SUFFIX);
    let result = stage_and_swap(new_executable, &staged, installed);
    if result.is_err() {
        let _ = std::fs::remove_file(&staged);
    }
    result
}

fn stage_and_swap(new_executable: &Path, staged: &Path, installed: &Path) -> Result<(), InstallError> {
    std::fs::copy(new_executable, staged).map_err(|e| InstallError::io(staged, e))?;
    mark_executable(staged)?;
    std::fs::rename(staged, installed).map_err(|e| InstallError::io(installed, e))?;
    tracing::debug!(path = %installed.display(), "executable replaced");
    Ok(())
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<(), InstallError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .map_err(|e| InstallError::io(path, e))
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<(), InstallError> {
    Ok(())
}

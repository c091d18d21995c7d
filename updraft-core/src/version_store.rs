//! Version store: the record of which artifact is installed.
//!
//! The file holds one line: the opaque identifier. Writes use the `.tmp` +
//! rename pattern so a crash mid-write leaves the previous record intact.
//! Reads never fail: a missing, empty, or unreadable record is "absent".

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::PersistError;
use crate::types::ArtifactId;

/// Persists the identifier of the currently installed artifact.
pub trait VersionStore: Send + Sync {
    /// `None` if never written or unreadable.
    fn get(&self) -> Option<ArtifactId>;

    fn set(&self, id: &ArtifactId) -> Result<(), PersistError>;
}

/// [`VersionStore`] backed by a single text file.
#[derive(Debug, Clone)]
pub struct FileVersionStore {
    path: PathBuf,
}

impl FileVersionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl VersionStore for FileVersionStore {
    fn get(&self) -> Option<ArtifactId> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "version record unreadable; treating as absent"
                );
                return None;
            }
        };

        let id = contents.lines().next().unwrap_or_default().trim();
        if id.is_empty() {
            tracing::warn!(path = %self.path.display(), "version record empty; treating as absent");
            return None;
        }
        Some(ArtifactId::from(id))
    }

    fn set(&self, id: &ArtifactId) -> Result<(), PersistError> {
        let io_err = |path: &Path, source: std::io::Error| PersistError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        }

        let tmp = self.tmp_path();
        std::fs::write(&tmp, format!("{id}\n")).map_err(|e| io_err(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(&self.path, e));
        }
        Ok(())
    }
}

//! HTTP artifact fetcher.
//!
//! Downloads stream into `<staging>.part` and are renamed into place once the
//! body is complete, so a staged archive is never a truncated download. On
//! failure the `.part` file is left for diagnostics.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use updraft_core::{ArtifactFetcher, ExtractError, FetchError};

use crate::extract::extract_archive;

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// `timeout` applies to connecting and to each read, not to the whole
    /// transfer.
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: crate::download_agent(timeout),
        }
    }
}

fn part_path(staging_path: &Path) -> PathBuf {
    let mut name = staging_path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

impl ArtifactFetcher for HttpFetcher {
    fn fetch(&self, url: &str, staging_path: &Path) -> Result<(), FetchError> {
        if let Some(dir) = staging_path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| FetchError::io(dir, e))?;
        }

        let response = self.agent.get(url).call().map_err(|e| FetchError::Http {
            url: url.to_owned(),
            detail: crate::describe(e),
        })?;

        let part = part_path(staging_path);
        let file = File::create(&part).map_err(|e| FetchError::io(&part, e))?;
        let mut writer = BufWriter::new(file);
        let bytes = std::io::copy(&mut response.into_reader(), &mut writer).map_err(|e| {
            FetchError::Http {
                url: url.to_owned(),
                detail: format!("body transfer interrupted: {e}"),
            }
        })?;
        writer.flush().map_err(|e| FetchError::io(&part, e))?;
        drop(writer);

        std::fs::rename(&part, staging_path).map_err(|e| FetchError::io(staging_path, e))?;
        tracing::debug!(url, bytes, path = %staging_path.display(), "download complete");
        Ok(())
    }

    fn extract(&self, staging_path: &Path, extraction_path: &Path) -> Result<(), ExtractError> {
        extract_archive(staging_path, extraction_path)
    }
}

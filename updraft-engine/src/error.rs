//! Error types for updraft-engine's own bookkeeping.

use std::path::PathBuf;

use thiserror::Error;

/// Failures writing or reading the last-run report. Never fatal to a run.
#[derive(Debug, Error)]
pub enum ReportError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("run report JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`ReportError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ReportError {
    ReportError::Io {
        path: path.into(),
        source,
    }
}

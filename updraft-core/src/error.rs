//! Error taxonomy shared by every updraft crate.
//!
//! One enum per concern; [`UpdateError`] aggregates the ones that can end a
//! run so the orchestrator can classify failures into a `RunOutcome`.

use std::path::PathBuf;

use thiserror::Error;

/// The Link Resolver could not produce a download location.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("request to {url} failed: {detail}")]
    Http { url: String, detail: String },

    /// The page was fetched but no control for the platform was present.
    #[error("no download link for platform '{platform}' found on {page}")]
    PlatformNotFound { platform: String, page: String },

    #[error("cannot derive an artifact identifier from {url}")]
    InvalidUrl { url: String },
}

/// Downloading the artifact (or verifying what was downloaded) failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("download of {url} failed: {detail}")]
    Http { url: String, detail: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
}

impl FetchError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Unpacking the staged archive failed.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt archive {path}: {detail}")]
    Archive { path: PathBuf, detail: String },

    #[error("unsupported archive format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("extraction directory already exists: {path}")]
    DestinationExists { path: PathBuf },
}

impl ExtractError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// The extracted payload does not look like an installable build.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("extracted payload has no executable at {expected}")]
    MissingExecutable { expected: PathBuf },
}

/// The service manager refused or failed a stop/start request.
#[derive(Debug, Error)]
pub enum ServiceControlError {
    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Carries the manager's own diagnostic output.
    #[error("`{command}` failed ({status}): {output}")]
    Rejected {
        command: String,
        status: String,
        output: String,
    },

    #[error("service control unsupported: {0}")]
    Unsupported(String),
}

/// Swapping the installed executable failed.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("installed executable path has no parent directory: {path}")]
    NoParent { path: PathBuf },
}

impl InstallError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Writing the version record failed. Never fatal to a run.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The run lock could not be taken.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("another update run holds the lock at {path}")]
    Busy { path: PathBuf },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration could not be assembled.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `dirs::home_dir()` returned `None` and `UPDRAFT_HOME` is unset.
    #[error("cannot determine home directory; set $HOME or $UPDRAFT_HOME")]
    HomeNotFound,

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value '{value}' for {key}; expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: String,
    },
}

/// Every error that ends an update run.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("extract error: {0}")]
    Extract(#[from] ExtractError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("service control error: {0}")]
    ServiceControl(#[from] ServiceControlError),

    #[error("install error: {0}")]
    Install(#[from] InstallError),

    #[error("lock error: {0}")]
    Lock(#[from] LockError),
}

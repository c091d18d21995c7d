//! Updater configuration.
//!
//! Built once at process start and handed to the orchestrator as an
//! immutable value. Layering, lowest precedence first:
//!
//! 1. built-in defaults (derived from the state directory)
//! 2. optional YAML file (`$UPDRAFT_CONFIG` or `<state_dir>/config.yaml`)
//! 3. `UPDRAFT_*` environment variables
//!
//! # API pattern
//!
//! [`UpdaterConfig::load`] reads the process environment;
//! [`UpdaterConfig::load_with`] takes an explicit home and variable lookup
//! so tests never touch the real environment.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::paths;

pub const DEFAULT_EXECUTABLE: &str = "/opt/bedrock/bedrock_server";
pub const DEFAULT_EXECUTABLE_NAME: &str = "bedrock_server";
pub const DEFAULT_SERVICE: &str = "bedrock";
pub const DEFAULT_PLATFORM: &str = "serverBedrockLinux";
pub const DEFAULT_DOWNLOAD_PAGE: &str = "https://www.minecraft.net/en-us/download/server/bedrock";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 120;

// ---------------------------------------------------------------------------
// Service manager selector
// ---------------------------------------------------------------------------

/// Which OS service manager controls the managed service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceManager {
    #[default]
    Systemd,
    Launchd,
}

impl FromStr for ServiceManager {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "systemd" => Ok(Self::Systemd),
            "launchd" => Ok(Self::Launchd),
            other => Err(format!(
                "unknown service manager '{other}'; expected: systemd, launchd"
            )),
        }
    }
}

impl fmt::Display for ServiceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceManager::Systemd => f.write_str("systemd"),
            ServiceManager::Launchd => f.write_str("launchd"),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved, immutable configuration for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdaterConfig {
    pub state_dir: PathBuf,
    pub version_file: PathBuf,
    pub log_file: PathBuf,
    pub staging_dir: PathBuf,
    /// Installed executable that gets swapped.
    pub executable_path: PathBuf,
    /// Location of the executable inside an extracted artifact.
    pub executable_relpath: PathBuf,
    pub service_name: String,
    pub service_manager: ServiceManager,
    pub platform: String,
    pub download_page: String,
    /// Pins resolution to a fixed URL instead of scraping the page.
    pub artifact_url: Option<String>,
    /// Expected lowercase hex SHA-256 of the downloaded archive.
    pub artifact_sha256: Option<String>,
    pub http_timeout: Duration,
}

impl UpdaterConfig {
    /// Defaults rooted at `state_dir`.
    pub fn defaults_at(state_dir: &Path) -> Self {
        Self {
            state_dir: state_dir.to_path_buf(),
            version_file: paths::version_file(state_dir),
            log_file: paths::log_file(state_dir),
            staging_dir: paths::staging_dir(state_dir),
            executable_path: PathBuf::from(DEFAULT_EXECUTABLE),
            executable_relpath: PathBuf::from(DEFAULT_EXECUTABLE_NAME),
            service_name: DEFAULT_SERVICE.to_owned(),
            service_manager: ServiceManager::default(),
            platform: DEFAULT_PLATFORM.to_owned(),
            download_page: DEFAULT_DOWNLOAD_PAGE.to_owned(),
            artifact_url: None,
            artifact_sha256: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    /// Load from the process environment and `dirs::home_dir()`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(dirs::home_dir(), |key| std::env::var(key).ok())
    }

    /// Load with an explicit home directory and variable lookup.
    pub fn load_with(
        home: Option<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let state_dir = match var("UPDRAFT_HOME") {
            Some(dir) => PathBuf::from(dir),
            None => paths::state_dir(&home.ok_or(ConfigError::HomeNotFound)?),
        };

        let file_overrides = match var("UPDRAFT_CONFIG") {
            // An explicitly named file must exist.
            Some(path) => Overrides::from_file(Path::new(&path))?,
            None => {
                let default = paths::config_path(&state_dir);
                if default.exists() {
                    Overrides::from_file(&default)?
                } else {
                    Overrides::default()
                }
            }
        };
        let env_overrides = Overrides::from_env(var)?;

        let config = file_overrides
            .merge(env_overrides)
            .apply(Self::defaults_at(&state_dir));
        check_executable_name(&config.executable_relpath)?;
        Ok(config)
    }

    pub fn lock_path(&self) -> PathBuf {
        paths::lock_path(&self.state_dir)
    }

    pub fn report_path(&self) -> PathBuf {
        paths::report_path(&self.state_dir)
    }

    /// Where the executable is expected inside `extraction_dir`.
    pub fn expected_executable(&self, extraction_dir: &Path) -> PathBuf {
        extraction_dir.join(&self.executable_relpath)
    }
}

/// The executable name is joined onto the extraction directory, so it must
/// stay inside it: relative, non-empty, plain components only.
fn check_executable_name(relpath: &Path) -> Result<(), ConfigError> {
    let inside = relpath.components().next().is_some()
        && relpath
            .components()
            .all(|c| matches!(c, std::path::Component::Normal(_)));
    if inside {
        return Ok(());
    }
    Err(ConfigError::InvalidValue {
        key: "UPDRAFT_EXECUTABLE_NAME".into(),
        value: relpath.display().to_string(),
        expected: "a relative path inside the extracted archive".into(),
    })
}

// ---------------------------------------------------------------------------
// Partial layers
// ---------------------------------------------------------------------------

/// One configuration layer; `None` fields defer to the layer below.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
struct Overrides {
    version_file: Option<PathBuf>,
    log_file: Option<PathBuf>,
    staging_dir: Option<PathBuf>,
    executable_path: Option<PathBuf>,
    executable_name: Option<PathBuf>,
    service_name: Option<String>,
    service_manager: Option<ServiceManager>,
    platform: Option<String>,
    download_page: Option<String>,
    artifact_url: Option<String>,
    artifact_sha256: Option<String>,
    http_timeout_secs: Option<u64>,
}

impl Overrides {
    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn from_env(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let service_manager = var("UPDRAFT_SERVICE_MANAGER")
            .map(|value| {
                value.parse::<ServiceManager>().map_err(|_| ConfigError::InvalidValue {
                    key: "UPDRAFT_SERVICE_MANAGER".into(),
                    value,
                    expected: "systemd or launchd".into(),
                })
            })
            .transpose()?;
        let http_timeout_secs = var("UPDRAFT_HTTP_TIMEOUT_SECS")
            .map(|value| {
                value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                    key: "UPDRAFT_HTTP_TIMEOUT_SECS".into(),
                    value,
                    expected: "a whole number of seconds".into(),
                })
            })
            .transpose()?;

        Ok(Self {
            version_file: var("UPDRAFT_VERSION_FILE").map(PathBuf::from),
            log_file: var("UPDRAFT_LOG_FILE").map(PathBuf::from),
            staging_dir: var("UPDRAFT_STAGING_DIR").map(PathBuf::from),
            executable_path: var("UPDRAFT_EXECUTABLE").map(PathBuf::from),
            executable_name: var("UPDRAFT_EXECUTABLE_NAME").map(PathBuf::from),
            service_name: var("UPDRAFT_SERVICE"),
            service_manager,
            platform: var("UPDRAFT_PLATFORM"),
            download_page: var("UPDRAFT_DOWNLOAD_PAGE"),
            artifact_url: var("UPDRAFT_ARTIFACT_URL"),
            artifact_sha256: var("UPDRAFT_ARTIFACT_SHA256").map(|s| s.trim().to_ascii_lowercase()),
            http_timeout_secs,
        })
    }

    /// `other` wins wherever it is set.
    fn merge(self, other: Self) -> Self {
        Self {
            version_file: other.version_file.or(self.version_file),
            log_file: other.log_file.or(self.log_file),
            staging_dir: other.staging_dir.or(self.staging_dir),
            executable_path: other.executable_path.or(self.executable_path),
            executable_name: other.executable_name.or(self.executable_name),
            service_name: other.service_name.or(self.service_name),
            service_manager: other.service_manager.or(self.service_manager),
            platform: other.platform.or(self.platform),
            download_page: other.download_page.or(self.download_page),
            artifact_url: other.artifact_url.or(self.artifact_url),
            artifact_sha256: other.artifact_sha256.or(self.artifact_sha256),
            http_timeout_secs: other.http_timeout_secs.or(self.http_timeout_secs),
        }
    }

    fn apply(self, base: UpdaterConfig) -> UpdaterConfig {
        UpdaterConfig {
            state_dir: base.state_dir,
            version_file: self.version_file.unwrap_or(base.version_file),
            log_file: self.log_file.unwrap_or(base.log_file),
            staging_dir: self.staging_dir.unwrap_or(base.staging_dir),
            executable_path: self.executable_path.unwrap_or(base.executable_path),
            executable_relpath: self.executable_name.unwrap_or(base.executable_relpath),
            service_name: self.service_name.unwrap_or(base.service_name),
            service_manager: self.service_manager.unwrap_or(base.service_manager),
            platform: self.platform.unwrap_or(base.platform),
            download_page: self.download_page.unwrap_or(base.download_page),
            artifact_url: self.artifact_url.or(base.artifact_url),
            artifact_sha256: self.artifact_sha256.or(base.artifact_sha256),
            http_timeout: self
                .http_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(base.http_timeout),
        }
    }
}

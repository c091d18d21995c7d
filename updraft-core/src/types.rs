//! Domain types for an update run.
//!
//! All path fields use `PathBuf`. Report types serialize via serde so the
//! last-run report can be written as JSON.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::UpdateError;

/// Archive suffixes stripped when deriving an identifier from a file name.
/// Longest first so `.tar.gz` wins over `.gz`.
pub const ARCHIVE_SUFFIXES: &[&str] = &[".tar.gz", ".tgz", ".zip"];

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Opaque identifier naming one specific build.
///
/// Equal identifiers are assumed to name byte-identical binaries; equality is
/// the only test for whether an update is needed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactId(pub String);

impl ArtifactId {
    /// Derive an identifier from the file name at the end of `url`.
    ///
    /// `https://host/bin-linux/bedrock-server-1.21.zip?x=1` yields
    /// `bedrock-server-1.21`. Returns `None` when the URL has no file name.
    pub fn from_url(url: &str) -> Option<Self> {
        let name = archive_file_name(url)?;
        let stem = ARCHIVE_SUFFIXES
            .iter()
            .find_map(|suffix| name.strip_suffix(suffix))
            .unwrap_or(name);
        if stem.is_empty() {
            return None;
        }
        Some(Self(stem.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ArtifactId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ArtifactId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Last path segment of `url`, ignoring any query string or fragment.
pub fn archive_file_name(url: &str) -> Option<&str> {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let path = &url[..end];
    let without_scheme = path.split_once("://").map_or(path, |(_, rest)| rest);
    // A bare host ("http://x") has no file segment.
    let (_, tail) = without_scheme.split_once('/')?;
    let name = tail.rsplit('/').next()?;
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

// ---------------------------------------------------------------------------
// Resolution and planning
// ---------------------------------------------------------------------------

/// What a Link Resolver reports as the latest build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub artifact_id: ArtifactId,
    pub url: String,
}

/// Single-run plan. Built after resolution, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePlan {
    /// `None` on first run; never equal to any real identifier.
    pub current: Option<ArtifactId>,
    pub candidate: ArtifactId,
    pub download_url: String,
    pub staging_path: PathBuf,
    pub extraction_path: PathBuf,
}

/// Transient view of the managed service held by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Running,
    Stopped,
    Unknown,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::Running => "running",
            ServiceState::Stopped => "stopped",
            ServiceState::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Steps and outcomes
// ---------------------------------------------------------------------------

/// Named steps of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    Lock,
    ReadVersion,
    Resolve,
    Compare,
    Fetch,
    VerifyChecksum,
    Extract,
    Validate,
    StopService,
    Replace,
    StartService,
    Persist,
    Cleanup,
}

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Step::Lock => "lock",
            Step::ReadVersion => "read-version",
            Step::Resolve => "resolve",
            Step::Compare => "compare",
            Step::Fetch => "fetch",
            Step::VerifyChecksum => "verify-checksum",
            Step::Extract => "extract",
            Step::Validate => "validate",
            Step::StopService => "stop-service",
            Step::Replace => "replace",
            Step::StartService => "start-service",
            Step::Persist => "persist",
            Step::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a run failed: the step that failed and its error.
#[derive(Debug)]
pub struct UpdateFailure {
    pub step: Step,
    pub error: UpdateError,
}

impl UpdateFailure {
    pub fn new(step: Step, error: impl Into<UpdateError>) -> Self {
        Self {
            step,
            error: error.into(),
        }
    }
}

impl fmt::Display for UpdateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step '{}' failed: {}", self.step, self.error)
    }
}

impl std::error::Error for UpdateFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Terminal result of one orchestration pass.
#[derive(Debug)]
pub enum RunOutcome {
    NoUpdateNeeded,
    Updated(ArtifactId),
    Failed(UpdateFailure),
}

impl RunOutcome {
    /// `0` for `NoUpdateNeeded`/`Updated`, `1` for any failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::NoUpdateNeeded | RunOutcome::Updated(_) => 0,
            RunOutcome::Failed(_) => 1,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::NoUpdateNeeded => "no-update-needed",
            RunOutcome::Updated(_) => "updated",
            RunOutcome::Failed(_) => "failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, RunOutcome::Failed(_))
    }
}

/// Result of a side-effect-free check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub current: Option<ArtifactId>,
    pub candidate: ArtifactId,
    pub url: String,
    pub update_available: bool,
}

/// Persisted summary of the most recent run (`last-run.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: String,
    #[serde(default)]
    pub current: Option<ArtifactId>,
    #[serde(default)]
    pub candidate: Option<ArtifactId>,
    #[serde(default)]
    pub step: Option<Step>,
    #[serde(default)]
    pub error: Option<String>,
}

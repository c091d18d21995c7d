//! Update orchestrator.
//!
//! ## `run`: step sequence
//!
//! 1. `lock`           take the run lock (contention fails the run, no side effects)
//! 2. `read-version`   current identifier, absent on first run
//! 3. `resolve`        latest `{artifact_id, url}` from the Link Resolver
//! 4. `compare`        equal identifiers end the run: no download, no service call
//! 5. `fetch`          download into staging
//! 6. `verify-checksum` only when a SHA-256 is configured
//! 7. `extract`        unpack into a unique extraction directory
//! 8. `validate`       the executable must exist in the payload
//! 9. `stop-service`   opens the stopped-service window
//! 10. `replace`       swap the installed executable
//! 11. `start-service` closes the window
//! 12. `persist`       record the candidate (soft, read-back verified)
//! 13. `cleanup`       remove staging + extraction (soft)
//!
//! The service is never stopped before step 8 succeeds, and the version
//! record is never written before step 11 succeeds. Failures in steps 5 to 8
//! leave staged files behind for diagnostics until the next attempt, which
//! prunes earlier archives and extraction trees before downloading.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use uuid::Uuid;

use updraft_core::{
    types::{archive_file_name, ARCHIVE_SUFFIXES},
    ArtifactFetcher, ArtifactId, CheckReport, LinkResolver, Resolved,
    RunOutcome, RunReport, ServiceController, ServiceState, Step, UpdateError, UpdateFailure,
    UpdatePlan, UpdaterConfig, ValidationError, VersionStore,
};

use crate::guard::StoppedService;
use crate::install::replace_executable;
use crate::lock::RunLock;
use crate::report;

// ---------------------------------------------------------------------------
// Step tagging
// ---------------------------------------------------------------------------

/// Attach the failing [`Step`] to any error in the taxonomy.
trait AtStep<T> {
    fn at(self, step: Step) -> Result<T, UpdateFailure>;
}

impl<T, E: Into<UpdateError>> AtStep<T> for Result<T, E> {
    fn at(self, step: Step) -> Result<T, UpdateFailure> {
        self.map_err(|e| UpdateFailure::new(step, e))
    }
}

/// Identifiers seen during a run, for the report.
#[derive(Debug, Default)]
struct RunTrace {
    current: Option<ArtifactId>,
    candidate: Option<ArtifactId>,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator {
    config: UpdaterConfig,
    resolver: Box<dyn LinkResolver>,
    fetcher: Box<dyn ArtifactFetcher>,
    service: Box<dyn ServiceController>,
    store: Box<dyn VersionStore>,
}

impl Orchestrator {
    pub fn new(
        config: UpdaterConfig,
        resolver: Box<dyn LinkResolver>,
        fetcher: Box<dyn ArtifactFetcher>,
        service: Box<dyn ServiceController>,
        store: Box<dyn VersionStore>,
    ) -> Self {
        Self {
            config,
            resolver,
            fetcher,
            service,
            store,
        }
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    pub fn installed_version(&self) -> Option<ArtifactId> {
        self.store.get()
    }

    pub fn service_state(&self) -> ServiceState {
        self.service.query(&self.config.service_name)
    }

    /// One full pass. Safe to call repeatedly; never panics on collaborator
    /// failure.
    pub fn run(&self) -> RunOutcome {
        let started_at = Utc::now();
        let mut trace = RunTrace::default();

        let outcome = match RunLock::acquire(&self.config.lock_path()) {
            Ok(_lock) => match self.execute(&mut trace) {
                Ok(outcome) => outcome,
                Err(failure) => RunOutcome::Failed(failure),
            },
            Err(err) => RunOutcome::Failed(UpdateFailure::new(Step::Lock, err)),
        };

        match &outcome {
            RunOutcome::NoUpdateNeeded => {}
            RunOutcome::Updated(id) => tracing::info!(version = %id, "update to {id} complete"),
            RunOutcome::Failed(failure) => tracing::error!(
                step = %failure.step,
                error = %failure.error,
                "update failed during {}: {}",
                failure.step,
                failure.error
            ),
        }
        self.record(started_at, &trace, &outcome);
        outcome
    }

    /// Resolve and compare only. Never fetches, touches the service, or
    /// writes state.
    pub fn check(&self) -> Result<CheckReport, UpdateFailure> {
        let current = self.store.get();
        let Resolved { artifact_id, url } =
            self.resolver.resolve(&self.config.platform).at(Step::Resolve)?;
        Ok(CheckReport {
            update_available: current.as_ref() != Some(&artifact_id),
            current,
            candidate: artifact_id,
            url,
        })
    }

    /// Staging and extraction paths for installing `resolved` over `current`.
    ///
    /// The extraction directory name carries a random suffix so overlapping
    /// or repeated attempts never share a tree.
    pub fn plan(&self, current: Option<ArtifactId>, resolved: Resolved) -> UpdatePlan {
        let staging_dir = &self.config.staging_dir;
        let archive_name = archive_file_name(&resolved.url)
            .map(str::to_owned)
            .unwrap_or_else(|| resolved.artifact_id.to_string());
        let extraction_name = format!(
            "extract-{}-{}",
            path_safe(resolved.artifact_id.as_str()),
            Uuid::new_v4().simple()
        );

        UpdatePlan {
            current,
            staging_path: staging_dir.join(path_safe(&archive_name)),
            extraction_path: staging_dir.join(extraction_name),
            candidate: resolved.artifact_id,
            download_url: resolved.url,
        }
    }

    fn execute(&self, trace: &mut RunTrace) -> Result<RunOutcome, UpdateFailure> {
        let current = self.store.get();
        tracing::debug!(step = %Step::ReadVersion, current = ?current, "read installed version");
        trace.current = current.clone();

        let resolved = self.resolver.resolve(&self.config.platform).at(Step::Resolve)?;
        trace.candidate = Some(resolved.artifact_id.clone());

        if current.as_ref() == Some(&resolved.artifact_id) {
            tracing::info!(
                step = %Step::Compare,
                version = %resolved.artifact_id,
                "installed version {} is current; nothing to do",
                resolved.artifact_id
            );
            return Ok(RunOutcome::NoUpdateNeeded);
        }
        tracing::info!(
            step = %Step::Compare,
            current = current.as_ref().map(ArtifactId::as_str).unwrap_or("<none>"),
            candidate = %resolved.artifact_id,
            "new version available"
        );

        let plan = self.plan(current, resolved);
        self.apply(&plan)?;
        Ok(RunOutcome::Updated(plan.candidate))
    }

    fn apply(&self, plan: &UpdatePlan) -> Result<(), UpdateFailure> {
        let new_executable = self.stage(plan)?;

        let window = StoppedService::stop(self.service.as_ref(), &self.config.service_name)
            .at(Step::StopService)?;
        debug_assert_eq!(window.state(), ServiceState::Stopped);

        tracing::info!(
            step = %Step::Replace,
            path = %self.config.executable_path.display(),
            "Replacing executable"
        );
        if let Err(err) = replace_executable(&new_executable, &self.config.executable_path) {
            let failure = UpdateFailure::new(Step::Replace, err);
            window.restore(&failure);
            return Err(failure);
        }

        window.start().at(Step::StartService)?;

        self.persist(&plan.candidate);
        self.cleanup(plan);
        Ok(())
    }

    /// Fetch, verify, extract, validate. Nothing here touches the service.
    fn stage(&self, plan: &UpdatePlan) -> Result<PathBuf, UpdateFailure> {
        self.prune_staging();
        tracing::info!(
            step = %Step::Fetch,
            url = %plan.download_url,
            path = %plan.staging_path.display(),
            "Downloading {}",
            plan.candidate
        );
        self.fetcher
            .fetch(&plan.download_url, &plan.staging_path)
            .at(Step::Fetch)?;

        if let Some(expected) = self.config.artifact_sha256.as_deref() {
            updraft_fetch::verify_sha256(&plan.staging_path, expected).at(Step::VerifyChecksum)?;
        }

        tracing::info!(
            step = %Step::Extract,
            path = %plan.extraction_path.display(),
            "Extracting {}",
            plan.candidate
        );
        self.fetcher
            .extract(&plan.staging_path, &plan.extraction_path)
            .at(Step::Extract)?;

        let expected = self.config.expected_executable(&plan.extraction_path);
        if !expected.is_file() {
            return Err(UpdateFailure::new(
                Step::Validate,
                ValidationError::MissingExecutable { expected },
            ));
        }
        Ok(expected)
    }

    /// Soft: a failed write or a read-back mismatch is a warning only.
    fn persist(&self, candidate: &ArtifactId) {
        if let Err(err) = self.store.set(candidate) {
            tracing::warn!(
                step = %Step::Persist,
                version = %candidate,
                error = %err,
                "failed to record installed version; the next run will reinstall it"
            );
            return;
        }
        match self.store.get() {
            Some(read_back) if &read_back == candidate => {
                tracing::debug!(step = %Step::Persist, version = %candidate, "version recorded");
            }
            read_back => tracing::warn!(
                step = %Step::Persist,
                expected = %candidate,
                found = ?read_back,
                "version record read-back mismatch"
            ),
        }
    }

    /// Soft: failures are logged, never fatal.
    fn cleanup(&self, plan: &UpdatePlan) {
        remove_best_effort(&plan.staging_path, false);
        remove_best_effort(&plan.extraction_path, true);
        self.prune_staging();
    }

    /// Remove archives, partial downloads and extraction trees left by
    /// earlier failed attempts. Anything else in the staging directory stays.
    fn prune_staging(&self) {
        let entries = match std::fs::read_dir(&self.config.staging_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return,
            Err(err) => {
                tracing::warn!(
                    step = %Step::Cleanup,
                    path = %self.config.staging_dir.display(),
                    error = %err,
                    "cannot list staging directory"
                );
                return;
            }
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if is_staged_leftover(name, is_dir) {
                remove_best_effort(&entry.path(), is_dir);
            }
        }
    }

    fn record(&self, started_at: chrono::DateTime<Utc>, trace: &RunTrace, outcome: &RunOutcome) {
        let (step, error) = match outcome {
            RunOutcome::Failed(failure) => (Some(failure.step), Some(failure.error.to_string())),
            _ => (None, None),
        };
        let entry = RunReport {
            started_at,
            finished_at: Utc::now(),
            outcome: outcome.label().to_string(),
            current: trace.current.clone(),
            candidate: trace.candidate.clone(),
            step,
            error,
        };
        let path = self.config.report_path();
        if let Err(err) = report::save_at(&path, &entry) {
            tracing::warn!(path = %path.display(), error = %err, "failed to write run report");
        }
    }
}

fn remove_best_effort(path: &Path, is_dir: bool) {
    let result = if is_dir {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    match result {
        Ok(()) => tracing::debug!(step = %Step::Cleanup, path = %path.display(), "removed"),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => tracing::warn!(
            step = %Step::Cleanup,
            path = %path.display(),
            error = %err,
            "cleanup failed"
        ),
    }
}

fn is_staged_leftover(name: &str, is_dir: bool) -> bool {
    if is_dir {
        return name.starts_with("extract-");
    }
    let name = name.strip_suffix(".part").unwrap_or(name);
    ARCHIVE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Replace anything outside `[A-Za-z0-9._-]` so identifiers are safe as a
/// single path component.
fn path_safe(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

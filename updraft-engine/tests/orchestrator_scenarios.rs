//! End-to-end orchestrator runs against recording fakes.
//!
//! Every fake appends to one shared call log so ordering across
//! collaborators (fetch before stop, start before set) can be asserted.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use updraft_core::{
    ArtifactFetcher, ArtifactId, ExtractError, FetchError, LinkResolver, PersistError,
    ResolutionError, Resolved, RunOutcome, ServiceControlError, ServiceController, Step,
    UpdateError, UpdaterConfig, VersionStore,
};
use updraft_engine::{report, Orchestrator, RunLock};

type CallLog = Arc<Mutex<Vec<String>>>;

fn push(log: &CallLog, entry: impl Into<String>) {
    log.lock().unwrap().push(entry.into());
}

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

struct FakeResolver {
    log: CallLog,
    latest: Option<&'static str>,
}

impl LinkResolver for FakeResolver {
    fn resolve(&self, platform: &str) -> Result<Resolved, ResolutionError> {
        push(&self.log, "resolve");
        match self.latest {
            Some(id) => Ok(Resolved {
                artifact_id: ArtifactId::from(id),
                url: format!("http://downloads.test/{id}.zip"),
            }),
            None => Err(ResolutionError::PlatformNotFound {
                platform: platform.to_owned(),
                page: "http://downloads.test/".into(),
            }),
        }
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Payload {
    WithExecutable,
    Empty,
}

struct FakeFetcher {
    log: CallLog,
    fail_fetch: bool,
    fail_extract: bool,
    payload: Payload,
}

impl ArtifactFetcher for FakeFetcher {
    fn fetch(&self, url: &str, staging_path: &Path) -> Result<(), FetchError> {
        push(&self.log, "fetch");
        if self.fail_fetch {
            return Err(FetchError::Http {
                url: url.to_owned(),
                detail: "HTTP 503 Service Unavailable".into(),
            });
        }
        std::fs::create_dir_all(staging_path.parent().unwrap()).unwrap();
        std::fs::write(staging_path, b"archive-bytes").unwrap();
        Ok(())
    }

    fn extract(&self, staging_path: &Path, extraction_path: &Path) -> Result<(), ExtractError> {
        push(&self.log, "extract");
        std::fs::create_dir_all(extraction_path).unwrap();
        if self.fail_extract {
            return Err(ExtractError::Archive {
                path: staging_path.to_owned(),
                detail: "invalid central directory".into(),
            });
        }
        if self.payload == Payload::WithExecutable {
            std::fs::write(extraction_path.join("bedrock_server"), b"new-binary").unwrap();
        }
        Ok(())
    }
}

struct FakeService {
    log: CallLog,
    fail_stop: bool,
    fail_start: bool,
}

impl ServiceController for FakeService {
    fn stop(&self, _service: &str) -> Result<(), ServiceControlError> {
        push(&self.log, "stop");
        if self.fail_stop {
            return Err(ServiceControlError::Unsupported("stop refused".into()));
        }
        Ok(())
    }

    fn start(&self, _service: &str) -> Result<(), ServiceControlError> {
        push(&self.log, "start");
        if self.fail_start {
            return Err(ServiceControlError::Unsupported("start refused".into()));
        }
        Ok(())
    }
}

struct MemoryStore {
    log: CallLog,
    value: Arc<Mutex<Option<ArtifactId>>>,
    fail_set: bool,
}

impl VersionStore for MemoryStore {
    fn get(&self) -> Option<ArtifactId> {
        self.value.lock().unwrap().clone()
    }

    fn set(&self, id: &ArtifactId) -> Result<(), PersistError> {
        push(&self.log, format!("set {id}"));
        if self.fail_set {
            return Err(PersistError::Io {
                path: PathBuf::from("installed-version"),
                source: std::io::Error::other("disk full"),
            });
        }
        *self.value.lock().unwrap() = Some(id.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harness {
    tmp: TempDir,
    config: UpdaterConfig,
    log: CallLog,
    stored: Arc<Mutex<Option<ArtifactId>>>,
    latest: Option<&'static str>,
    fail_fetch: bool,
    fail_extract: bool,
    payload: Payload,
    fail_stop: bool,
    fail_start: bool,
    fail_set: bool,
}

impl Harness {
    fn new() -> Self {
        let tmp = TempDir::new().expect("tmp");
        let mut config = UpdaterConfig::defaults_at(&tmp.path().join("state"));
        config.executable_path = tmp.path().join("srv").join("bedrock_server");
        std::fs::create_dir_all(tmp.path().join("srv")).unwrap();
        std::fs::write(&config.executable_path, b"old-binary").unwrap();

        Self {
            tmp,
            config,
            log: CallLog::default(),
            stored: Arc::default(),
            latest: Some("build-101"),
            fail_fetch: false,
            fail_extract: false,
            payload: Payload::WithExecutable,
            fail_stop: false,
            fail_start: false,
            fail_set: false,
        }
    }

    fn installed(self, id: &str) -> Self {
        *self.stored.lock().unwrap() = Some(ArtifactId::from(id));
        self
    }

    fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(
            self.config.clone(),
            Box::new(FakeResolver {
                log: self.log.clone(),
                latest: self.latest,
            }),
            Box::new(FakeFetcher {
                log: self.log.clone(),
                fail_fetch: self.fail_fetch,
                fail_extract: self.fail_extract,
                payload: self.payload,
            }),
            Box::new(FakeService {
                log: self.log.clone(),
                fail_stop: self.fail_stop,
                fail_start: self.fail_start,
            }),
            Box::new(MemoryStore {
                log: self.log.clone(),
                value: self.stored.clone(),
                fail_set: self.fail_set,
            }),
        )
    }

    fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn service_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c == "stop" || c == "start")
            .collect()
    }

    fn stored(&self) -> Option<ArtifactId> {
        self.stored.lock().unwrap().clone()
    }

    fn executable(&self) -> String {
        std::fs::read_to_string(&self.config.executable_path).unwrap()
    }

    fn staging_entries(&self) -> usize {
        std::fs::read_dir(&self.config.staging_dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Run once with a capturing subscriber; returns the outcome and log text.
fn run_logged(orchestrator: &Orchestrator) -> (RunOutcome, String) {
    let captured = Captured::default();
    let sink = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || sink.clone())
        .finish();
    let outcome = tracing::subscriber::with_default(subscriber, || orchestrator.run());
    let text = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
    (outcome, text)
}

fn failed_step(outcome: &RunOutcome) -> Step {
    match outcome {
        RunOutcome::Failed(failure) => failure.step,
        other => panic!("expected failure, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn current_version_is_a_no_op() {
    let h = Harness::new().installed("build-101");

    let (outcome, logs) = run_logged(&h.orchestrator());

    assert!(matches!(outcome, RunOutcome::NoUpdateNeeded));
    assert_eq!(h.calls(), vec!["resolve"]);
    assert!(!logs.contains("Stopping"), "logs: {logs}");
    assert!(!logs.contains("Downloading"), "logs: {logs}");
    assert_eq!(h.executable(), "old-binary");
}

#[test]
fn first_install_stops_replaces_starts_and_records() {
    let h = Harness::new();

    let (outcome, logs) = run_logged(&h.orchestrator());

    assert!(
        matches!(outcome, RunOutcome::Updated(ref id) if id.as_str() == "build-101"),
        "got {outcome:?}"
    );
    assert_eq!(
        h.calls(),
        vec!["resolve", "fetch", "extract", "stop", "start", "set build-101"]
    );
    assert_eq!(h.stored(), Some(ArtifactId::from("build-101")));
    assert_eq!(h.executable(), "new-binary");
    assert_eq!(h.staging_entries(), 0, "staging is cleaned up on success");
    assert!(logs.contains("Downloading build-101"), "logs: {logs}");
    assert!(logs.contains("Stopping service bedrock"), "logs: {logs}");
}

#[test]
fn upgrade_keeps_previous_executable() {
    let h = Harness::new().installed("build-100");

    let outcome = h.orchestrator().run();

    assert!(matches!(outcome, RunOutcome::Updated(_)));
    let previous = h.tmp.path().join("srv").join("bedrock_server.previous");
    assert_eq!(std::fs::read_to_string(previous).unwrap(), "old-binary");
}

#[test]
fn second_run_after_update_is_idempotent() {
    let h = Harness::new();
    let orchestrator = h.orchestrator();

    assert!(matches!(orchestrator.run(), RunOutcome::Updated(_)));
    assert!(matches!(orchestrator.run(), RunOutcome::NoUpdateNeeded));

    assert_eq!(h.service_calls(), vec!["stop", "start"]);
}

#[test]
fn replace_failure_restarts_service_and_keeps_version() {
    let mut h = Harness::new().installed("build-100");
    // A regular file where the install directory should be.
    let blocker = h.tmp.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();
    h.config.executable_path = blocker.join("bedrock_server");

    let (outcome, logs) = run_logged(&h.orchestrator());

    assert_eq!(failed_step(&outcome), Step::Replace);
    assert!(matches!(
        outcome,
        RunOutcome::Failed(ref f) if matches!(f.error, UpdateError::Install(_))
    ));
    assert_eq!(h.service_calls(), vec!["stop", "start"]);
    assert_eq!(h.stored(), Some(ArtifactId::from("build-100")));
    assert!(logs.contains("replace"), "logs name the failing step: {logs}");
}

#[test]
fn missing_executable_fails_validation_without_touching_service() {
    let mut h = Harness::new().installed("build-100");
    h.payload = Payload::Empty;

    let outcome = h.orchestrator().run();

    assert_eq!(failed_step(&outcome), Step::Validate);
    assert!(h.service_calls().is_empty());
    assert_eq!(h.stored(), Some(ArtifactId::from("build-100")));
    assert_eq!(h.executable(), "old-binary");
    assert!(h.staging_entries() > 0, "staged files kept for diagnostics");
}

#[test]
fn resolution_failure_touches_nothing() {
    let mut h = Harness::new().installed("build-100");
    h.latest = None;

    let outcome = h.orchestrator().run();

    assert_eq!(failed_step(&outcome), Step::Resolve);
    assert_eq!(h.calls(), vec!["resolve"]);
    assert_eq!(outcome.exit_code(), 1);
}

#[test]
fn fetch_failure_leaves_service_running() {
    let mut h = Harness::new();
    h.fail_fetch = true;

    let outcome = h.orchestrator().run();

    assert_eq!(failed_step(&outcome), Step::Fetch);
    assert!(h.service_calls().is_empty());
    assert_eq!(h.stored(), None);
}

#[test]
fn extract_failure_leaves_service_and_version_alone() {
    let mut h = Harness::new().installed("build-100");
    h.fail_extract = true;

    let (outcome, logs) = run_logged(&h.orchestrator());

    assert_eq!(failed_step(&outcome), Step::Extract);
    assert!(matches!(
        outcome,
        RunOutcome::Failed(ref f) if matches!(f.error, UpdateError::Extract(_))
    ));
    assert_eq!(h.calls(), vec!["resolve", "fetch", "extract"]);
    assert!(h.service_calls().is_empty());
    assert_eq!(h.stored(), Some(ArtifactId::from("build-100")));
    assert_eq!(h.executable(), "old-binary");
    assert!(h.staging_entries() > 0, "staged files kept for diagnostics");
    assert!(logs.contains("invalid central directory"), "logs: {logs}");
}

#[test]
fn repeated_failures_do_not_accumulate_staged_files() {
    let mut h = Harness::new().installed("build-100");
    h.payload = Payload::Empty;
    let unrelated = h.config.staging_dir.join("operator-notes.txt");

    for _ in 0..3 {
        assert_eq!(failed_step(&h.orchestrator().run()), Step::Validate);
    }
    std::fs::write(&unrelated, b"keep me").unwrap();
    // The archive and the latest extraction tree only.
    assert_eq!(h.staging_entries(), 3);

    h.payload = Payload::WithExecutable;
    assert!(matches!(h.orchestrator().run(), RunOutcome::Updated(_)));

    assert_eq!(h.staging_entries(), 1);
    assert!(unrelated.exists());
}

#[test]
fn checksum_mismatch_stops_before_service() {
    let mut h = Harness::new();
    h.config.artifact_sha256 = Some("0".repeat(64));

    let outcome = h.orchestrator().run();

    assert_eq!(failed_step(&outcome), Step::VerifyChecksum);
    assert!(!h.calls().contains(&"extract".to_string()));
    assert!(h.service_calls().is_empty());
}

#[test]
fn stop_failure_attempts_one_restart() {
    let mut h = Harness::new().installed("build-100");
    h.fail_stop = true;

    let outcome = h.orchestrator().run();

    assert_eq!(failed_step(&outcome), Step::StopService);
    assert_eq!(h.service_calls(), vec!["stop", "start"]);
    assert_eq!(h.executable(), "old-binary");
    assert_eq!(h.stored(), Some(ArtifactId::from("build-100")));
}

#[test]
fn start_failure_is_reported_and_version_not_written() {
    let mut h = Harness::new().installed("build-100");
    h.fail_start = true;

    let outcome = h.orchestrator().run();

    assert_eq!(failed_step(&outcome), Step::StartService);
    assert_eq!(h.service_calls(), vec!["stop", "start"]);
    assert_eq!(h.stored(), Some(ArtifactId::from("build-100")));
}

#[test]
fn persist_failure_still_counts_as_updated() {
    let mut h = Harness::new();
    h.fail_set = true;

    let (outcome, logs) = run_logged(&h.orchestrator());

    assert!(matches!(outcome, RunOutcome::Updated(_)));
    assert_eq!(h.executable(), "new-binary");
    assert!(logs.contains("failed to record installed version"), "logs: {logs}");
}

#[test]
fn held_lock_fails_run_without_side_effects() {
    let h = Harness::new();
    let _held = RunLock::acquire(&h.config.lock_path()).expect("lock");

    let outcome = h.orchestrator().run();

    assert_eq!(failed_step(&outcome), Step::Lock);
    assert!(h.calls().is_empty());
}

#[test]
fn run_report_records_failing_step() {
    let mut h = Harness::new().installed("build-100");
    h.payload = Payload::Empty;

    h.orchestrator().run();

    let saved = report::load_at(&h.config.report_path()).expect("report written");
    assert_eq!(saved.outcome, "failed");
    assert_eq!(saved.step, Some(Step::Validate));
    assert_eq!(saved.current, Some(ArtifactId::from("build-100")));
    assert_eq!(saved.candidate, Some(ArtifactId::from("build-101")));
    assert!(saved.error.is_some());
}

#[test]
fn check_reports_without_side_effects() {
    let h = Harness::new().installed("build-100");

    let check = h.orchestrator().check().expect("check");

    assert!(check.update_available);
    assert_eq!(check.candidate, ArtifactId::from("build-101"));
    assert_eq!(h.calls(), vec!["resolve"]);
    assert!(!h.config.report_path().exists());
}

#[test]
fn plans_use_fresh_extraction_directories() {
    let h = Harness::new();
    let orchestrator = h.orchestrator();
    let resolved = Resolved {
        artifact_id: ArtifactId::from("build-101"),
        url: "http://downloads.test/build-101.zip".into(),
    };

    let a = orchestrator.plan(None, resolved.clone());
    let b = orchestrator.plan(None, resolved);

    assert_eq!(a.staging_path, h.config.staging_dir.join("build-101.zip"));
    assert_ne!(a.extraction_path, b.extraction_path);
    assert!(a.extraction_path.starts_with(&h.config.staging_dir));
}

//! Last-run report: `<state_dir>/last-run.json`.
//!
//! Writes use the `.tmp` + rename pattern so readers never see a torn file.

use std::path::Path;

use updraft_core::RunReport;

use crate::error::{io_err, ReportError};

/// Load the report at `path`; `None` if missing or unparseable.
pub fn load_at(path: &Path) -> Option<RunReport> {
    let contents = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(report) => Some(report),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable run report");
            None
        }
    }
}

/// Save `report` atomically at `path`.
pub fn save_at(path: &Path, report: &RunReport) -> Result<(), ReportError> {
    let Some(dir) = path.parent() else {
        return Err(io_err(
            path,
            std::io::Error::other("invalid run report path"),
        ));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let json = serde_json::to_string_pretty(report)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::TempDir;
    use updraft_core::{ArtifactId, Step};

    use super::*;

    fn sample() -> RunReport {
        RunReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            outcome: "failed".into(),
            current: Some(ArtifactId::from("build-100")),
            candidate: Some(ArtifactId::from("build-101")),
            step: Some(Step::Replace),
            error: Some("install error: disk full".into()),
        }
    }

    #[test]
    fn missing_report_is_none() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(load_at(&tmp.path().join("last-run.json")), None);
    }

    #[test]
    fn saved_report_loads_back() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("last-run.json");
        let report = sample();
        save_at(&path, &report).unwrap();
        assert_eq!(load_at(&path), Some(report));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn step_is_serialized_kebab_case() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("last-run.json");
        save_at(&path, &sample()).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains(r#""step": "replace""#), "raw: {raw}");
    }

    #[test]
    fn corrupt_report_is_none() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("last-run.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_at(&path), None);
    }
}

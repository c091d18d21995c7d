//! Default on-disk layout under the updraft state directory.
//!
//! ```text
//! ~/.updraft/
//!   config.yaml           (optional)
//!   installed-version     (version record)
//!   last-run.json         (report of the most recent run)
//!   updraft.lock          (run lock)
//!   logs/updraft.log      (log sink)
//!   staging/              (downloaded archives + extraction dirs)
//! ```

use std::path::{Path, PathBuf};

pub const STATE_DIR_NAME: &str = ".updraft";
pub const CONFIG_FILE: &str = "config.yaml";
pub const VERSION_FILE: &str = "installed-version";
pub const REPORT_FILE: &str = "last-run.json";
pub const LOCK_FILE: &str = "updraft.lock";
pub const LOG_FILE: &str = "updraft.log";

pub fn state_dir(home: &Path) -> PathBuf {
    home.join(STATE_DIR_NAME)
}

pub fn config_path(state_dir: &Path) -> PathBuf {
    state_dir.join(CONFIG_FILE)
}

pub fn version_file(state_dir: &Path) -> PathBuf {
    state_dir.join(VERSION_FILE)
}

pub fn report_path(state_dir: &Path) -> PathBuf {
    state_dir.join(REPORT_FILE)
}

pub fn lock_path(state_dir: &Path) -> PathBuf {
    state_dir.join(LOCK_FILE)
}

pub fn logs_dir(state_dir: &Path) -> PathBuf {
    state_dir.join("logs")
}

pub fn log_file(state_dir: &Path) -> PathBuf {
    logs_dir(state_dir).join(LOG_FILE)
}

pub fn staging_dir(state_dir: &Path) -> PathBuf {
    state_dir.join("staging")
}

pub mod check;
pub mod logs;
pub mod run;
pub mod schedule;
pub mod status;
pub mod watch;

use anyhow::{Context, Result};
use updraft_core::UpdaterConfig;
use updraft_engine::Orchestrator;

/// Configuration for commands that only read state.
pub fn load_config() -> Result<UpdaterConfig> {
    UpdaterConfig::load().context("failed to load updraft configuration")
}

/// Configuration plus the log sink, for commands that run the orchestrator.
pub fn load_config_with_logging() -> Result<UpdaterConfig> {
    let config = load_config()?;
    updraft_daemon::rotate_sink(&config.log_file);
    updraft_daemon::logging::init(&config.log_file);
    Ok(config)
}

pub fn orchestrator(config: UpdaterConfig) -> Result<Orchestrator> {
    let manager = config.service_manager;
    updraft_engine::from_config(config)
        .with_context(|| format!("service manager '{manager}' is not usable on this host"))
}

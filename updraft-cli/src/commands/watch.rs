//! `updraft watch`: periodic runs in the foreground until ctrl-c.

use anyhow::{Context, Result};
use clap::Args;

use crate::IntervalArg;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Time between runs (`300`, `90s`, `15m`, `2h`).
    #[arg(long, default_value = "15m")]
    pub interval: IntervalArg,
}

impl WatchArgs {
    pub fn run(self) -> Result<()> {
        let config = super::load_config_with_logging()?;
        let orchestrator = super::orchestrator(config)?;

        let summary = updraft_daemon::watch_blocking(orchestrator, self.interval.into())
            .context("watch runtime exited with error")?;
        println!(
            "{} runs, {} updates, {} failures",
            summary.runs, summary.updates, summary.failures
        );
        Ok(())
    }
}

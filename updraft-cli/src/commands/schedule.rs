//! `updraft schedule`: print units for an external scheduler.

use anyhow::{Context, Result};
use clap::Args;

use updraft_core::ServiceManager;
use updraft_service::schedule::{launchd_plist, systemd_units, SCHEDULE_LABEL};

use crate::IntervalArg;

#[derive(Args, Debug)]
pub struct ScheduleArgs {
    /// Scheduler to target; defaults to the configured service manager.
    #[arg(long)]
    pub manager: Option<ServiceManager>,

    /// Time between runs (`300`, `90s`, `15m`, `2h`).
    #[arg(long, default_value = "1h")]
    pub interval: IntervalArg,
}

impl ScheduleArgs {
    pub fn run(self) -> Result<()> {
        let config = super::load_config()?;
        let binary = std::env::current_exe().context("could not locate the updraft binary")?;
        let log_dir = config
            .log_file
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| config.state_dir.clone());

        match self.manager.unwrap_or(config.service_manager) {
            ServiceManager::Launchd => {
                println!("<!-- ~/Library/LaunchAgents/{SCHEDULE_LABEL}.plist -->");
                print!("{}", launchd_plist(&binary, self.interval.into(), &log_dir));
            }
            ServiceManager::Systemd => {
                let (service, timer) = systemd_units(&binary, self.interval.into());
                println!("# /etc/systemd/system/updraft.service");
                print!("{service}");
                println!();
                println!("# /etc/systemd/system/updraft.timer");
                print!("{timer}");
            }
        }
        Ok(())
    }
}

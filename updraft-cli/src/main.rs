//! updraft: unattended server updater.
//!
//! # Usage
//!
//! ```text
//! updraft run
//! updraft check [--json]
//! updraft status [--json]
//! updraft watch [--interval 15m]
//! updraft logs [--lines 100]
//! updraft schedule [--manager systemd|launchd] [--interval 1h]
//! ```
//!
//! `run` and `check` exit `1` on failure; everything is configured through
//! `UPDRAFT_*` environment variables and an optional `config.yaml`.

mod commands;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    check::CheckArgs, logs::LogsArgs, run::RunArgs, schedule::ScheduleArgs, status::StatusArgs,
    watch::WatchArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "updraft",
    version,
    about = "Keep a managed server binary on its latest published build",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve, download, and install the latest build if it differs.
    Run(RunArgs),

    /// Report whether an update is available without changing anything.
    Check(CheckArgs),

    /// Show the installed version, service state, and last run.
    Status(StatusArgs),

    /// Run periodically until interrupted.
    Watch(WatchArgs),

    /// Print recent log sink lines.
    Logs(LogsArgs),

    /// Print scheduler units that invoke `updraft run` periodically.
    Schedule(ScheduleArgs),
}

// ---------------------------------------------------------------------------
// Shared interval argument
// ---------------------------------------------------------------------------

/// Interval parsed from `90`, `90s`, `15m` or `2h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalArg(pub Duration);

impl FromStr for IntervalArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let (digits, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
            Some(idx) => s.split_at(idx),
            None => (s, "s"),
        };
        let value: u64 = digits
            .parse()
            .map_err(|_| format!("invalid interval '{s}'; expected e.g. 300, 90s, 15m, 2h"))?;
        let scale = match unit {
            "s" => 1,
            "m" => 60,
            "h" => 3600,
            other => return Err(format!("unknown interval unit '{other}'; expected: s, m, h")),
        };
        let secs = value
            .checked_mul(scale)
            .ok_or_else(|| format!("interval '{s}' is too large"))?;
        if secs == 0 {
            return Err("interval must be greater than zero".to_string());
        }
        Ok(Self(Duration::from_secs(secs)))
    }
}

impl fmt::Display for IntervalArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0.as_secs())
    }
}

impl From<IntervalArg> for Duration {
    fn from(i: IntervalArg) -> Self {
        i.0
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Check(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Watch(args) => args.run(),
        Commands::Logs(args) => args.run(),
        Commands::Schedule(args) => args.run(),
    }
}

//! `updraft status`: installed version, service state, and the last run.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use updraft_core::{FileVersionStore, RunReport, ServiceState, UpdaterConfig, VersionStore};
use updraft_engine::report;

/// Arguments for `updraft status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let config = super::load_config()?;
        let status = collect(&config);

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&status).context("failed to serialize status JSON")?
            );
            return Ok(());
        }
        print_table(&status);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct Status {
    installed: Option<String>,
    service: String,
    service_state: ServiceState,
    executable: String,
    version_file: String,
    log_file: String,
    last_run: Option<RunReport>,
}

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "item")]
    item: &'static str,
    #[tabled(rename = "value")]
    value: String,
}

fn collect(config: &UpdaterConfig) -> Status {
    let installed = FileVersionStore::new(config.version_file.clone())
        .get()
        .map(|id| id.to_string());
    // An unusable service manager (launchd off macOS) reads as unknown.
    let service_state = super::orchestrator(config.clone())
        .map(|o| o.service_state())
        .unwrap_or(ServiceState::Unknown);

    Status {
        installed,
        service: config.service_name.clone(),
        service_state,
        executable: config.executable_path.display().to_string(),
        version_file: config.version_file.display().to_string(),
        log_file: config.log_file.display().to_string(),
        last_run: report::load_at(&config.report_path()),
    }
}

fn print_table(status: &Status) {
    println!("updraft v{}", env!("CARGO_PKG_VERSION"));

    let mut rows = vec![
        StatusRow {
            item: "installed",
            value: status.installed.clone().unwrap_or_else(|| "none".to_string()),
        },
        StatusRow {
            item: "service",
            value: format!("{} ({})", status.service, state_label(status.service_state)),
        },
        StatusRow {
            item: "executable",
            value: status.executable.clone(),
        },
        StatusRow {
            item: "version file",
            value: status.version_file.clone(),
        },
        StatusRow {
            item: "log file",
            value: status.log_file.clone(),
        },
    ];
    match &status.last_run {
        Some(run) => {
            rows.push(StatusRow {
                item: "last run",
                value: format!("{} ({})", outcome_label(run), format_age(run.finished_at)),
            });
            if let Some(error) = &run.error {
                rows.push(StatusRow {
                    item: "last error",
                    value: error.clone(),
                });
            }
        }
        None => rows.push(StatusRow {
            item: "last run",
            value: "never".to_string(),
        }),
    }

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn state_label(state: ServiceState) -> String {
    match state {
        ServiceState::Running => "running".green().to_string(),
        ServiceState::Stopped => "stopped".red().to_string(),
        ServiceState::Unknown => "unknown".bright_black().to_string(),
    }
}

fn outcome_label(run: &RunReport) -> String {
    match (run.outcome.as_str(), run.step) {
        ("failed", Some(step)) => format!("{} at {step}", "FAILED".red().bold()),
        ("failed", None) => "FAILED".red().bold().to_string(),
        ("updated", _) => {
            let to = run.candidate.as_ref().map(|c| c.to_string()).unwrap_or_default();
            format!("{} {to}", "UPDATED".green().bold())
        }
        (other, _) => other.to_uppercase(),
    }
}

fn format_age(at: DateTime<Utc>) -> String {
    let secs = (Utc::now() - at).num_seconds().max(0);
    match secs {
        0..=59 => format!("{secs}s ago"),
        60..=3599 => format!("{}m ago", secs / 60),
        3600..=86_399 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86_400),
    }
}

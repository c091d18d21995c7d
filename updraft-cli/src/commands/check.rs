//! `updraft check`: resolve and compare only.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        let config = super::load_config_with_logging()?;
        let orchestrator = super::orchestrator(config)?;

        let report = match orchestrator.check() {
            Ok(report) => report,
            Err(failure) => {
                tracing::error!(step = %failure.step, error = %failure.error, "check failed");
                eprintln!("{} check failed: {}", "✗".red().bold(), failure);
                std::process::exit(1);
            }
        };

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize check JSON")?
            );
            return Ok(());
        }

        let current = report
            .current
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "none".to_string());
        if report.update_available {
            println!(
                "{} update available: {} → {}",
                "↑".yellow().bold(),
                current,
                report.candidate.to_string().bold()
            );
            println!("  {}", report.url.bright_black());
        } else {
            println!("{} up to date ({})", "✓".green().bold(), current);
        }
        Ok(())
    }
}

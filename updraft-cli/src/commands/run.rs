//! `updraft run`: one full update pass.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use updraft_core::RunOutcome;

#[derive(Args, Debug)]
pub struct RunArgs {}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let config = super::load_config_with_logging()?;
        let orchestrator = super::orchestrator(config)?;

        let outcome = orchestrator.run();
        match &outcome {
            RunOutcome::NoUpdateNeeded => println!("{} already up to date", "✓".green().bold()),
            RunOutcome::Updated(id) => {
                println!("{} updated to {}", "✓".green().bold(), id.to_string().bold())
            }
            RunOutcome::Failed(failure) => eprintln!(
                "{} update failed during {}: {}",
                "✗".red().bold(),
                failure.step.to_string().bold(),
                failure.error
            ),
        }

        if outcome.is_failure() {
            std::process::exit(outcome.exit_code());
        }
        Ok(())
    }
}

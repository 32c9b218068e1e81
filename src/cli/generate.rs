//! `generate`: write the test properties file and workspace state.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::ConfigArgs;
use crate::generator::{Outcome, TestPropertiesGenerator};

/// Generate the test properties file and workspace state for a project of the reactor.
///
/// Does nothing when neither the tracked inputs, the settings, nor the outputs changed since
/// the last run.
#[derive(Debug, Args)]
pub struct GenerateCommand {
    #[command(flatten)]
    config: ConfigArgs,
}

impl GenerateCommand {
    /// Run the generator and report what it did.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error of the generation pass.
    pub fn execute(self) -> Result<()> {
        let config = self.config.load()?;

        match TestPropertiesGenerator::new(&config).execute()? {
            Outcome::UpToDate => {
                println!("{} {}", "up to date".green(), config.output_file.display());
            }
            Outcome::Generated { properties, workspace } => {
                println!("{} {}", "generated".green().bold(), properties.display());
                println!("{} {}", "generated".green().bold(), workspace.display());
            }
        }
        Ok(())
    }
}

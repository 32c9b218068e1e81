//! `status`: report whether `generate` has work to do.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::ConfigArgs;
use crate::generator::TestPropertiesGenerator;

/// Report whether the generated files are stale. Writes nothing.
#[derive(Debug, Args)]
pub struct StatusCommand {
    #[command(flatten)]
    config: ConfigArgs,
}

impl StatusCommand {
    /// Evaluate the incremental gate and print the verdict.
    ///
    /// # Errors
    ///
    /// Fails if the configuration cannot be loaded.
    pub fn execute(self) -> Result<()> {
        let config = self.config.load()?;

        if TestPropertiesGenerator::new(&config).status()? {
            println!("{}", "regeneration required".yellow());
        } else {
            println!("{}", "up to date".green());
        }
        Ok(())
    }
}

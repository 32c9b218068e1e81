//! `verify-log`: assertions over a build log for CI scripts.

use anyhow::Result;
use clap::{ArgGroup, Args};
use colored::Colorize;
use std::path::PathBuf;

use crate::verifier::VerifierResult;

/// Check a build log. Exits non-zero on the first failed check.
#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("checks").required(true).multiple(true).args(["error_free", "contains"])
))]
pub struct VerifyLogCommand {
    /// Build log to inspect; a missing file counts as empty
    #[arg(long, value_name = "FILE")]
    log: PathBuf,

    /// Fail if any line contains [ERROR]
    #[arg(long)]
    error_free: bool,

    /// Fail unless some line contains TEXT (repeatable)
    #[arg(long, value_name = "TEXT")]
    contains: Vec<String>,
}

impl VerifyLogCommand {
    /// Run the requested checks.
    ///
    /// # Errors
    ///
    /// Returns a verification error describing the first failed check.
    pub fn execute(self) -> Result<()> {
        let result = VerifierResult::load(&self.log);
        tracing::debug!("Read {} lines from {}", result.lines().len(), self.log.display());

        if self.error_free {
            result.assert_error_free_log()?;
        }
        for text in &self.contains {
            result.assert_log_text(text)?;
        }

        println!("{} {}", "verified".green(), self.log.display());
        Ok(())
    }
}

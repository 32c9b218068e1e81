//! Command-line interface for reactor-testprops.
//!
//! # Available Commands
//!
//! - `generate` - Write the test properties file and workspace state for a project
//! - `status` - Report whether `generate` would regenerate anything
//! - `verify-log` - Check a build log for errors or expected text
//!
//! # Examples
//!
//! ```bash
//! # Generate for the manifest's root project
//! testprops generate
//!
//! # Pick another project of the reactor and add an ambient property
//! testprops generate --reactor build/reactor.toml --project g:b --property db.host=localhost
//!
//! # Fail a CI step when a build log mentions an error
//! testprops verify-log --log target/build.log --error-free --contains "BUILD SUCCESS"
//! ```
//!
//! # Logging
//!
//! Diagnostics go to stderr through `tracing`. `RUST_LOG` takes precedence over
//! `--verbose` and `--quiet`.

mod common;
mod generate;
mod status;
mod verify_log;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

pub use common::ConfigArgs;
pub use generate::GenerateCommand;
pub use status::StatusCommand;
pub use verify_log::VerifyLogCommand;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "testprops",
    about = "Generate test properties and workspace state for reactor builds",
    version,
    long_about = "Generates the test.properties file and workspace-state file an integration test \
                  of a multi-module build needs, and skips the work when nothing changed."
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output.
    ///
    /// Equivalent to `RUST_LOG=debug`. Mutually exclusive with `--quiet`.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate the test properties file and workspace state
    Generate(GenerateCommand),
    /// Report whether generation would do any work
    Status(StatusCommand),
    /// Verify a build log
    #[command(name = "verify-log")]
    VerifyLog(VerifyLogCommand),
}

impl Cli {
    /// Initialize logging and run the selected command.
    ///
    /// # Errors
    ///
    /// Returns the command's error; the caller turns it into a message and exit code.
    pub fn execute(self) -> Result<()> {
        self.init_logging();

        match self.command {
            Commands::Generate(cmd) => cmd.execute(),
            Commands::Status(cmd) => cmd.execute(),
            Commands::VerifyLog(cmd) => cmd.execute(),
        }
    }

    /// The log filter directive implied by the global flags.
    #[must_use]
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }

    fn init_logging(&self) {
        let filter = if std::env::var_os("RUST_LOG").is_some() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(self.log_level())
        };

        // A subscriber may already be installed when running inside tests
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

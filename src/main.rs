//! `testprops` entry point.
//!
//! Parses the command line, runs the command and turns errors into a readable message with
//! exit code 1.

use clap::Parser;
use reactor_testprops::cli;
use reactor_testprops::core::user_friendly_error;

fn main() {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    if let Err(e) = cli.execute() {
        user_friendly_error(e).display();
        std::process::exit(1);
    }
}

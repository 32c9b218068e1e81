//! Integration test suite for reactor-testprops
//!
//! End-to-end tests over reactors laid out in temporary directories, through the library API
//! and the `testprops` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **generate**: Contents of the generated properties and workspace-state files
//! - **incremental**: When a second run regenerates and when it does not
//! - **cli**: The `testprops` commands and their exit codes

mod cli;
mod generate;
mod incremental;

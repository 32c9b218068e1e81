//! reactor-testprops: test properties for integration tests of multi-module builds.
//!
//! An integration test that launches a nested build of one project needs to know where the
//! rest of the reactor lives. This crate writes two files for it:
//!
//! - a `test.properties` file holding the user's own test properties (placeholders expanded)
//!   plus a fixed set of well-known keys: local repository, user settings, the project's
//!   coordinates, and the locations of the workspace state and workspace resolver
//! - a workspace-state file mapping `group:artifact:extension[:classifier]:baseVersion` keys
//!   of the project and every upstream project to descriptors and built artifacts
//!
//! Both are only rewritten when a tracked input, a setting, or an output changed since the
//! previous run.
//!
//! # Modules
//!
//! - [`incremental`] - Change detection and persisted build state
//! - [`graph`] - The reactor graph and upstream traversal
//! - [`workspace`] - Workspace-state construction and its file format
//! - [`properties`] - Properties files and the well-known-property merge
//! - [`expand`] - `${name}` placeholder expansion
//! - [`generator`] - The generation pipeline tying the above together
//! - [`config`] - Generation settings and the `reactor.toml` manifest
//! - [`verifier`] - Build log assertions
//! - [`testing`] - Readers for the generated files, used from inside integration tests
//! - [`cli`] - The `testprops` command
//!
//! # Example
//!
//! ```rust,no_run
//! use reactor_testprops::config::ReactorManifest;
//! use reactor_testprops::generator::{Outcome, TestPropertiesGenerator};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let manifest = ReactorManifest::load(Path::new("reactor.toml"))?;
//! let config = manifest.config_builder(None)?.build()?;
//!
//! let outcome = TestPropertiesGenerator::new(&config).execute()?;
//! if let Outcome::Generated { properties, .. } = outcome {
//!     println!("wrote {}", properties.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod expand;
pub mod generator;
pub mod graph;
pub mod incremental;
pub mod models;
pub mod properties;
pub mod testing;
pub mod utils;
pub mod verifier;
pub mod workspace;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

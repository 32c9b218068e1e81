//! Arguments shared by the commands that work on a reactor manifest.

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use crate::config::{GenerateConfig, ReactorManifest};
use crate::constants::REACTOR_MANIFEST;
use crate::core::TestPropsError;
use crate::models::ProjectSelector;
use crate::utils::fs::absolute_path;

/// Where the reactor is described and which settings to override.
///
/// Command-line values take precedence over the manifest's `[settings]` and `[properties]`.
/// Relative paths given here resolve against the current directory.
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// Reactor manifest describing the projects and their dependencies
    #[arg(long, value_name = "FILE", default_value = REACTOR_MANIFEST)]
    pub reactor: PathBuf,

    /// Project to generate for, as GROUP:ARTIFACT[:VERSION]
    #[arg(short, long, value_name = "G:A[:V]")]
    pub project: Option<ProjectSelector>,

    /// Local artifact repository directory
    #[arg(long, value_name = "DIR")]
    pub local_repository: Option<PathBuf>,

    /// User settings file
    #[arg(long, value_name = "FILE")]
    pub user_settings: Option<PathBuf>,

    /// User-authored properties to merge into the output
    #[arg(long, value_name = "FILE")]
    pub custom_properties: Option<PathBuf>,

    /// Generated properties file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Generated workspace-state file
    #[arg(long, value_name = "FILE")]
    pub workspace_state: Option<PathBuf>,

    /// Incremental build state file
    #[arg(long, value_name = "FILE")]
    pub build_state: Option<PathBuf>,

    /// Workspace-resolver artifact
    #[arg(long, value_name = "FILE", env = "TESTPROPS_WORKSPACE_RESOLVER")]
    pub workspace_resolver: Option<PathBuf>,

    /// Ambient property available to expansion (repeatable)
    #[arg(short = 'D', long = "property", value_name = "KEY=VALUE", value_parser = parse_property)]
    pub properties: Vec<(String, String)>,
}

impl ConfigArgs {
    /// Build the generation configuration.
    ///
    /// # Errors
    ///
    /// Fails if the manifest is missing or invalid, or the resulting configuration is
    /// incomplete.
    pub fn load(&self) -> Result<GenerateConfig> {
        let cwd = std::env::current_dir().context("Cannot determine the current directory")?;
        self.load_from(&cwd)
    }

    fn load_from(&self, cwd: &Path) -> Result<GenerateConfig> {
        let manifest_path = absolute_path(&cwd.join(&self.reactor));
        if !manifest_path.is_file() {
            return Err(TestPropsError::Config {
                message: format!("reactor manifest {} not found", manifest_path.display()),
            }
            .into());
        }

        let manifest = ReactorManifest::load(&manifest_path)?;
        tracing::debug!("Loaded reactor manifest {}", manifest_path.display());

        let mut builder = manifest.config_builder(self.project.clone())?;
        let here = |path: &PathBuf| cwd.join(path);

        if let Some(path) = &self.local_repository {
            builder = builder.local_repository(here(path));
        }
        if let Some(path) = &self.user_settings {
            builder = builder.user_settings_file(here(path));
        }
        if let Some(path) = &self.custom_properties {
            builder = builder.custom_properties(here(path));
        }
        if let Some(path) = &self.output {
            builder = builder.output_file(here(path));
        }
        if let Some(path) = &self.workspace_state {
            builder = builder.workspace_state(here(path));
        }
        if let Some(path) = &self.build_state {
            builder = builder.build_state(here(path));
        }
        if let Some(path) = &self.workspace_resolver {
            builder = builder.workspace_resolver(here(path));
        }
        for (key, value) in &self.properties {
            builder = builder.property(key, value);
        }

        Ok(builder.build()?)
    }
}

fn parse_property(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

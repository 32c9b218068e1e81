//! The generation pipeline.
//!
//! One call to [`TestPropertiesGenerator::execute`] is one pass of:
//!
//! 1. register the custom properties file (re-read only if it changed) and the root descriptor
//! 2. if the incremental gate reports nothing stale, confirm the outputs and stop
//! 3. build the workspace state for the root and its upstream projects and write it
//! 4. expand the custom properties and merge the well-known properties into them
//! 5. write the properties file and persist the gate's state
//!
//! Any fatal error aborts the pass. Files from earlier successful runs are only ever replaced
//! atomically, so they stay intact; the gate notices missing or stale outputs next time.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::GenerateConfig;
use crate::constants::GENERATOR_HEADER;
use crate::expand::{Bindings, Expander, PlaceholderExpander, expand_all};
use crate::incremental::{BuildContext, InputRole, InputStatus, TrackedInput};
use crate::models::Project;
use crate::properties::{PropertySet, WellKnownSource, merge};
use crate::workspace::WorkspaceStateBuilder;

/// Result of a generation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing changed since the last run; no file was written.
    UpToDate,
    /// Both files were regenerated.
    Generated {
        /// The properties file
        properties: PathBuf,
        /// The workspace-state file
        workspace: PathBuf,
    },
}

/// Generates the test properties file and workspace state for one project.
#[derive(Debug)]
pub struct TestPropertiesGenerator<'a, E = PlaceholderExpander> {
    config: &'a GenerateConfig,
    expander: E,
}

impl<'a> TestPropertiesGenerator<'a> {
    /// Generator using `${name}` placeholder expansion.
    #[must_use]
    pub fn new(config: &'a GenerateConfig) -> Self {
        Self::with_expander(config, PlaceholderExpander)
    }
}

impl<'a, E: Expander> TestPropertiesGenerator<'a, E> {
    /// Generator using a custom expander.
    pub fn with_expander(config: &'a GenerateConfig, expander: E) -> Self {
        Self { config, expander }
    }

    fn tracked_inputs(&self, root: &Project) -> Vec<TrackedInput> {
        vec![
            TrackedInput::new(&self.config.custom_properties, InputRole::CustomProperties),
            TrackedInput::new(&root.descriptor, InputRole::Descriptor),
        ]
    }

    fn declared_outputs(&self) -> Vec<PathBuf> {
        vec![self.config.output_file.clone(), self.config.workspace_state.clone()]
    }

    /// Whether [`execute`](Self::execute) would regenerate. Writes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`crate::core::TestPropsError::GraphIntegrity`] if the root project is unknown.
    pub fn status(&self) -> Result<bool> {
        let root = self.config.root_project()?;
        let mut context = BuildContext::open(&self.config.build_state, &self.config.digest());
        Ok(context.is_regeneration_required(&self.tracked_inputs(root), &self.declared_outputs()))
    }

    /// Run the pipeline.
    ///
    /// # Errors
    ///
    /// Fails with the [`crate::core::TestPropsError`] of the first fatal problem: an unreadable
    /// custom properties file, a broken reactor graph, or an output that cannot be written.
    pub fn execute(&self) -> Result<Outcome> {
        let config = self.config;
        let root = config.root_project()?;
        let mut context = BuildContext::open(&config.build_state, &config.digest());

        let custom = self.read_custom_properties(&mut context)?;
        if root.descriptor.is_file() {
            context.register_input(&root.descriptor)?;
        }
        for output in self.declared_outputs() {
            context.register_output(output);
        }

        if !context.is_processing_required() {
            context.mark_outputs_uptodate();
            tracing::info!("{} is up to date", config.output_file.display());
            return Ok(Outcome::UpToDate);
        }

        let workspace = WorkspaceStateBuilder::build(&config.root, &config.graph)?;
        workspace.store(&config.workspace_state).context("Could not create workspace state file")?;
        tracing::debug!(
            "Wrote {} workspace entries to {}",
            workspace.len(),
            config.workspace_state.display()
        );

        let bindings = Bindings {
            properties: &config.properties,
            project: root,
            local_repository: &config.local_repository,
            user_settings_file: &config.user_settings_file,
        };
        let user =
            custom.map(|raw| expand_all(&self.expander, &raw, &bindings)).unwrap_or_default();

        let source = WellKnownSource {
            local_repository: &config.local_repository,
            user_settings_file: &config.user_settings_file,
            project: &root.coordinates,
            workspace_state: &config.workspace_state,
            workspace_resolver: &config.workspace_resolver,
        };
        let merged = merge(user, &source);
        merged
            .store(&config.output_file, Some(GENERATOR_HEADER))
            .context("Could not create test.properties file")?;

        context.commit()?;
        tracing::info!("Generated {}", config.output_file.display());

        Ok(Outcome::Generated {
            properties: config.output_file.clone(),
            workspace: config.workspace_state.clone(),
        })
    }

    /// Register the custom properties file if it exists and return its parsed content.
    ///
    /// The file is only parsed when it is new or changed; otherwise the cached parse from the
    /// previous run is used.
    fn read_custom_properties(&self, context: &mut BuildContext) -> Result<Option<PropertySet>> {
        let path = &self.config.custom_properties;
        if !path.is_file() {
            tracing::debug!("No custom properties at {}", path.display());
            return Ok(None);
        }

        if context.register_input(path)? == InputStatus::Unmodified {
            if let Some(cached) = context.cached_properties(path) {
                tracing::debug!("Using cached properties of {}", path.display());
                return Ok(Some(cached.clone()));
            }
        }

        let loaded = PropertySet::load(path)?;
        context.record_properties(path, loaded.clone());
        Ok(Some(loaded))
    }
}

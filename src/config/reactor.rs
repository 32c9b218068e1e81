//! Reactor manifest: a TOML description of the host build's project model.
//!
//! The CLI has no build orchestrator to ask for projects and dependency edges, so they are
//! declared in a `reactor.toml`:
//!
//! ```toml
//! root = "g:a"
//!
//! [settings]
//! local-repository = "~/.m2/repository"
//! workspace-resolver = "$RESOLVER_HOME/resolver.jar"
//!
//! [properties]
//! "db.host" = "localhost"
//!
//! [[projects]]
//! group-id = "g"
//! artifact-id = "a"
//! version = "1.0"
//! descriptor = "a/pom.xml"
//! dependencies = ["g:b"]
//!
//! [[projects]]
//! group-id = "g"
//! artifact-id = "b"
//! version = "1.0"
//! descriptor = "b/pom.xml"
//! artifact = "b/target/b.jar"
//!
//! [[projects.attached]]
//! classifier = "sources"
//! file = "b/target/b-sources.jar"
//! ```
//!
//! Relative paths resolve against the manifest's directory. Settings additionally get `~` and
//! `$VAR` expansion.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{GenerateConfig, GenerateConfigBuilder, parse_config};
use crate::core::TestPropsError;
use crate::graph::ReactorGraph;
use crate::models::{Coordinates, DEFAULT_EXTENSION, Project, ProjectKey, ProjectSelector};
use crate::properties::PropertySet;
use crate::utils::fs::resolve_against;

/// Top-level manifest.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReactorManifest {
    /// Project to generate for, as `g:a` or `g:a:v`
    #[serde(default)]
    pub root: Option<String>,
    /// Path settings
    #[serde(default)]
    pub settings: Settings,
    /// Ambient properties available to expansion
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Projects in reactor order
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,
    #[serde(skip)]
    base_dir: PathBuf,
}

/// `[settings]` table. Every entry is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    /// Local artifact repository directory
    pub local_repository: Option<String>,
    /// User settings file
    pub user_settings_file: Option<String>,
    /// Custom properties file
    pub custom_properties: Option<String>,
    /// Generated properties file
    pub output_file: Option<String>,
    /// Generated workspace-state file
    pub workspace_state: Option<String>,
    /// Persisted incremental state
    pub build_state: Option<String>,
    /// Workspace-resolver artifact
    pub workspace_resolver: Option<String>,
}

/// One `[[projects]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectEntry {
    /// Group identifier
    pub group_id: String,
    /// Artifact identifier
    pub artifact_id: String,
    /// Version
    pub version: String,
    /// Descriptor location
    pub descriptor: PathBuf,
    /// Primary artifact extension, `jar` when omitted
    #[serde(default)]
    pub extension: Option<String>,
    /// Built primary artifact, absent if not built yet
    #[serde(default)]
    pub artifact: Option<PathBuf>,
    /// Build output directory, `<basedir>/target` when omitted
    #[serde(default)]
    pub build_directory: Option<PathBuf>,
    /// Direct dependencies as `g:a` or `g:a:v`
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Attached artifacts
    #[serde(default)]
    pub attached: Vec<AttachedEntry>,
}

/// One `[[projects.attached]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AttachedEntry {
    /// Extension, `jar` when omitted
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Classifier, empty when omitted
    #[serde(default)]
    pub classifier: String,
    /// Built file
    pub file: PathBuf,
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

impl ReactorManifest {
    /// Load a manifest. Relative paths will resolve against its directory.
    ///
    /// # Errors
    ///
    /// Returns an error naming the file if it cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let mut manifest: Self = parse_config(path)?;
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        manifest.base_dir = crate::utils::fs::absolute_path(parent);
        Ok(manifest)
    }

    /// Parse manifest text with `base_dir` as the anchor for relative paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid manifest.
    pub fn from_toml(content: &str, base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut manifest: Self =
            toml::from_str(content).context("Failed to parse reactor manifest")?;
        manifest.base_dir = base_dir.into();
        Ok(manifest)
    }

    /// Directory relative paths resolve against.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Build the reactor graph from the `[[projects]]` entries.
    ///
    /// # Errors
    ///
    /// Returns [`TestPropsError::GraphIntegrity`] for duplicate or incomplete projects, cycles,
    /// and dependencies on projects outside the reactor, and [`TestPropsError::Config`] for
    /// unparsable dependency references.
    pub fn graph(&self) -> Result<ReactorGraph> {
        let mut graph = ReactorGraph::new();

        for entry in &self.projects {
            graph.add_project(self.project(entry))?;
        }

        for entry in &self.projects {
            let from = ProjectKey::new(&entry.group_id, &entry.artifact_id);
            for dependency in &entry.dependencies {
                let to: ProjectSelector = dependency.parse()?;
                graph.add_dependency(&from, &to.key)?;
                if let Some(project) = graph.project(&to.key) {
                    to.check(project)?;
                }
            }
        }

        graph.detect_cycles()?;
        Ok(graph)
    }

    fn project(&self, entry: &ProjectEntry) -> Project {
        let coordinates = Coordinates::new(&entry.group_id, &entry.artifact_id, &entry.version);
        let descriptor = if entry.descriptor.as_os_str().is_empty() {
            PathBuf::new()
        } else {
            self.resolve(&entry.descriptor)
        };

        let mut project = Project::new(coordinates, descriptor);
        if let Some(extension) = &entry.extension {
            project = project.with_extension(extension);
        }
        if let Some(artifact) = &entry.artifact {
            project = project.with_artifact_file(self.resolve(artifact));
        }
        if let Some(dir) = &entry.build_directory {
            project = project.with_build_directory(self.resolve(dir));
        }
        for attached in &entry.attached {
            project = project.attach(
                &attached.extension,
                &attached.classifier,
                self.resolve(&attached.file),
            );
        }
        project
    }

    /// The root project: `root` if set, otherwise the only project of the reactor.
    ///
    /// # Errors
    ///
    /// Returns [`TestPropsError::Config`] if no root is set and the reactor does not hold
    /// exactly one project, or `root` cannot be parsed.
    pub fn root_selector(&self) -> Result<ProjectSelector, TestPropsError> {
        match (&self.root, self.projects.as_slice()) {
            (Some(root), _) => root.parse(),
            (None, [only]) => Ok(ProjectKey::new(&only.group_id, &only.artifact_id).into()),
            (None, _) => Err(TestPropsError::Config {
                message: "the reactor manifest has no 'root' and more than one project".to_string(),
            }),
        }
    }

    /// A configuration builder seeded with everything the manifest declares.
    ///
    /// `root` overrides the manifest's own `root` entry. The base directory is the root
    /// project's directory.
    ///
    /// # Errors
    ///
    /// Fails if the graph cannot be built, the root cannot be determined, is not in the
    /// reactor or names another version, or a setting cannot be expanded.
    pub fn config_builder(&self, root: Option<ProjectSelector>) -> Result<GenerateConfigBuilder> {
        let graph = self.graph()?;
        let selector = match root {
            Some(root) => root,
            None => self.root_selector()?,
        };
        let project = graph.project(&selector.key).ok_or_else(|| TestPropsError::Config {
            message: format!("root project '{selector}' is not part of the reactor"),
        })?;
        selector.check(project)?;
        let basedir = project.basedir().to_path_buf();
        let root = selector.key;

        let properties: PropertySet =
            self.properties.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let mut builder =
            GenerateConfig::builder(basedir).root(root).graph(graph).properties(properties);

        let s = &self.settings;
        if let Some(path) = self.setting(s.local_repository.as_deref())? {
            builder = builder.local_repository(path);
        }
        if let Some(path) = self.setting(s.user_settings_file.as_deref())? {
            builder = builder.user_settings_file(path);
        }
        if let Some(path) = self.setting(s.custom_properties.as_deref())? {
            builder = builder.custom_properties(path);
        }
        if let Some(path) = self.setting(s.output_file.as_deref())? {
            builder = builder.output_file(path);
        }
        if let Some(path) = self.setting(s.workspace_state.as_deref())? {
            builder = builder.workspace_state(path);
        }
        if let Some(path) = self.setting(s.build_state.as_deref())? {
            builder = builder.build_state(path);
        }
        if let Some(path) = self.setting(s.workspace_resolver.as_deref())? {
            builder = builder.workspace_resolver(path);
        }

        Ok(builder)
    }

    fn setting(&self, value: Option<&str>) -> Result<Option<PathBuf>, TestPropsError> {
        value.map(|raw| expand_setting(raw).map(|expanded| self.resolve(&expanded))).transpose()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        resolve_against(&self.base_dir, path)
    }
}

/// Expand `~` and `$VAR` / `${VAR}` in a path setting.
///
/// # Errors
///
/// Returns [`TestPropsError::Config`] naming the variable if it is undefined.
pub fn expand_setting(raw: &str) -> Result<PathBuf, TestPropsError> {
    shellexpand::full(raw).map(|expanded| PathBuf::from(expanded.as_ref())).map_err(|e| {
        TestPropsError::Config {
            message: format!("cannot expand '{raw}': {e}"),
        }
    })
}

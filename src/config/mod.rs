//! Invocation configuration.
//!
//! A generation run never reaches into ambient state: everything it needs is in one
//! [`GenerateConfig`], assembled either programmatically through [`GenerateConfigBuilder`] or
//! from a reactor manifest (see [`reactor`]).
//!
//! # Defaults
//!
//! Relative to the root project's base directory unless noted:
//!
//! | Setting | Default |
//! |---|---|
//! | custom properties | `src/test/test.properties` |
//! | output file | `target/test-classes/test.properties` |
//! | workspace state | `target/workspacestate.properties` |
//! | build state | `target/incremental/testprops.json` |
//! | local repository | `~/.m2/repository` |
//! | user settings | `~/.m2/settings.xml` |
//! | workspace resolver | none, must be set |
//!
//! # Example
//!
//! ```rust,no_run
//! use reactor_testprops::config::GenerateConfig;
//! use reactor_testprops::graph::ReactorGraph;
//! use reactor_testprops::models::{Coordinates, Project};
//!
//! # fn example() -> anyhow::Result<()> {
//! let mut graph = ReactorGraph::new();
//! let root = Project::new(Coordinates::new("g", "a", "1.0"), "/work/a/pom.xml");
//! let key = root.key();
//! graph.add_project(root)?;
//!
//! let config = GenerateConfig::builder("/work/a")
//!     .root(key)
//!     .graph(graph)
//!     .workspace_resolver("/opt/resolver.jar")
//!     .build()?;
//! assert!(config.output_file.ends_with("target/test-classes/test.properties"));
//! # Ok(())
//! # }
//! ```

pub mod parser;
pub mod reactor;

pub use parser::parse_config;
pub use reactor::{AttachedEntry, ProjectEntry, ReactorManifest, Settings};

use std::path::PathBuf;

use crate::constants::{
    DEFAULT_BUILD_STATE, DEFAULT_CUSTOM_PROPERTIES, DEFAULT_LOCAL_REPOSITORY, DEFAULT_OUTPUT_FILE,
    DEFAULT_USER_SETTINGS, DEFAULT_WORKSPACE_STATE,
};
use crate::core::TestPropsError;
use crate::graph::ReactorGraph;
use crate::incremental::fingerprint::checksum;
use crate::models::{Project, ProjectKey};
use crate::properties::PropertySet;
use crate::utils::fs::resolve_against;

/// Everything one generation run needs.
#[derive(Debug)]
pub struct GenerateConfig {
    /// Base directory of the root project
    pub basedir: PathBuf,
    /// The project to generate for
    pub root: ProjectKey,
    /// The reactor
    pub graph: ReactorGraph,
    /// Ambient properties available to expansion
    pub properties: PropertySet,
    /// Optional user-authored properties file
    pub custom_properties: PathBuf,
    /// Generated properties file
    pub output_file: PathBuf,
    /// Generated workspace-state file
    pub workspace_state: PathBuf,
    /// Persisted incremental state
    pub build_state: PathBuf,
    /// Local artifact repository directory
    pub local_repository: PathBuf,
    /// User settings file
    pub user_settings_file: PathBuf,
    /// Workspace-resolver artifact
    pub workspace_resolver: PathBuf,
}

impl GenerateConfig {
    /// Start building a configuration for the project rooted at `basedir`.
    pub fn builder(basedir: impl Into<PathBuf>) -> GenerateConfigBuilder {
        GenerateConfigBuilder::new(basedir)
    }

    /// The root project.
    ///
    /// # Errors
    ///
    /// Returns [`TestPropsError::GraphIntegrity`] if the root is not in the graph.
    pub fn root_project(&self) -> Result<&Project, TestPropsError> {
        self.graph.project(&self.root).ok_or_else(|| TestPropsError::GraphIntegrity {
            reason: format!("project '{}' is not part of the reactor", self.root),
        })
    }

    /// Digest of every setting that affects the generated files apart from tracked inputs.
    ///
    /// Covers the root and every project upstream of it: coordinates, descriptor path, and each
    /// artifact's workspace key with its file path (or `unbuilt`). Only locations are digested,
    /// so rebuilding an artifact in place does not change it.
    #[must_use]
    pub fn digest(&self) -> String {
        let mut material = String::new();
        let mut line = |name: &str, value: &str| {
            material.push_str(name);
            material.push('=');
            material.push_str(value);
            material.push('\n');
        };

        line("root", &self.root.to_string());
        match self.graph.upstream_of(&self.root, true) {
            Ok(projects) => {
                for project in projects {
                    line(
                        "project",
                        &format!("{} {}", project.coordinates, project.descriptor.display()),
                    );
                    for artifact in std::iter::once(&project.artifact).chain(&project.attached) {
                        let location = artifact
                            .file
                            .as_ref()
                            .map_or_else(|| "unbuilt".to_string(), |f| f.display().to_string());
                        let key = format!(
                            "{}:{}:{}:{}:{}",
                            artifact.group_id,
                            artifact.artifact_id,
                            artifact.extension,
                            artifact.classifier,
                            artifact.base_version()
                        );
                        line("artifact", &format!("{key} {location}"));
                    }
                }
            }
            // The walk reports the broken graph again when generation starts
            Err(e) => line("reactor", &e.to_string()),
        }
        for (name, path) in [
            ("custom-properties", &self.custom_properties),
            ("output-file", &self.output_file),
            ("workspace-state", &self.workspace_state),
            ("local-repository", &self.local_repository),
            ("user-settings-file", &self.user_settings_file),
            ("workspace-resolver", &self.workspace_resolver),
        ] {
            line(name, &path.display().to_string());
        }
        for (key, value) in self.properties.iter() {
            line(&format!("property.{key}"), value);
        }

        checksum(material.as_bytes())
    }
}

/// Builder for [`GenerateConfig`]. Relative paths resolve against the base directory.
#[derive(Debug)]
pub struct GenerateConfigBuilder {
    basedir: PathBuf,
    root: Option<ProjectKey>,
    graph: ReactorGraph,
    properties: PropertySet,
    custom_properties: Option<PathBuf>,
    output_file: Option<PathBuf>,
    workspace_state: Option<PathBuf>,
    build_state: Option<PathBuf>,
    local_repository: Option<PathBuf>,
    user_settings_file: Option<PathBuf>,
    workspace_resolver: Option<PathBuf>,
}

impl GenerateConfigBuilder {
    fn new(basedir: impl Into<PathBuf>) -> Self {
        Self {
            basedir: basedir.into(),
            root: None,
            graph: ReactorGraph::new(),
            properties: PropertySet::new(),
            custom_properties: None,
            output_file: None,
            workspace_state: None,
            build_state: None,
            local_repository: None,
            user_settings_file: None,
            workspace_resolver: None,
        }
    }

    /// The project to generate for.
    #[must_use]
    pub fn root(mut self, root: ProjectKey) -> Self {
        self.root = Some(root);
        self
    }

    /// The reactor.
    #[must_use]
    pub fn graph(mut self, graph: ReactorGraph) -> Self {
        self.graph = graph;
        self
    }

    /// Replace the ambient properties.
    #[must_use]
    pub fn properties(mut self, properties: PropertySet) -> Self {
        self.properties = properties;
        self
    }

    /// Add one ambient property.
    #[must_use]
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key, value);
        self
    }

    /// Custom properties file.
    #[must_use]
    pub fn custom_properties(mut self, path: impl Into<PathBuf>) -> Self {
        self.custom_properties = Some(path.into());
        self
    }

    /// Generated properties file.
    #[must_use]
    pub fn output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    /// Generated workspace-state file.
    #[must_use]
    pub fn workspace_state(mut self, path: impl Into<PathBuf>) -> Self {
        self.workspace_state = Some(path.into());
        self
    }

    /// Persisted incremental state.
    #[must_use]
    pub fn build_state(mut self, path: impl Into<PathBuf>) -> Self {
        self.build_state = Some(path.into());
        self
    }

    /// Local artifact repository.
    #[must_use]
    pub fn local_repository(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_repository = Some(path.into());
        self
    }

    /// User settings file.
    #[must_use]
    pub fn user_settings_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.user_settings_file = Some(path.into());
        self
    }

    /// Workspace-resolver artifact.
    #[must_use]
    pub fn workspace_resolver(mut self, path: impl Into<PathBuf>) -> Self {
        self.workspace_resolver = Some(path.into());
        self
    }

    /// Validate and fill in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`TestPropsError::Config`] if the root project or workspace resolver is missing,
    /// the root is not in the graph, or the home directory is needed but unknown.
    pub fn build(self) -> Result<GenerateConfig, TestPropsError> {
        let root = self.root.ok_or_else(|| TestPropsError::Config {
            message: "no root project was given".to_string(),
        })?;
        if self.graph.project(&root).is_none() {
            return Err(TestPropsError::Config {
                message: format!("root project '{root}' is not part of the reactor"),
            });
        }
        let workspace_resolver = self.workspace_resolver.ok_or_else(|| TestPropsError::Config {
            message: "the workspace resolver location is not set".to_string(),
        })?;

        let basedir = self.basedir;
        let in_basedir = |path: Option<PathBuf>, default: &str| {
            resolve_against(&basedir, &path.unwrap_or_else(|| PathBuf::from(default)))
        };

        let local_repository = match self.local_repository {
            Some(path) => resolve_against(&basedir, &path),
            None => home_dir()?.join(DEFAULT_LOCAL_REPOSITORY),
        };
        let user_settings_file = match self.user_settings_file {
            Some(path) => resolve_against(&basedir, &path),
            None => home_dir()?.join(DEFAULT_USER_SETTINGS),
        };

        Ok(GenerateConfig {
            custom_properties: in_basedir(self.custom_properties, DEFAULT_CUSTOM_PROPERTIES),
            output_file: in_basedir(self.output_file, DEFAULT_OUTPUT_FILE),
            workspace_state: in_basedir(self.workspace_state, DEFAULT_WORKSPACE_STATE),
            build_state: in_basedir(self.build_state, DEFAULT_BUILD_STATE),
            workspace_resolver: resolve_against(&basedir, &workspace_resolver),
            local_repository,
            user_settings_file,
            root,
            graph: self.graph,
            properties: self.properties,
            basedir,
        })
    }
}

fn home_dir() -> Result<PathBuf, TestPropsError> {
    dirs::home_dir().ok_or_else(|| TestPropsError::Config {
        message: "cannot determine the home directory; \
                  set the local repository and user settings explicitly"
            .to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinates;

    fn graph_with_root() -> (ReactorGraph, ProjectKey) {
        let mut graph = ReactorGraph::new();
        let project = Project::new(Coordinates::new("g", "a", "1.0"), "/work/a/pom.xml");
        let key = project.key();
        graph.add_project(project).unwrap();
        (graph, key)
    }

    fn base() -> GenerateConfigBuilder {
        let (graph, key) = graph_with_root();
        GenerateConfig::builder("/work/a")
            .root(key)
            .graph(graph)
            .local_repository("/repo")
            .user_settings_file("/settings.xml")
            .workspace_resolver("/opt/resolver.jar")
    }

    #[test]
    fn test_defaults_resolve_against_basedir() {
        let config = base().build().unwrap();
        assert_eq!(config.custom_properties, PathBuf::from("/work/a/src/test/test.properties"));
        assert_eq!(
            config.output_file,
            PathBuf::from("/work/a/target/test-classes/test.properties")
        );
        assert_eq!(
            config.workspace_state,
            PathBuf::from("/work/a/target/workspacestate.properties")
        );
        assert_eq!(config.build_state, PathBuf::from("/work/a/target/incremental/testprops.json"));
        assert_eq!(config.root_project().unwrap().coordinates.artifact_id, "a");
    }

    #[test]
    fn test_relative_overrides() {
        let config = base().output_file("out/test.properties").build().unwrap();
        assert_eq!(config.output_file, PathBuf::from("/work/a/out/test.properties"));
    }

    #[test]
    fn test_missing_workspace_resolver() {
        let (graph, key) = graph_with_root();
        let err = GenerateConfig::builder("/work/a").root(key).graph(graph).build().unwrap_err();
        assert!(matches!(err, TestPropsError::Config { .. }));
        assert!(err.to_string().contains("workspace resolver"));
    }

    #[test]
    fn test_missing_or_unknown_root() {
        let err = GenerateConfig::builder("/work/a")
            .workspace_resolver("/r.jar")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("no root project"));

        let (graph, _) = graph_with_root();
        let err = GenerateConfig::builder("/work/a")
            .root(ProjectKey::new("g", "zzz"))
            .graph(graph)
            .workspace_resolver("/r.jar")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("g:zzz"));
    }

    #[test]
    fn test_digest_tracks_settings_and_properties() {
        let first = base().build().unwrap().digest();
        assert_eq!(first, base().build().unwrap().digest());
        assert!(first.starts_with("sha256:"));

        assert_ne!(first, base().workspace_resolver("/other.jar").build().unwrap().digest());
        assert_ne!(first, base().property("env", "ci").build().unwrap().digest());
    }

    fn with_upstream(built: Option<&str>, linked: bool) -> String {
        let (mut graph, key) = graph_with_root();
        let mut upstream = Project::new(Coordinates::new("g", "b", "1.0"), "/work/b/pom.xml");
        if let Some(file) = built {
            upstream = upstream.with_artifact_file(file);
        }
        let upstream_key = upstream.key();
        graph.add_project(upstream).unwrap();
        if linked {
            graph.add_dependency(&key, &upstream_key).unwrap();
        }
        base().graph(graph).build().unwrap().digest()
    }

    #[test]
    fn test_digest_tracks_upstream_projects() {
        let alone = base().build().unwrap().digest();
        let unlinked = with_upstream(None, false);
        let linked = with_upstream(None, true);
        let built = with_upstream(Some("/work/b/target/b.jar"), true);

        // Projects outside the root's upstream closure do not matter
        assert_eq!(alone, unlinked);
        assert_ne!(unlinked, linked);
        assert_ne!(linked, built);
        assert_eq!(built, with_upstream(Some("/work/b/target/b.jar"), true));
        assert_ne!(built, with_upstream(Some("/work/b/target/b-other.jar"), true));
    }
}

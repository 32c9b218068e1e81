//! Workspace state: where every project of the reactor and every artifact it has built lives
//! on disk.
//!
//! External tooling reads the persisted file to resolve in-workspace artifacts instead of
//! repository copies. It is a flat properties file with two kinds of entries:
//!
//! ```text
//! groupId:artifactId:pom::version=/abs/path/to/pom.xml
//! groupId:artifactId:extension:classifier:baseVersion=/abs/path/to/artifact
//! ```
//!
//! The state is rebuilt from scratch on every regeneration and replaces the previous file
//! wholesale.

use anyhow::Result;
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::GENERATOR_HEADER;
use crate::core::TestPropsError;
use crate::graph::ReactorGraph;
use crate::models::{Artifact, Project, ProjectKey};
use crate::properties::format;
use crate::utils::fs::{absolute_path, atomic_write_with};

const POM_EXTENSION: &str = "pom";

/// What a workspace-state entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A project descriptor
    Project,
    /// A built artifact
    Artifact,
}

/// One recorded location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceEntry {
    /// Whether this is a project or an artifact
    pub kind: EntryKind,
    /// Absolute file location
    pub location: PathBuf,
}

/// Insertion-ordered map from entry key to file location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceState {
    entries: IndexMap<String, WorkspaceEntry>,
}

impl WorkspaceState {
    /// Create an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a project's descriptor location.
    pub fn put_pom(&mut self, project: &Project) {
        let c = &project.coordinates;
        let key = format!("{}:{}:{POM_EXTENSION}::{}", c.group_id, c.artifact_id, c.version);
        self.put(key, EntryKind::Project, &project.descriptor);
    }

    /// Record a built artifact. Returns `false` (recording nothing) if it has no file yet.
    pub fn put_artifact(&mut self, artifact: &Artifact) -> bool {
        let Some(file) = &artifact.file else {
            return false;
        };
        let key = format!(
            "{}:{}:{}:{}:{}",
            artifact.group_id,
            artifact.artifact_id,
            artifact.extension,
            artifact.classifier,
            artifact.base_version()
        );
        self.put(key, EntryKind::Artifact, file);
        true
    }

    fn put(&mut self, key: String, kind: EntryKind, location: &Path) {
        let location = absolute_path(location);
        match self.entries.get_mut(&key) {
            // A pom-packaged artifact shares its key with the project entry
            Some(existing) => existing.location = location,
            None => {
                self.entries.insert(key, WorkspaceEntry { kind, location });
            }
        }
    }

    /// Location recorded under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Path> {
        self.entries.get(key).map(|entry| entry.location.as_path())
    }

    /// All entries in recording order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &WorkspaceEntry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    /// Project entries in recording order.
    pub fn projects(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.of_kind(EntryKind::Project)
    }

    /// Artifact entries in recording order.
    pub fn artifacts(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.of_kind(EntryKind::Artifact)
    }

    fn of_kind(&self, kind: EntryKind) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .iter()
            .filter(move |(_, e)| e.kind == kind)
            .map(|(k, e)| (k.as_str(), e.location.as_path()))
    }

    /// Total number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Atomically write the state, replacing any previous file.
    ///
    /// # Errors
    ///
    /// Returns [`TestPropsError::OutputWrite`] if the file cannot be written.
    pub fn store(&self, path: &Path) -> Result<()> {
        let rendered: Vec<(&str, String)> = self
            .entries
            .iter()
            .map(|(k, e)| (k.as_str(), e.location.display().to_string()))
            .collect();

        atomic_write_with(path, |writer| {
            format::write_properties(
                writer,
                Some(GENERATOR_HEADER),
                rendered.iter().map(|(k, v)| (*k, v.as_str())),
            )
        })
    }

    /// Read a state file written by [`WorkspaceState::store`].
    ///
    /// # Errors
    ///
    /// Returns [`TestPropsError::InputRead`] if the file cannot be read, is malformed, or
    /// contains a key that is not a five-part coordinate.
    pub fn load(path: &Path) -> Result<Self> {
        let input_error = |reason: String| TestPropsError::InputRead {
            path: path.display().to_string(),
            reason,
        };

        let bytes = fs::read(path).map_err(|e| input_error(e.to_string()))?;
        let parsed = format::parse(&format::decode(bytes)).map_err(input_error)?;

        let mut state = Self::new();
        for (key, location) in parsed {
            let parts: Vec<&str> = key.split(':').collect();
            if parts.len() != 5 {
                return Err(input_error(format!("'{key}' is not a workspace-state key")).into());
            }
            let kind = if parts[2] == POM_EXTENSION && parts[3].is_empty() {
                EntryKind::Project
            } else {
                EntryKind::Artifact
            };
            state.entries.insert(
                key,
                WorkspaceEntry {
                    kind,
                    location: PathBuf::from(location),
                },
            );
        }

        Ok(state)
    }
}

/// Collects the workspace state of a project and everything upstream of it.
#[derive(Debug, Default)]
pub struct WorkspaceStateBuilder {
    state: WorkspaceState,
}

impl WorkspaceStateBuilder {
    /// Start with an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a project's descriptor, its primary artifact if built, and every attached artifact.
    pub fn record_project(&mut self, project: &Project) {
        tracing::debug!("Recording project {project} at {}", project.descriptor.display());
        self.state.put_pom(project);

        for artifact in std::iter::once(&project.artifact).chain(&project.attached) {
            if self.state.put_artifact(artifact) {
                tracing::debug!(
                    "Recording artifact {}:{}:{}:{}",
                    artifact.artifact_id,
                    artifact.extension,
                    artifact.classifier,
                    artifact.version
                );
            } else {
                tracing::debug!(
                    "Skipping unbuilt artifact {}:{}:{}",
                    artifact.artifact_id,
                    artifact.extension,
                    artifact.classifier
                );
            }
        }
    }

    /// The collected state.
    #[must_use]
    pub fn finish(self) -> WorkspaceState {
        self.state
    }

    /// Build the state for `root` and every project upstream of it, root first.
    ///
    /// # Errors
    ///
    /// Returns [`TestPropsError::GraphIntegrity`] if `root` is not in the graph or a cycle is
    /// reachable from it.
    pub fn build(root: &ProjectKey, graph: &ReactorGraph) -> Result<WorkspaceState> {
        let mut builder = Self::new();
        for project in graph.upstream_of(root, true)? {
            builder.record_project(project);
        }
        Ok(builder.finish())
    }
}

//! Project and artifact identities as supplied by the host build orchestrator.
//!
//! These types are read-only inputs to a generation run. A [`Project`] owns one primary
//! [`Artifact`] (which may not be built yet) and any number of attached artifacts.

use anyhow::Result;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use crate::core::TestPropsError;

/// Default extension of a project's primary artifact.
pub const DEFAULT_EXTENSION: &str = "jar";

/// `groupId:artifactId:version` identity of a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinates {
    /// Group identifier, e.g. `io.example`
    pub group_id: String,
    /// Artifact identifier, e.g. `core`
    pub artifact_id: String,
    /// Version string, e.g. `1.0` or `2.1-SNAPSHOT`
    pub version: String,
}

impl Coordinates {
    /// Create coordinates from their three parts.
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
        }
    }

    /// The versionless key identifying this project inside a reactor.
    #[must_use]
    pub fn key(&self) -> ProjectKey {
        ProjectKey::new(&self.group_id, &self.artifact_id)
    }

    /// Name of the first empty identity field, if any.
    #[must_use]
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.group_id.trim().is_empty() {
            Some("groupId")
        } else if self.artifact_id.trim().is_empty() {
            Some("artifactId")
        } else if self.version.trim().is_empty() {
            Some("version")
        } else {
            None
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

impl FromStr for Coordinates {
    type Err = TestPropsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [g, a, v] if !g.is_empty() && !a.is_empty() && !v.is_empty() => {
                Ok(Self::new(*g, *a, *v))
            }
            _ => Err(TestPropsError::Config {
                message: format!("'{s}' is not a groupId:artifactId:version coordinate"),
            }),
        }
    }
}

/// Versionless `groupId:artifactId` key. A reactor never holds two projects with the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectKey {
    /// Group identifier
    pub group_id: String,
    /// Artifact identifier
    pub artifact_id: String,
}

impl ProjectKey {
    /// Create a key from group and artifact identifiers.
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
        }
    }
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.artifact_id)
    }
}

impl FromStr for ProjectKey {
    type Err = TestPropsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((g, a)) if !g.is_empty() && !a.is_empty() && !a.contains(':') => {
                Ok(Self::new(g, a))
            }
            _ => Err(TestPropsError::Config {
                message: format!("'{s}' is not a groupId:artifactId project key"),
            }),
        }
    }
}

/// A reference to a reactor project as `g:a` or `g:a:v`.
///
/// A version, when given, must be the version the reactor builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSelector {
    /// The project's key
    pub key: ProjectKey,
    /// Expected version
    pub version: Option<String>,
}

impl ProjectSelector {
    /// Check that `project` is the one referenced, including its version if one was given.
    ///
    /// # Errors
    ///
    /// Returns [`TestPropsError::Config`] naming both versions if they differ.
    pub fn check(&self, project: &Project) -> Result<(), TestPropsError> {
        match &self.version {
            Some(version) if *version != project.coordinates.version => {
                Err(TestPropsError::Config {
                    message: format!(
                        "'{self}' does not match reactor project {}",
                        project.coordinates
                    ),
                })
            }
            _ => Ok(()),
        }
    }
}

impl From<ProjectKey> for ProjectSelector {
    fn from(key: ProjectKey) -> Self {
        Self { key, version: None }
    }
}

impl fmt::Display for ProjectSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}:{version}", self.key),
            None => fmt::Display::fmt(&self.key, f),
        }
    }
}

impl FromStr for ProjectSelector {
    type Err = TestPropsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [g, a] if !g.is_empty() && !a.is_empty() => Ok(ProjectKey::new(*g, *a).into()),
            [g, a, v] if !g.is_empty() && !a.is_empty() && !v.is_empty() => Ok(Self {
                key: ProjectKey::new(*g, *a),
                version: Some((*v).to_string()),
            }),
            _ => Err(TestPropsError::Config {
                message: format!("'{s}' is not a groupId:artifactId[:version] project reference"),
            }),
        }
    }
}

/// A typed, versioned build output file belonging to a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Group identifier
    pub group_id: String,
    /// Artifact identifier
    pub artifact_id: String,
    /// Version as built, possibly a timestamped snapshot
    pub version: String,
    /// File extension of the artifact type, e.g. `jar`
    pub extension: String,
    /// Classifier, empty when the artifact has none
    pub classifier: String,
    /// Location of the built file; `None` until the artifact has been built
    pub file: Option<PathBuf>,
}

impl Artifact {
    /// Create an unbuilt, unclassified artifact for the given coordinates.
    pub fn new(coordinates: &Coordinates, extension: impl Into<String>) -> Self {
        Self {
            group_id: coordinates.group_id.clone(),
            artifact_id: coordinates.artifact_id.clone(),
            version: coordinates.version.clone(),
            extension: extension.into(),
            classifier: String::new(),
            file: None,
        }
    }

    /// Set the classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = classifier.into();
        self
    }

    /// Set the built file.
    #[must_use]
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// The base version: `X-yyyyMMdd.HHmmss-N` becomes `X-SNAPSHOT`, anything else is unchanged.
    #[must_use]
    pub fn base_version(&self) -> String {
        base_version(&self.version)
    }
}

/// Map a timestamped snapshot version to its `-SNAPSHOT` base version.
#[must_use]
pub fn base_version(version: &str) -> String {
    static SNAPSHOT_TIMESTAMP: OnceLock<Regex> = OnceLock::new();
    let re = SNAPSHOT_TIMESTAMP.get_or_init(|| {
        Regex::new(r"^(.*-)?([0-9]{8}\.[0-9]{6}-[0-9]+)$").expect("snapshot pattern is valid")
    });

    match re.captures(version) {
        Some(caps) => {
            let prefix = caps.get(1).map_or("", |m| m.as_str());
            format!("{prefix}SNAPSHOT")
        }
        None => version.to_string(),
    }
}

/// A project in the reactor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Project identity
    pub coordinates: Coordinates,
    /// Location of the project descriptor (`pom.xml`)
    pub descriptor: PathBuf,
    /// Build output directory, `<basedir>/target` by default
    pub build_directory: PathBuf,
    /// The primary artifact; its `file` is `None` until built
    pub artifact: Artifact,
    /// Secondary artifacts such as sources or test jars
    pub attached: Vec<Artifact>,
}

impl Project {
    /// Create a project with an unbuilt primary `jar` artifact.
    pub fn new(coordinates: Coordinates, descriptor: impl Into<PathBuf>) -> Self {
        let descriptor = descriptor.into();
        let build_directory = descriptor
            .parent()
            .map_or_else(|| PathBuf::from("target"), |dir| dir.join("target"));
        let artifact = Artifact::new(&coordinates, DEFAULT_EXTENSION);
        Self {
            coordinates,
            descriptor,
            build_directory,
            artifact,
            attached: Vec::new(),
        }
    }

    /// Change the primary artifact's extension (e.g. `pom` for aggregator projects).
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.artifact.extension = extension.into();
        self
    }

    /// Mark the primary artifact as built at `file`.
    #[must_use]
    pub fn with_artifact_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.artifact.file = Some(file.into());
        self
    }

    /// Override the build output directory.
    #[must_use]
    pub fn with_build_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_directory = dir.into();
        self
    }

    /// Attach a secondary artifact with the given extension, classifier and file.
    #[must_use]
    pub fn attach(
        mut self,
        extension: impl Into<String>,
        classifier: impl Into<String>,
        file: impl Into<PathBuf>,
    ) -> Self {
        let artifact = Artifact::new(&self.coordinates, extension)
            .with_classifier(classifier)
            .with_file(file);
        self.attached.push(artifact);
        self
    }

    /// Versionless reactor key.
    #[must_use]
    pub fn key(&self) -> ProjectKey {
        self.coordinates.key()
    }

    /// Directory containing the descriptor.
    #[must_use]
    pub fn basedir(&self) -> &Path {
        self.descriptor.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Check that every identity field and the descriptor location are present.
    ///
    /// # Errors
    ///
    /// Returns [`TestPropsError::GraphIntegrity`] naming the project and the missing field.
    pub fn validate_identity(&self) -> Result<(), TestPropsError> {
        if let Some(field) = self.coordinates.missing_field() {
            return Err(TestPropsError::GraphIntegrity {
                reason: format!("project '{}' has an empty {field}", self.coordinates),
            });
        }
        if self.descriptor.as_os_str().is_empty() {
            return Err(TestPropsError::GraphIntegrity {
                reason: format!("project '{}' has no descriptor location", self.coordinates),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.coordinates, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_parse_and_display() {
        let coords: Coordinates = "io.example:core:1.0".parse().unwrap();
        assert_eq!(coords.group_id, "io.example");
        assert_eq!(coords.artifact_id, "core");
        assert_eq!(coords.version, "1.0");
        assert_eq!(coords.to_string(), "io.example:core:1.0");

        assert!("io.example:core".parse::<Coordinates>().is_err());
        assert!("::1.0".parse::<Coordinates>().is_err());
    }

    #[test]
    fn test_project_key_parse() {
        let key: ProjectKey = "g:a".parse().unwrap();
        assert_eq!(key, ProjectKey::new("g", "a"));
        assert!("g".parse::<ProjectKey>().is_err());
        assert!("g:a:1.0".parse::<ProjectKey>().is_err());
    }

    #[test]
    fn test_selector_version_must_match() {
        let project = Project::new(Coordinates::new("g", "a", "1.0"), "/work/a/pom.xml");

        let any: ProjectSelector = "g:a".parse().unwrap();
        assert_eq!(any.key, project.key());
        assert!(any.check(&project).is_ok());

        let exact: ProjectSelector = "g:a:1.0".parse().unwrap();
        assert!(exact.check(&project).is_ok());

        let other: ProjectSelector = "g:a:9.9".parse().unwrap();
        assert_eq!(other.to_string(), "g:a:9.9");
        let err = other.check(&project).unwrap_err();
        assert!(matches!(err, TestPropsError::Config { .. }));
        assert!(err.to_string().contains("g:a:1.0"));

        assert!("g:a:".parse::<ProjectSelector>().is_err());
        assert!("g:a:1:2".parse::<ProjectSelector>().is_err());
    }

    #[test]
    fn test_base_version() {
        assert_eq!(base_version("1.0"), "1.0");
        assert_eq!(base_version("1.0-SNAPSHOT"), "1.0-SNAPSHOT");
        assert_eq!(base_version("1.0-20240102.101112-3"), "1.0-SNAPSHOT");
        assert_eq!(base_version("20240102.101112-3"), "SNAPSHOT");
    }

    #[test]
    fn test_project_defaults() {
        let project = Project::new(Coordinates::new("g", "a", "1.0"), "/work/a/pom.xml");
        assert_eq!(project.basedir(), Path::new("/work/a"));
        assert_eq!(project.build_directory, PathBuf::from("/work/a/target"));
        assert_eq!(project.artifact.extension, "jar");
        assert!(project.artifact.classifier.is_empty());
        assert!(project.artifact.file.is_none());
    }

    #[test]
    fn test_attach_inherits_coordinates() {
        let project = Project::new(Coordinates::new("g", "a", "1.0"), "/work/a/pom.xml")
            .attach("jar", "sources", "/work/a/target/a-1.0-sources.jar");
        let attached = &project.attached[0];
        assert_eq!(attached.group_id, "g");
        assert_eq!(attached.classifier, "sources");
        assert_eq!(attached.file.as_deref(), Some(Path::new("/work/a/target/a-1.0-sources.jar")));
    }

    #[test]
    fn test_validate_identity() {
        let ok = Project::new(Coordinates::new("g", "a", "1.0"), "pom.xml");
        assert!(ok.validate_identity().is_ok());

        let no_version = Project::new(Coordinates::new("g", "a", ""), "pom.xml");
        let err = no_version.validate_identity().unwrap_err();
        assert!(err.to_string().contains("version"));

        let no_descriptor = Project::new(Coordinates::new("g", "a", "1.0"), "");
        assert!(no_descriptor.validate_identity().is_err());
    }
}

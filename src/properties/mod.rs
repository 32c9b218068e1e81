//! Property sets and the rule that merges user-declared values with well-known ones.
//!
//! A [`PropertySet`] is a plain string-to-string map. Conflicts are resolved by a
//! [`MergePolicy`] chosen by the caller rather than per-key branches: user-declared values are
//! inserted with [`MergePolicy::Overwrite`], then every entry of [`WELL_KNOWN_PROPERTIES`] is
//! applied with [`MergePolicy::KeepExisting`]. Adding a well-known key means adding one row to
//! that table.
//!
//! # Example
//!
//! ```rust,no_run
//! use reactor_testprops::models::Coordinates;
//! use reactor_testprops::properties::{PropertySet, WellKnownSource, merge};
//! use std::path::Path;
//!
//! let project = Coordinates::new("g", "a", "1.0");
//! let source = WellKnownSource {
//!     local_repository: Path::new("/home/me/.m2/repository"),
//!     user_settings_file: Path::new("/home/me/.m2/settings.xml"),
//!     project: &project,
//!     workspace_state: Path::new("/work/a/target/workspacestate.properties"),
//!     workspace_resolver: Path::new("/opt/resolver.jar"),
//! };
//!
//! let mut user = PropertySet::new();
//! user.insert("project.version", "override");
//! let merged = merge(user, &source);
//! assert_eq!(merged.get("project.version"), Some("override"));
//! ```

pub mod format;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::constants::{
    LOCAL_REPOSITORY_KEY, PROJECT_ARTIFACT_ID_KEY, PROJECT_GROUP_ID_KEY, PROJECT_VERSION_KEY,
    USER_SETTINGS_FILE_KEY, WORKSPACE_RESOLVER_KEY, WORKSPACE_STATE_KEY,
};
use crate::core::TestPropsError;
use crate::models::Coordinates;
use crate::utils::fs::{absolute_path, atomic_write_with};

/// How [`PropertySet::apply`] treats a key that is already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Replace the existing value.
    Overwrite,
    /// Leave the existing value in place (put-if-absent).
    KeepExisting,
}

/// A set of unique string keys mapped to string values.
///
/// Iteration is sorted by key so that stored files are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertySet {
    entries: BTreeMap<String, String>,
}

impl PropertySet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Insert a value only if the key is absent. Returns `true` if it was inserted.
    pub fn put_if_absent(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        self.apply(key, value, MergePolicy::KeepExisting)
    }

    /// Insert a value according to `policy`. Returns `true` if `value` was stored.
    pub fn apply(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        policy: MergePolicy,
    ) -> bool {
        let key = key.into();
        match policy {
            MergePolicy::Overwrite => {
                self.entries.insert(key, value.into());
                true
            }
            MergePolicy::KeepExisting => {
                if self.entries.contains_key(&key) {
                    false
                } else {
                    self.entries.insert(key, value.into());
                    true
                }
            }
        }
    }

    /// Look up a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Read a properties file.
    ///
    /// # Errors
    ///
    /// Returns [`TestPropsError::InputRead`] if the file cannot be read or is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let input_error = |reason: String| TestPropsError::InputRead {
            path: path.display().to_string(),
            reason,
        };

        let bytes = fs::read(path).map_err(|e| input_error(e.to_string()))?;
        let entries = format::parse(&format::decode(bytes)).map_err(input_error)?;

        Ok(entries.into_iter().collect())
    }

    /// Atomically write the set as a properties file with an optional header comment.
    ///
    /// # Errors
    ///
    /// Returns [`TestPropsError::OutputWrite`] if the file cannot be written; any previous file
    /// at `path` is left untouched.
    pub fn store(&self, path: &Path, header: Option<&str>) -> Result<()> {
        atomic_write_with(path, |writer| format::write_properties(writer, header, self.iter()))
    }
}

impl FromIterator<(String, String)> for PropertySet {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PropertySet {
    type Item = (&'a String, &'a String);
    type IntoIter = std::collections::btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Values the well-known properties are derived from, all taken from the current invocation.
#[derive(Debug, Clone, Copy)]
pub struct WellKnownSource<'a> {
    /// Local artifact repository directory
    pub local_repository: &'a Path,
    /// User settings file
    pub user_settings_file: &'a Path,
    /// The root project's coordinates
    pub project: &'a Coordinates,
    /// Workspace-state file written by this run
    pub workspace_state: &'a Path,
    /// Workspace-resolver artifact
    pub workspace_resolver: &'a Path,
}

/// A well-known key and the function deriving its value.
pub type WellKnownProperty = (&'static str, fn(&WellKnownSource<'_>) -> String);

/// Well-known keys in the order they are applied.
pub const WELL_KNOWN_PROPERTIES: &[WellKnownProperty] = &[
    (LOCAL_REPOSITORY_KEY, local_repository),
    (USER_SETTINGS_FILE_KEY, user_settings_file),
    (PROJECT_GROUP_ID_KEY, project_group_id),
    (PROJECT_ARTIFACT_ID_KEY, project_artifact_id),
    (PROJECT_VERSION_KEY, project_version),
    (WORKSPACE_STATE_KEY, workspace_state),
    (WORKSPACE_RESOLVER_KEY, workspace_resolver),
];

fn local_repository(source: &WellKnownSource<'_>) -> String {
    absolute_display(source.local_repository)
}

fn user_settings_file(source: &WellKnownSource<'_>) -> String {
    absolute_display(source.user_settings_file)
}

fn project_group_id(source: &WellKnownSource<'_>) -> String {
    source.project.group_id.clone()
}

fn project_artifact_id(source: &WellKnownSource<'_>) -> String {
    source.project.artifact_id.clone()
}

fn project_version(source: &WellKnownSource<'_>) -> String {
    source.project.version.clone()
}

fn workspace_state(source: &WellKnownSource<'_>) -> String {
    absolute_display(source.workspace_state)
}

fn workspace_resolver(source: &WellKnownSource<'_>) -> String {
    absolute_display(source.workspace_resolver)
}

/// Render a path as an absolute path string, without touching the file system.
#[must_use]
pub fn absolute_display(path: &Path) -> String {
    absolute_path(path).display().to_string()
}

/// Merge user-declared properties with the well-known ones. User values always win.
#[must_use]
pub fn merge(user: PropertySet, source: &WellKnownSource<'_>) -> PropertySet {
    let mut merged = user;
    for (key, derive) in WELL_KNOWN_PROPERTIES {
        if !merged.put_if_absent(*key, derive(source)) {
            tracing::debug!("Keeping user-declared value for {key}");
        }
    }
    merged
}

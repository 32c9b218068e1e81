//! Variable expansion of user-declared property values.
//!
//! Expansion is best effort. A value that fails to expand is kept verbatim and the run goes on;
//! [`expand_or_original`] is the only place that decision is made.
//!
//! The default [`PlaceholderExpander`] understands `${name}` placeholders. Names resolve through
//! [`Bindings`]: the three invocation bindings (`project`, `localRepository`,
//! `userSettingsFile`) first, then the ambient properties.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::constants::{LOCAL_REPOSITORY_KEY, USER_SETTINGS_FILE_KEY};
use crate::core::TestPropsError;
use crate::models::Project;
use crate::properties::{PropertySet, absolute_display};

/// Everything a placeholder may refer to.
#[derive(Debug, Clone, Copy)]
pub struct Bindings<'a> {
    /// Ambient properties of the invocation
    pub properties: &'a PropertySet,
    /// The root project
    pub project: &'a Project,
    /// Local artifact repository directory
    pub local_repository: &'a Path,
    /// User settings file
    pub user_settings_file: &'a Path,
}

impl Bindings<'_> {
    /// Resolve a placeholder name. Invocation bindings shadow ambient properties.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<String> {
        if name == LOCAL_REPOSITORY_KEY {
            return Some(absolute_display(self.local_repository));
        }
        if name == USER_SETTINGS_FILE_KEY {
            return Some(absolute_display(self.user_settings_file));
        }
        if let Some(value) = self.project_field(name) {
            return Some(value);
        }
        self.properties.get(name).map(str::to_string)
    }

    fn project_field(&self, name: &str) -> Option<String> {
        let project = self.project;
        let value = match name {
            "project" => project.coordinates.to_string(),
            "project.groupId" => project.coordinates.group_id.clone(),
            "project.artifactId" => project.coordinates.artifact_id.clone(),
            "project.version" => project.coordinates.version.clone(),
            "project.baseVersion" => project.artifact.base_version(),
            "project.basedir" => absolute_display(project.basedir()),
            "project.file" => absolute_display(&project.descriptor),
            "project.build.directory" => absolute_display(&project.build_directory),
            _ => return None,
        };
        Some(value)
    }
}

/// Expands a template against a set of bindings.
pub trait Expander {
    /// Expand `text`.
    ///
    /// # Errors
    ///
    /// Returns [`TestPropsError::Expansion`] if the text cannot be expanded.
    fn expand(&self, text: &str, bindings: &Bindings<'_>) -> Result<String, TestPropsError>;
}

/// Replaces every `${name}` with its binding. An undefined name fails the whole value.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderExpander;

impl PlaceholderExpander {
    fn pattern() -> &'static Regex {
        static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
        PLACEHOLDER
            .get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"))
    }
}

impl Expander for PlaceholderExpander {
    fn expand(&self, text: &str, bindings: &Bindings<'_>) -> Result<String, TestPropsError> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for caps in Self::pattern().captures_iter(text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let name = name.as_str().trim();
            let value = bindings.lookup(name).ok_or_else(|| TestPropsError::Expansion {
                text: text.to_string(),
                reason: format!("'{name}' is not defined"),
            })?;

            out.push_str(&text[last..whole.start()]);
            out.push_str(&value);
            last = whole.end();
        }

        out.push_str(&text[last..]);
        Ok(out)
    }
}

impl<F> Expander for F
where
    F: Fn(&str, &Bindings<'_>) -> Result<String, TestPropsError>,
{
    fn expand(&self, text: &str, bindings: &Bindings<'_>) -> Result<String, TestPropsError> {
        self(text, bindings)
    }
}

/// Expand `text`, falling back to the original text if expansion fails.
pub fn expand_or_original<E: Expander + ?Sized>(
    expander: &E,
    text: &str,
    bindings: &Bindings<'_>,
) -> String {
    match expander.expand(text, bindings) {
        Ok(expanded) => expanded,
        Err(e) => {
            tracing::warn!("{e}; keeping the value unexpanded");
            text.to_string()
        }
    }
}

/// Expand every value of `properties`. Keys are left as they are.
pub fn expand_all<E: Expander + ?Sized>(
    expander: &E,
    properties: &PropertySet,
    bindings: &Bindings<'_>,
) -> PropertySet {
    properties
        .iter()
        .map(|(key, value)| (key.to_string(), expand_or_original(expander, value, bindings)))
        .collect()
}

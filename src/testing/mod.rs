//! Readers for the generated properties file, used on the consumer side by test harnesses.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::constants::CLASSPATH_KEY;
use crate::core::TestPropsError;
use crate::properties::PropertySet;

/// A generated test properties file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestProperties {
    properties: PropertySet,
}

impl TestProperties {
    /// Read the properties file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TestPropsError::InputRead`] if it cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self {
            properties: PropertySet::load(path)?,
        })
    }

    /// Value of `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key)
    }

    /// Value of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`TestPropsError::Config`] naming the key if it is absent.
    pub fn required(&self, key: &str) -> Result<&str, TestPropsError> {
        self.get(key).ok_or_else(|| TestPropsError::Config {
            message: format!("test properties do not define '{key}'"),
        })
    }

    /// All properties.
    #[must_use]
    pub fn properties(&self) -> &PropertySet {
        &self.properties
    }
}

impl From<PropertySet> for TestProperties {
    fn from(properties: PropertySet) -> Self {
        Self { properties }
    }
}

/// Dependency information carried in test properties.
#[derive(Debug, Clone)]
pub struct TestDependencies<'a> {
    properties: &'a TestProperties,
}

impl<'a> TestDependencies<'a> {
    /// Read dependencies from `properties`.
    #[must_use]
    pub const fn new(properties: &'a TestProperties) -> Self {
        Self { properties }
    }

    /// The project's classes directory and runtime dependencies, in classpath order.
    ///
    /// Empty segments are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`TestPropsError::Config`] if the `classpath` property is absent.
    pub fn runtime_classpath(&self) -> Result<Vec<PathBuf>, TestPropsError> {
        let classpath = self.properties.required(CLASSPATH_KEY)?;
        Ok(std::env::split_paths(classpath)
            .filter(|path| !path.as_os_str().is_empty())
            .collect())
    }
}

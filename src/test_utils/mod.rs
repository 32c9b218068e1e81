//! Test utilities for reactor-testprops
//!
//! Helpers for laying out a small reactor on disk: per-project descriptors, built artifacts and
//! a `reactor.toml` describing them, all inside a temporary directory.
//!
//! # Example
//!
//! ```rust,no_run
//! use reactor_testprops::test_utils::ReactorFixture;
//!
//! let fixture = ReactorFixture::new()
//!     .unwrap()
//!     .project("g:a:1.0", &["g:b"])
//!     .unwrap()
//!     .built_project("g:b:1.0", &[])
//!     .unwrap();
//! fixture.write_manifest().unwrap();
//! let config = fixture.config().unwrap();
//! ```

use anyhow::{Context, Result, bail};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::{GenerateConfig, ReactorManifest};
use crate::constants::{DEFAULT_CUSTOM_PROPERTIES, REACTOR_MANIFEST};
use crate::utils::fs::safe_write;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` if given, otherwise `RUST_LOG`; with neither,
/// logging stays off.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// A reactor laid out in a temporary directory.
///
/// Every project lives in a directory named after its artifact id with a `pom.xml` descriptor.
/// The manifest's settings point the local repository, user settings and workspace resolver at
/// files inside the fixture, so nothing depends on the home directory.
#[derive(Debug)]
pub struct ReactorFixture {
    dir: TempDir,
    root: Option<String>,
    projects: Vec<String>,
    properties: Vec<(String, String)>,
}

impl ReactorFixture {
    /// Create an empty fixture.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new().context("Failed to create temp directory")?,
            root: None,
            projects: Vec::new(),
            properties: Vec::new(),
        })
    }

    /// The fixture's directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Directory of the project with `artifact_id`.
    #[must_use]
    pub fn project_dir(&self, artifact_id: &str) -> PathBuf {
        self.path().join(artifact_id)
    }

    /// Path of the manifest written by [`write_manifest`](Self::write_manifest).
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.path().join(REACTOR_MANIFEST)
    }

    /// Add a project `g:a:v` without a built artifact, depending on `dependencies` (`g:a`).
    ///
    /// # Errors
    ///
    /// Fails if `gav` is malformed or the descriptor cannot be written.
    pub fn project(self, gav: &str, dependencies: &[&str]) -> Result<Self> {
        self.add(gav, dependencies, false)
    }

    /// Like [`project`](Self::project), with a built `target/<artifact>.jar`.
    ///
    /// # Errors
    ///
    /// Fails if `gav` is malformed or a file cannot be written.
    pub fn built_project(self, gav: &str, dependencies: &[&str]) -> Result<Self> {
        self.add(gav, dependencies, true)
    }

    /// Set the manifest's `root`. Without it the first project added is the root.
    #[must_use]
    pub fn root(mut self, key: &str) -> Self {
        self.root = Some(key.to_string());
        self
    }

    /// Add an ambient property to the manifest.
    #[must_use]
    pub fn property(mut self, key: &str, value: &str) -> Self {
        self.properties.push((key.to_string(), value.to_string()));
        self
    }

    fn add(mut self, gav: &str, dependencies: &[&str], built: bool) -> Result<Self> {
        let parts: Vec<&str> = gav.split(':').collect();
        let [group_id, artifact_id, version] = parts[..] else {
            bail!("expected group:artifact:version, got '{gav}'");
        };

        let dir = self.project_dir(artifact_id);
        let descriptor = format!("<project><artifactId>{artifact_id}</artifactId></project>\n");
        safe_write(&dir.join("pom.xml"), &descriptor)?;

        let mut entry = String::from("[[projects]]\n");
        writeln!(entry, "group-id = \"{group_id}\"")?;
        writeln!(entry, "artifact-id = \"{artifact_id}\"")?;
        writeln!(entry, "version = \"{version}\"")?;
        writeln!(entry, "descriptor = \"{artifact_id}/pom.xml\"")?;
        if built {
            let jar = format!("{artifact_id}/target/{artifact_id}.jar");
            safe_write(&self.path().join(&jar), artifact_id)?;
            writeln!(entry, "artifact = \"{jar}\"")?;
        }
        let dependencies: Vec<String> = dependencies.iter().map(|d| format!("\"{d}\"")).collect();
        writeln!(entry, "dependencies = [{}]", dependencies.join(", "))?;

        if self.root.is_none() && self.projects.is_empty() {
            self.root = Some(format!("{group_id}:{artifact_id}"));
        }
        self.projects.push(entry);
        Ok(self)
    }

    /// Render the manifest text.
    ///
    /// # Errors
    ///
    /// Never in practice; formatting into a `String` is infallible.
    pub fn manifest(&self) -> Result<String> {
        let mut text = String::new();
        if let Some(root) = &self.root {
            writeln!(text, "root = \"{root}\"\n")?;
        }
        text.push_str("[settings]\n");
        text.push_str("local-repository = \"repo\"\n");
        text.push_str("user-settings-file = \"settings.xml\"\n");
        text.push_str("workspace-resolver = \"resolver.jar\"\n\n");
        text.push_str("[properties]\n");
        for (key, value) in &self.properties {
            writeln!(text, "\"{key}\" = \"{value}\"")?;
        }
        for project in &self.projects {
            text.push('\n');
            text.push_str(project);
        }
        Ok(text)
    }

    /// Write `reactor.toml` and return its path.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be written.
    pub fn write_manifest(&self) -> Result<PathBuf> {
        let path = self.manifest_path();
        safe_write(&path, &self.manifest()?)?;
        Ok(path)
    }

    /// Write the custom properties file of the project with `artifact_id`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be written.
    pub fn custom_properties(&self, artifact_id: &str, content: &str) -> Result<PathBuf> {
        let path = self.project_dir(artifact_id).join(DEFAULT_CUSTOM_PROPERTIES);
        safe_write(&path, content)?;
        Ok(path)
    }

    /// Load the written manifest into a configuration for its root.
    ///
    /// # Errors
    ///
    /// Fails if the manifest is missing or the configuration is incomplete.
    pub fn config(&self) -> Result<GenerateConfig> {
        let manifest = ReactorManifest::load(&self.manifest_path())?;
        Ok(manifest.config_builder(None)?.build()?)
    }
}

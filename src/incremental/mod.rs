//! The incremental gate: decides whether the generated files are stale.
//!
//! A [`BuildContext`] is opened at the start of every invocation against the state persisted
//! by the last successful run. The caller registers the inputs that exist now and the outputs
//! it is about to produce, then asks [`BuildContext::is_processing_required`]. Regeneration is
//! required when any of these hold:
//!
//! - there is no usable previous state (first run, unreadable or outdated state file)
//! - the configuration digest changed
//! - an input is new, modified, or was tracked last time but is gone now
//! - the declared outputs differ from last time, or one is missing or no longer matches the
//!   fingerprint recorded when it was written
//!
//! Staleness is tracked per input, so an unmodified custom-properties file can be served from
//! its cached parse even when something else forces regeneration.
//!
//! After a successful regeneration [`BuildContext::commit`] fingerprints every output and
//! atomically replaces the state file. Nothing is persisted when the run is up to date.

pub mod fingerprint;

pub use fingerprint::Fingerprint;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::BUILD_STATE_VERSION;
use crate::core::TestPropsError;
use crate::properties::PropertySet;
use crate::utils::fs::atomic_write;

/// What a tracked input is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRole {
    /// The optional user-authored properties file; its parse is cached
    CustomProperties,
    /// The root project descriptor
    Descriptor,
}

/// A file whose content affects the generated output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedInput {
    /// Location of the file
    pub path: PathBuf,
    /// What the file is used for
    pub role: InputRole,
}

impl TrackedInput {
    /// Track `path` in the given role.
    pub fn new(path: impl Into<PathBuf>, role: InputRole) -> Self {
        Self {
            path: path.into(),
            role,
        }
    }
}

/// How an input compares to the previous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputStatus {
    /// Not tracked by the previous run
    New,
    /// Tracked, but its content changed
    Modified,
    /// Tracked and unchanged
    Unmodified,
}

/// Recorded state of one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecord {
    /// Content fingerprint when it was read
    pub fingerprint: Fingerprint,
    /// Parsed properties, for custom-properties inputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<PropertySet>,
}

/// Recorded state of one output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    /// Content fingerprint right after it was written
    pub fingerprint: Fingerprint,
    /// Inputs that contributed to it
    pub inputs: Vec<String>,
}

/// Everything persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildState {
    /// Format version
    pub version: u32,
    /// Digest of the invocation configuration
    pub config_digest: String,
    /// Tracked inputs keyed by path
    #[serde(default)]
    pub inputs: BTreeMap<String, InputRecord>,
    /// Declared outputs keyed by path
    #[serde(default)]
    pub outputs: BTreeMap<String, OutputRecord>,
}

impl BuildState {
    fn new(config_digest: &str) -> Self {
        Self {
            version: BUILD_STATE_VERSION,
            config_digest: config_digest.to_string(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Read a state file. Any problem yields `None` so the caller treats the run as the first.
    fn load(path: &Path) -> Option<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No previous build state at {}", path.display());
                return None;
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable build state {}: {e}", path.display());
                return None;
            }
        };

        match serde_json::from_str::<Self>(&content) {
            Ok(state) if state.version == BUILD_STATE_VERSION => Some(state),
            Ok(state) => {
                tracing::warn!(
                    "Ignoring build state {} with format version {} \
                     (expected {BUILD_STATE_VERSION})",
                    path.display(),
                    state.version
                );
                None
            }
            Err(e) => {
                tracing::warn!("Ignoring corrupt build state {}: {e}", path.display());
                None
            }
        }
    }
}

fn path_key(path: &Path) -> String {
    path.display().to_string()
}

/// One invocation's view of the incremental state.
#[derive(Debug)]
pub struct BuildContext {
    state_path: PathBuf,
    previous: Option<BuildState>,
    current: BuildState,
    statuses: BTreeMap<String, InputStatus>,
    outputs: Vec<PathBuf>,
}

impl BuildContext {
    /// Open the context, reading the state persisted at `state_path`.
    ///
    /// A missing, unreadable, or incompatible state file is treated as a first run.
    #[must_use]
    pub fn open(state_path: impl Into<PathBuf>, config_digest: &str) -> Self {
        let state_path = state_path.into();
        let previous = BuildState::load(&state_path);
        Self {
            state_path,
            previous,
            current: BuildState::new(config_digest),
            statuses: BTreeMap::new(),
            outputs: Vec::new(),
        }
    }

    /// Whether a previous run left usable state behind.
    #[must_use]
    pub fn has_previous_state(&self) -> bool {
        self.previous.is_some()
    }

    /// Register an existing input and compare it with the previous run.
    ///
    /// # Errors
    ///
    /// Returns [`TestPropsError::InputRead`] if the file cannot be read.
    pub fn register_input(&mut self, path: &Path) -> Result<InputStatus> {
        let key = path_key(path);
        let fingerprint = Fingerprint::of_file(path).map_err(|e| TestPropsError::InputRead {
            path: key.clone(),
            reason: format!("{e:#}"),
        })?;

        let previous = self.previous.as_ref().and_then(|state| state.inputs.get(&key));
        let (status, properties) = match previous {
            None => (InputStatus::New, None),
            Some(record) if record.fingerprint != fingerprint => (InputStatus::Modified, None),
            Some(record) => (InputStatus::Unmodified, record.properties.clone()),
        };

        tracing::debug!("Input {key} is {status:?}");
        self.current.inputs.insert(
            key.clone(),
            InputRecord {
                fingerprint,
                properties,
            },
        );
        self.statuses.insert(key, status);
        Ok(status)
    }

    /// Parsed properties cached for an unmodified input.
    #[must_use]
    pub fn cached_properties(&self, path: &Path) -> Option<&PropertySet> {
        self.current.inputs.get(&path_key(path)).and_then(|record| record.properties.as_ref())
    }

    /// Cache the parsed content of a registered input for the next run.
    pub fn record_properties(&mut self, path: &Path, properties: PropertySet) {
        match self.current.inputs.get_mut(&path_key(path)) {
            Some(record) => record.properties = Some(properties),
            None => {
                tracing::debug!("Not caching properties of unregistered input {}", path.display());
            }
        }
    }

    /// Declare a file this invocation produces.
    pub fn register_output(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.outputs.contains(&path) {
            self.outputs.push(path);
        }
    }

    /// Whether the outputs must be regenerated.
    #[must_use]
    pub fn is_processing_required(&self) -> bool {
        match self.stale_reason() {
            Some(reason) => {
                tracing::debug!("Regeneration required: {reason}");
                true
            }
            None => false,
        }
    }

    fn stale_reason(&self) -> Option<String> {
        let Some(previous) = &self.previous else {
            return Some("no previous build state".to_string());
        };

        if previous.config_digest != self.current.config_digest {
            return Some("configuration changed".to_string());
        }

        if let Some((path, status)) =
            self.statuses.iter().find(|(_, status)| **status != InputStatus::Unmodified)
        {
            return Some(format!("input {path} is {status:?}"));
        }

        if let Some(removed) =
            previous.inputs.keys().find(|key| !self.statuses.contains_key(*key))
        {
            return Some(format!("input {removed} was removed"));
        }

        let declared: BTreeSet<String> = self.outputs.iter().map(|p| path_key(p)).collect();
        let recorded: BTreeSet<String> = previous.outputs.keys().cloned().collect();
        if declared != recorded {
            return Some("declared outputs changed".to_string());
        }

        for output in &self.outputs {
            let key = path_key(output);
            let Some(record) = previous.outputs.get(&key) else {
                return Some(format!("output {key} was never recorded"));
            };
            match Fingerprint::of_file(output) {
                Ok(fingerprint) if fingerprint == record.fingerprint => {}
                Ok(_) => return Some(format!("output {key} was modified")),
                Err(_) => return Some(format!("output {key} is missing or unreadable")),
            }
        }

        None
    }

    /// Confirm the existing outputs as current. Nothing is rewritten.
    pub fn mark_outputs_uptodate(&self) {
        for output in &self.outputs {
            tracing::debug!("Output {} is up to date", output.display());
        }
    }

    /// Fingerprint every declared output and persist the state for the next run.
    ///
    /// # Errors
    ///
    /// Returns [`TestPropsError::OutputWrite`] if a declared output does not exist or the state
    /// file cannot be written.
    pub fn commit(mut self) -> Result<()> {
        let inputs: Vec<String> = self.current.inputs.keys().cloned().collect();

        for output in &self.outputs {
            let key = path_key(output);
            let fingerprint = Fingerprint::of_file(output).map_err(|e| TestPropsError::OutputWrite {
                path: key.clone(),
                reason: format!("declared output was not produced: {e:#}"),
            })?;
            self.current.outputs.insert(
                key,
                OutputRecord {
                    fingerprint,
                    inputs: inputs.clone(),
                },
            );
        }

        let json =
            serde_json::to_string_pretty(&self.current).map_err(|e| TestPropsError::OutputWrite {
                path: path_key(&self.state_path),
                reason: e.to_string(),
            })?;
        atomic_write(&self.state_path, json.as_bytes())?;

        tracing::debug!("Saved build state to {}", self.state_path.display());
        Ok(())
    }

    /// Register whichever `inputs` exist and the `outputs`, then decide.
    ///
    /// An input that exists but cannot be read counts as changed; the read error itself is
    /// reported by whoever loads the file.
    pub fn is_regeneration_required(
        &mut self,
        inputs: &[TrackedInput],
        outputs: &[PathBuf],
    ) -> bool {
        for input in inputs {
            if !input.path.is_file() {
                continue;
            }
            if let Err(e) = self.register_input(&input.path) {
                tracing::warn!("{e:#}");
                return true;
            }
        }
        for output in outputs {
            self.register_output(output.clone());
        }
        self.is_processing_required()
    }
}

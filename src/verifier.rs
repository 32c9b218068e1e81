//! Assertions over a build log.
//!
//! Integration tests that drive a full build use this to check the log the build produced.
//! A missing or unreadable log is treated as empty, so text assertions on it fail.

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::core::TestPropsError;

const ERROR_MARKER: &str = "[ERROR]";

/// The lines of one build log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifierResult {
    log: Vec<String>,
}

impl VerifierResult {
    /// Read `log_file`. A missing or unreadable file yields an empty log.
    #[must_use]
    pub fn load(log_file: &Path) -> Self {
        match fs::read(log_file) {
            Ok(bytes) => Self::from_lines(String::from_utf8_lossy(&bytes).lines()),
            Err(e) => {
                tracing::debug!("Treating unreadable log {} as empty: {e}", log_file.display());
                Self::default()
            }
        }
    }

    /// Build from already captured lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            log: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// The captured lines.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.log
    }

    /// Fail if any line contains `[ERROR]`, listing every such line.
    ///
    /// # Errors
    ///
    /// Returns [`TestPropsError::Verification`] with the offending lines.
    pub fn assert_error_free_log(&self) -> Result<()> {
        let errors: Vec<&str> = self
            .log
            .iter()
            .filter(|line| line.contains(ERROR_MARKER))
            .map(String::as_str)
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(TestPropsError::Verification {
                message: format!("Log contains errors:\n{}", errors.join("\n")),
            }
            .into())
        }
    }

    /// Succeed if some line contains `text`.
    ///
    /// # Errors
    ///
    /// Returns [`TestPropsError::Verification`] `Log text not present: <text>` otherwise.
    pub fn assert_log_text(&self, text: &str) -> Result<()> {
        if self.log.iter().any(|line| line.contains(text)) {
            return Ok(());
        }
        Err(TestPropsError::Verification {
            message: format!("Log text not present: {text}"),
        }
        .into())
    }
}

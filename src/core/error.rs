//! Error handling for reactor-testprops
//!
//! Errors come in two layers:
//! 1. [`TestPropsError`] - the typed failure taxonomy of a generation run
//! 2. [`ErrorContext`] - a wrapper that adds user-facing suggestions for the CLI
//!
//! Fatal variants abort the whole invocation. [`TestPropsError::Expansion`] is the one
//! non-fatal variant: it never crosses the expander boundary because
//! [`crate::expand::expand_or_original`] swallows it and keeps the literal text.
//!
//! # Examples
//!
//! ```rust,no_run
//! use reactor_testprops::core::{TestPropsError, user_friendly_error};
//!
//! let error = TestPropsError::GraphIntegrity {
//!     reason: "cycle detected: g:a:1 → g:b:1 → g:a:1".to_string(),
//! };
//! let context = user_friendly_error(anyhow::Error::from(error));
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The error type for test-properties generation.
///
/// # Categories
///
/// - [`InputRead`](TestPropsError::InputRead) - the custom properties file exists but cannot be
///   read or parsed
/// - [`GraphIntegrity`](TestPropsError::GraphIntegrity) - a cycle or a project with missing
///   identity fields was found in the reactor graph
/// - [`OutputWrite`](TestPropsError::OutputWrite) - a persisted file could not be written
/// - [`Expansion`](TestPropsError::Expansion) - a single value failed to expand (non-fatal)
/// - [`Config`](TestPropsError::Config) - the invocation configuration is incomplete or invalid
/// - [`Verification`](TestPropsError::Verification) - a build-log assertion failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TestPropsError {
    /// An input file exists but could not be read or parsed.
    #[error("Could not read properties file {path}: {reason}")]
    InputRead {
        /// Path of the offending input file
        path: String,
        /// What went wrong
        reason: String,
    },

    /// The dependency graph is not a well-formed DAG of fully identified projects.
    #[error("Reactor graph integrity violated: {reason}")]
    GraphIntegrity {
        /// Description of the violation, naming the offending project(s)
        reason: String,
    },

    /// A persisted file could not be written.
    #[error("Could not write {path}: {reason}")]
    OutputWrite {
        /// Path of the file that could not be written
        path: String,
        /// What went wrong
        reason: String,
    },

    /// Expansion of a single property value failed.
    #[error("Could not expand '{text}': {reason}")]
    Expansion {
        /// The unexpanded text
        text: String,
        /// Why expansion failed
        reason: String,
    },

    /// Invalid or incomplete configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// A build-log assertion failed.
    #[error("Log verification failed: {message}")]
    Verification {
        /// Description of the failed assertion
        message: String,
    },
}

impl TestPropsError {
    /// Returns `true` if this error aborts a generation run.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Expansion { .. })
    }
}

/// Error wrapper carrying a suggestion and details for CLI display.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: TestPropsError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: TestPropsError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr: error in red, details in yellow, suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with an actionable suggestion.
///
/// Recognizes [`TestPropsError`] anywhere in the error chain, then plain
/// [`std::io::Error`]s. Anything else is reported with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(known) = error.chain().find_map(|cause| cause.downcast_ref::<TestPropsError>()) {
        return create_error_context(known.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        if io_error.kind() == std::io::ErrorKind::PermissionDenied {
            return ErrorContext::new(TestPropsError::OutputWrite {
                path: "unknown".to_string(),
                reason: io_error.to_string(),
            })
            .with_suggestion("Check ownership and permissions of the build output directory");
        }
    }

    ErrorContext::new(TestPropsError::Config {
        message: describe_chain(&error),
    })
}

fn describe_chain(error: &anyhow::Error) -> String {
    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    message
}

fn create_error_context(error: TestPropsError) -> ErrorContext {
    match &error {
        TestPropsError::InputRead { path, .. } => {
            let suggestion = format!(
                "Fix the syntax of {path}: one key=value pair per line, \
                 '\\uXXXX' escapes must have four hex digits"
            );
            ErrorContext::new(error)
                .with_suggestion(suggestion)
                .with_details("No output was written or updated")
        }
        TestPropsError::GraphIntegrity { .. } => ErrorContext::new(error)
            .with_suggestion(
                "Check the project dependencies in the reactor manifest for cycles and make sure \
                 every project declares groupId, artifactId, version and descriptor",
            ),
        TestPropsError::OutputWrite { .. } => ErrorContext::new(error)
            .with_suggestion("Check free disk space and permissions of the build output directory")
            .with_details("Files from the previous successful run were left untouched"),
        TestPropsError::Config { .. } => ErrorContext::new(error)
            .with_suggestion("Run 'testprops generate --help' to list the recognized options"),
        TestPropsError::Expansion { .. } | TestPropsError::Verification { .. } => {
            ErrorContext::new(error)
        }
    }
}

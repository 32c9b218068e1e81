//! Core types shared by every stage of a generation run.
//!
//! - [`TestPropsError`] - the typed failure taxonomy (input read, graph integrity, output
//!   write, expansion, configuration, verification)
//! - [`ErrorContext`] and [`user_friendly_error`] - CLI-facing error presentation
//!
//! Library functions return [`anyhow::Result`] and attach [`TestPropsError`] values as the
//! root cause, so callers can either downcast for precise handling or print the chain.

pub mod error;

pub use error::{ErrorContext, TestPropsError, user_friendly_error};

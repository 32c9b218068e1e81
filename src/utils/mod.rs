//! Shared utilities.
//!
//! - [`fs`] - directory helpers, path normalization and atomic file writes

pub mod fs;

pub use fs::{absolute_path, atomic_write, atomic_write_with, ensure_dir, safe_write};

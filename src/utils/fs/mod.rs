//! File system utilities.
//!
//! Every file this crate persists goes through [`atomic_write`] or [`atomic_write_with`]: data is
//! assembled in a temporary file next to the target and renamed over it only once complete, so a
//! failed run never leaves a truncated output that looks current.

pub mod atomic;
pub mod dirs;
pub mod paths;

pub use atomic::{atomic_write, atomic_write_with, safe_write};
pub use dirs::ensure_dir;
pub use paths::{absolute_path, normalize_path, resolve_against};

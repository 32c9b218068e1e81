//! Atomic file writes using a temp-file-and-rename strategy.
//!
//! Content is streamed into a temporary file created in the target's own directory, synced,
//! and then renamed over the target. Readers see either the previous file or the complete new
//! one. If the writer fails part way, the temporary file is removed and the target is left
//! exactly as it was.

use anyhow::Result;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use crate::core::TestPropsError;
use crate::utils::fs::dirs::ensure_dir;

/// Atomically write a string to `path`.
///
/// # Errors
///
/// Returns [`TestPropsError::OutputWrite`] if any step fails.
pub fn safe_write(path: &Path, content: &str) -> Result<()> {
    atomic_write(path, content.as_bytes())
}

/// Atomically write bytes to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`TestPropsError::OutputWrite`] if any step fails.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    atomic_write_with(path, |writer| writer.write_all(content))
}

/// Atomically write whatever `write` streams into the provided writer.
///
/// The closure may fail at any point; the partially written temporary file is discarded and
/// the error is surfaced. The target file is only replaced after the closure returns `Ok`
/// and the data has been synced to disk.
///
/// # Errors
///
/// Returns [`TestPropsError::OutputWrite`] naming `path` if the directory cannot be created,
/// the closure fails, or the final rename fails.
pub fn atomic_write_with<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let output_error = |reason: String| TestPropsError::OutputWrite {
        path: path.display().to_string(),
        reason,
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    ensure_dir(parent).map_err(|e| output_error(format!("{e:#}")))?;

    let mut temp = NamedTempFile::new_in(parent)
        .map_err(|e| output_error(format!("cannot create temporary file: {e}")))?;

    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        write(&mut writer).map_err(|e| output_error(e.to_string()))?;
        writer.flush().map_err(|e| output_error(e.to_string()))?;
    }

    temp.as_file()
        .sync_all()
        .map_err(|e| output_error(format!("cannot sync to disk: {e}")))?;

    temp.persist(path).map_err(|e| output_error(format!("cannot replace file: {}", e.error)))?;

    tracing::trace!("Wrote {}", path.display());
    Ok(())
}

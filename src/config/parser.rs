//! TOML parsing with file path context in error messages.

use anyhow::{Context, Result};
use std::path::Path;

/// Parse a TOML file into any deserializable type.
///
/// # Errors
///
/// Returns an error naming the file if it cannot be read or does not match `T`.
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: T = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}

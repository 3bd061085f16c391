//! Reading static data files (availability records, value lists).
//!
//! The format is chosen by extension: `.json` or `.toml`. Files are read
//! once, when a layer is attached, never on the call path.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Toml,
}

impl DataFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(DataFormat::Json),
            Some("toml") => Ok(DataFormat::Toml),
            Some(other) => bail!(
                "unsupported data file extension `.{}` for {} (expected .json or .toml)",
                other,
                path.display()
            ),
            None => bail!(
                "cannot detect format of {} (expected a .json or .toml extension)",
                path.display()
            ),
        }
    }
}

/// Read and deserialize a data file.
pub fn read_data_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = DataFormat::from_path(path)?;
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read data file: {}", path.display()))?;

    tracing::debug!("reading {:?} data from {}", format, path.display());

    match format {
        DataFormat::Json => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON data file: {}", path.display())),
        DataFormat::Toml => toml::from_str(&contents)
            .with_context(|| format!("failed to parse TOML data file: {}", path.display())),
    }
}

/// Resolve a possibly relative data path against a base directory.
pub fn resolve_data_path(path: &Path, base: Option<&Path>) -> std::path::PathBuf {
    match base {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}

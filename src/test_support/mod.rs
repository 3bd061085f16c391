//! Test utilities for normargs unit tests.
//!
//! Provides shared availability fixtures and a scratch data directory for
//! tests that load tables and value lists from disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use normargs::test_support::{fixtures, DataDir};
//!
//! #[test]
//! fn test_example() {
//!     let data = DataDir::new();
//!     let path = data.write("ensemble.toml", fixtures::ensemble_toml());
//!     let table = Availability::from_path(&path).unwrap();
//! }
//! ```

pub mod fixtures;

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary directory holding data files.
#[derive(Debug)]
pub struct DataDir {
    dir: TempDir,
}

impl DataDir {
    pub fn new() -> Self {
        DataDir {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the directory and return its full path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create fixture dir");
        }
        std::fs::write(&path, contents).expect("failed to write fixture");
        path
    }
}

impl Default for DataDir {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::Availability;
    use crate::core::value::Value;

    #[test]
    fn test_ensemble_fixture_expands() {
        let data = DataDir::new();
        let path = data.write("tables/ensemble.toml", fixtures::ensemble_toml());

        let table = Availability::from_path(&path).unwrap();
        assert_eq!(table.keys(), ["origin", "number", "param"]);
        assert_eq!(table.len(), 8);
        assert_eq!(
            table.values_of("origin"),
            Some([Value::from("dwd"), Value::from("ecmwf")].into_iter().collect())
        );
    }

    #[test]
    fn test_string_level_fixture_loads() {
        let data = DataDir::new();
        let path = data.write("forecast.json", fixtures::forecast_json_with_string_levels());

        let table = Availability::from_path(&path).unwrap();
        assert_eq!(
            table.values_of("level"),
            Some([Value::from("1000"), Value::from("500")].into_iter().collect())
        );
    }
}

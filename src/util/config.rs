//! Configuration file support for normargs.
//!
//! Two configuration file locations are read:
//! - Global: `~/.normargs/config.toml` - User-wide defaults
//! - Project: `.normargs/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::errors::DEFAULT_MAX_CANDIDATES;
use crate::pipeline::ImplicitNormalizers;

/// normargs configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Availability settings
    pub availability: AvailabilityConfig,

    /// Diagnostic output settings
    pub diagnostics: DiagnosticsConfig,
}

/// Availability-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AvailabilityConfig {
    /// Whether availability layers after the first add implicit normalizers
    #[serde(alias = "implicit_normalizers")]
    pub implicit_normalizers: Option<ImplicitNormalizers>,

    /// Base directory for relative availability and value files
    #[serde(alias = "data_dir")]
    pub data_dir: Option<PathBuf>,
}

/// Diagnostic output configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DiagnosticsConfig {
    /// Candidate values listed per key
    #[serde(alias = "max_candidates")]
    pub max_candidates: Option<usize>,

    /// Colored terminal output
    pub color: Option<bool>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file is missing
    /// or broken.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create config directory: {}", parent.display())
            })?;
        }

        let contents =
            toml::to_string_pretty(self).with_context(|| "failed to serialize config")?;

        std::fs::write(path, contents)
            .with_context(|| format!("failed to write config file: {}", path.display()))
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.availability.implicit_normalizers.is_some() {
            self.availability.implicit_normalizers = other.availability.implicit_normalizers;
        }
        if other.availability.data_dir.is_some() {
            self.availability.data_dir = other.availability.data_dir;
        }

        if other.diagnostics.max_candidates.is_some() {
            self.diagnostics.max_candidates = other.diagnostics.max_candidates;
        }
        if other.diagnostics.color.is_some() {
            self.diagnostics.color = other.diagnostics.color;
        }
    }

    pub fn implicit_normalizers(&self) -> ImplicitNormalizers {
        self.availability.implicit_normalizers.unwrap_or_default()
    }

    pub fn max_candidates(&self) -> usize {
        self.diagnostics
            .max_candidates
            .unwrap_or(DEFAULT_MAX_CANDIDATES)
    }

    pub fn color(&self) -> bool {
        self.diagnostics.color.unwrap_or(true)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.normargs/config.toml)
/// 2. Global config (~/.normargs/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    if global_path.exists() {
        config.merge(Config::load_or_default(global_path));
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global normargs config directory (~/.normargs).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".normargs"))
}

/// Get the global config path (~/.normargs/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.normargs/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".normargs").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.implicit_normalizers(), ImplicitNormalizers::Always);
        assert_eq!(config.max_candidates(), DEFAULT_MAX_CANDIDATES);
        assert!(config.color());
        assert!(config.availability.data_dir.is_none());
    }

    #[test]
    fn test_config_load() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");

        std::fs::write(
            &config_path,
            r#"
[availability]
implicit_normalizers = "first-only"
data_dir = "./data"

[diagnostics]
max_candidates = 5
color = false
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.implicit_normalizers(), ImplicitNormalizers::FirstOnly);
        assert_eq!(config.availability.data_dir, Some(PathBuf::from("./data")));
        assert_eq!(config.max_candidates(), 5);
        assert!(!config.color());
    }

    #[test]
    fn test_config_merge() {
        let mut base = Config::default();
        base.diagnostics.max_candidates = Some(4);
        base.availability.implicit_normalizers = Some(ImplicitNormalizers::FirstOnly);

        let mut override_cfg = Config::default();
        override_cfg.diagnostics.max_candidates = Some(20);

        base.merge(override_cfg);

        assert_eq!(base.max_candidates(), 20);
        assert_eq!(base.implicit_normalizers(), ImplicitNormalizers::FirstOnly); // Not overridden
    }

    #[test]
    fn test_broken_config_falls_back() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.toml");
        std::fs::write(&config_path, "[availability\n").unwrap();

        assert_eq!(Config::load_or_default(&config_path), Config::default());
    }

    #[test]
    fn test_config_save_round_trip() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.diagnostics.color = Some(false);
        config.save(&config_path).unwrap();

        let loaded = Config::load(&config_path).unwrap();
        assert!(!loaded.color());
    }

    #[test]
    fn test_load_config_precedence() {
        let tmp = TempDir::new().unwrap();
        let global_path = tmp.path().join("global.toml");
        let project_path = tmp.path().join("project.toml");

        std::fs::write(
            &global_path,
            r#"
[availability]
implicit-normalizers = "first-only"
data-dir = "/srv/avail"

[diagnostics]
max-candidates = 3
"#,
        )
        .unwrap();

        std::fs::write(
            &project_path,
            r#"
[availability]
data-dir = "./avail"
"#,
        )
        .unwrap();

        let config = load_config(&global_path, &project_path);

        assert_eq!(config.availability.data_dir, Some(PathBuf::from("./avail")));
        assert_eq!(config.implicit_normalizers(), ImplicitNormalizers::FirstOnly);
        assert_eq!(config.max_candidates(), 3);
    }
}

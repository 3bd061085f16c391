//! Global context for normargs operations.
//!
//! The context is created once at startup and owns everything that is
//! process-wide: the merged configuration, the directory relative data files
//! are resolved against, and the settings store. Nothing in the library
//! reaches for it implicitly; callers pass what they need from it into
//! builders. [`GlobalContext::reset`] reloads everything from disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::availability::Availability;
use crate::pipeline::{AvailabilityOptions, ImplicitNormalizers};
use crate::util::config::{global_config_path, load_config, project_config_path, Config};
use crate::util::data::resolve_data_path;
use crate::util::settings::Settings;

/// Global context containing configuration and paths.
#[derive(Debug)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Merged global and project configuration
    config: Config,

    /// Base directory for relative data files
    data_dir: PathBuf,

    /// Runtime settings seeded from the configuration
    settings: Settings,
}

impl GlobalContext {
    /// Create a new GlobalContext for the current directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd))
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Self {
        let global = global_config_path().unwrap_or_else(|| PathBuf::from(".normargs/config.toml"));
        let config = load_config(&global, &project_config_path(&cwd));
        Self::with_config(cwd, config)
    }

    /// Create a GlobalContext from an already loaded configuration.
    pub fn with_config(cwd: PathBuf, config: Config) -> Self {
        let data_dir = match &config.availability.data_dir {
            Some(dir) => resolve_data_path(dir, Some(&cwd)),
            None => cwd.clone(),
        };

        let mut settings = Settings::from_config(&config);
        let settings_path = settings_path(&cwd);
        if settings_path.exists() {
            if let Err(e) = settings.load_overrides(&settings_path) {
                tracing::warn!("Failed to load settings: {:#}", e);
            }
        }

        tracing::debug!("data directory: {}", data_dir.display());

        GlobalContext {
            cwd,
            config,
            data_dir,
            settings,
        }
    }

    /// Reload configuration and settings from disk, dropping runtime changes
    /// and callbacks.
    pub fn reset(&mut self) {
        *self = Self::with_cwd(self.cwd.clone());
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the base directory for relative data files.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Get the project settings file (.normargs/settings.toml).
    pub fn settings_path(&self) -> PathBuf {
        settings_path(&self.cwd)
    }

    /// Persist explicitly set settings.
    pub fn save_settings(&self) -> Result<()> {
        self.settings.save(&self.settings_path())
    }

    /// Resolve a data file path against the data directory.
    pub fn resolve_data_path(&self, path: &Path) -> PathBuf {
        resolve_data_path(path, Some(&self.data_dir))
    }

    /// Load an availability file, resolving relative paths.
    pub fn load_availability(&self, path: &Path) -> Result<Availability> {
        Availability::from_path(self.resolve_data_path(path))
    }

    /// Builder options for availability layers.
    pub fn availability_options(&self) -> AvailabilityOptions {
        AvailabilityOptions {
            implicit: self.implicit_normalizers(),
        }
    }

    pub fn implicit_normalizers(&self) -> ImplicitNormalizers {
        self.settings.implicit_normalizers()
    }

    pub fn max_candidates(&self) -> usize {
        self.settings.max_candidates()
    }

    /// Check if color output is enabled.
    pub fn color(&self) -> bool {
        self.settings.color()
    }
}

fn settings_path(cwd: &Path) -> PathBuf {
    cwd.join(".normargs").join("settings.toml")
}

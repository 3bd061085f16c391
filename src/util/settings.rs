//! Runtime settings store.
//!
//! Settings are named values seeded from the merged configuration. They can
//! be changed at runtime, reset to their defaults, and persisted as a small
//! TOML file of explicit overrides. The pipeline itself never reads them;
//! the CLI turns them into builder options.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::pipeline::ImplicitNormalizers;
use crate::util::config::Config;

pub const IMPLICIT_NORMALIZERS: &str = "implicit-normalizers";
pub const MAX_CANDIDATES: &str = "max-candidates";
pub const COLOR: &str = "color";

/// Callback invoked with the name of a changed setting.
pub type ChangeCallback = Box<dyn Fn(&str) + Send + Sync>;

/// Error changing a setting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("unknown setting `{name}`")]
    Unknown { name: String },

    #[error("invalid value `{value}` for setting `{name}`: expected {expected}")]
    Invalid {
        name: String,
        value: toml::Value,
        expected: &'static str,
    },
}

struct Setting {
    description: &'static str,
    expected: &'static str,
    check: fn(&toml::Value) -> bool,
    default: toml::Value,
    value: Option<toml::Value>,
}

impl Setting {
    fn current(&self) -> &toml::Value {
        self.value.as_ref().unwrap_or(&self.default)
    }
}

/// The settings store.
pub struct Settings {
    settings: BTreeMap<&'static str, Setting>,
    callbacks: Vec<ChangeCallback>,
}

impl Settings {
    /// Create the store with defaults taken from `config`.
    pub fn from_config(config: &Config) -> Self {
        let mut settings = BTreeMap::new();

        settings.insert(
            IMPLICIT_NORMALIZERS,
            Setting {
                description: "whether every availability layer adds implicit normalizers",
                expected: "\"always\" or \"first-only\"",
                check: |v| {
                    v.clone().try_into::<ImplicitNormalizers>().is_ok()
                },
                default: toml::Value::String(implicit_str(config.implicit_normalizers()).into()),
                value: None,
            },
        );
        settings.insert(
            MAX_CANDIDATES,
            Setting {
                description: "candidate values listed per key in diagnostics",
                expected: "a non-negative integer",
                check: |v| v.as_integer().is_some_and(|i| i >= 0),
                default: toml::Value::Integer(config.max_candidates() as i64),
                value: None,
            },
        );
        settings.insert(
            COLOR,
            Setting {
                description: "colored terminal output",
                expected: "a boolean",
                check: |v| v.is_bool(),
                default: toml::Value::Boolean(config.color()),
                value: None,
            },
        );

        Settings {
            settings,
            callbacks: Vec::new(),
        }
    }

    /// Names of every setting, sorted.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.settings.keys().copied()
    }

    pub fn description(&self, name: &str) -> Option<&'static str> {
        self.settings.get(name).map(|s| s.description)
    }

    /// Current value of a setting.
    pub fn get(&self, name: &str) -> Option<&toml::Value> {
        self.settings.get(name).map(Setting::current)
    }

    pub fn get_or(&self, name: &str, default: toml::Value) -> toml::Value {
        self.get(name).cloned().unwrap_or(default)
    }

    /// Whether a setting differs from its default because it was set.
    pub fn is_set(&self, name: &str) -> bool {
        self.settings.get(name).is_some_and(|s| s.value.is_some())
    }

    /// Change a setting and notify callbacks.
    pub fn set(&mut self, name: &str, value: toml::Value) -> Result<(), SettingsError> {
        let setting = self
            .settings
            .get_mut(name)
            .ok_or_else(|| SettingsError::Unknown {
                name: name.to_string(),
            })?;

        if !(setting.check)(&value) {
            return Err(SettingsError::Invalid {
                name: name.to_string(),
                value,
                expected: setting.expected,
            });
        }

        tracing::debug!("setting `{}` = {}", name, value);
        setting.value = Some(value);
        self.notify(name);
        Ok(())
    }

    /// Restore one setting, or all of them, to the default.
    pub fn reset(&mut self, name: Option<&str>) -> Result<(), SettingsError> {
        match name {
            Some(name) => {
                let setting =
                    self.settings
                        .get_mut(name)
                        .ok_or_else(|| SettingsError::Unknown {
                            name: name.to_string(),
                        })?;
                setting.value = None;
                self.notify(name);
            }
            None => {
                let names: Vec<&'static str> = self.names().collect();
                for setting in self.settings.values_mut() {
                    setting.value = None;
                }
                for name in names {
                    self.notify(name);
                }
            }
        }
        Ok(())
    }

    /// Register a callback for changes.
    pub fn on_change(&mut self, callback: impl Fn(&str) + Send + Sync + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    fn notify(&self, name: &str) {
        for callback in &self.callbacks {
            callback(name);
        }
    }

    /// Write explicitly set values to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let overrides: toml::Table = self
            .settings
            .iter()
            .filter_map(|(name, s)| s.value.clone().map(|v| (name.to_string(), v)))
            .collect();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create settings directory: {}", parent.display())
            })?;
        }

        let contents =
            toml::to_string_pretty(&overrides).with_context(|| "failed to serialize settings")?;
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write settings file: {}", path.display()))
    }

    /// Apply values saved by [`Settings::save`]. Unknown or invalid entries
    /// are skipped with a warning.
    pub fn load_overrides(&mut self, path: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file: {}", path.display()))?;
        let table: toml::Table = toml::from_str(&contents)
            .with_context(|| format!("failed to parse settings file: {}", path.display()))?;

        for (name, value) in table {
            if let Err(e) = self.set(&name, value) {
                tracing::warn!("Ignoring setting from {}: {}", path.display(), e);
            }
        }
        Ok(())
    }

    pub fn implicit_normalizers(&self) -> ImplicitNormalizers {
        self.get(IMPLICIT_NORMALIZERS)
            .and_then(|v| v.clone().try_into().ok())
            .unwrap_or_default()
    }

    pub fn max_candidates(&self) -> usize {
        self.get(MAX_CANDIDATES)
            .and_then(toml::Value::as_integer)
            .and_then(|i| usize::try_from(i).ok())
            .unwrap_or(crate::errors::DEFAULT_MAX_CANDIDATES)
    }

    pub fn color(&self) -> bool {
        self.get(COLOR)
            .and_then(toml::Value::as_bool)
            .unwrap_or(true)
    }

    /// Parse a command-line value: TOML syntax if it parses, a bare string
    /// otherwise.
    pub fn parse_value(raw: &str) -> toml::Value {
        toml::from_str::<toml::Table>(&format!("value = {}", raw))
            .ok()
            .and_then(|mut t| t.remove("value"))
            .unwrap_or_else(|| toml::Value::String(raw.to_string()))
    }
}

fn implicit_str(implicit: ImplicitNormalizers) -> &'static str {
    match implicit {
        ImplicitNormalizers::Always => "always",
        ImplicitNormalizers::FirstOnly => "first-only",
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.settings.iter().map(|(name, s)| (name, s.current())))
            .finish()
    }
}

//! Preference store for dragscroll.
//!
//! Preferences live in `~/.config/dragscroll/config.toml` and are read exactly
//! once at startup. Lookups are typed: a value of the wrong type reads as
//! absent, and [`Tunables::from_store`] substitutes the documented default.
//! A missing or unparsable file therefore yields the default tunables rather
//! than an error.

pub mod tunables;

pub use tunables::Tunables;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Typed read access to persisted preferences.
pub trait PreferenceStore {
    /// Integer value for `key`, if present, integral, and representable as `i32`.
    fn get_int(&self, key: &str) -> Option<i32>;

    /// String array for `key`, if present, holding only strings, and at most `max_count` long.
    fn get_string_array(&self, key: &str, max_count: usize) -> Option<Vec<String>>;
}

/// Shape of the configuration file, used to publish its JSON schema.
///
/// # Example TOML
/// ```toml
/// # 1-based button that toggles autoscroll (0 disables, otherwise 3-32)
/// button = 3
/// # Modifiers that must all be held: capslock, shift, control, option, command
/// keys = ["shift"]
/// # Velocity multiplier (negative values invert direction)
/// speed = 3
/// ```
#[derive(Debug, Serialize, Deserialize, Default, JsonSchema)]
pub struct Config {
    /// Button number toggling autoscroll; 0 disables button mode, otherwise 3-32 (default 3)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<i64>,

    /// Modifier names that must all be held for key mode (at most 5; empty disables key mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<String>>,

    /// Integer speed multiplier (default 3)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<i64>,
}

impl Config {
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }

    /// Returns the path to the configuration file.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined (e.g., HOME not set).
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("dragscroll");

        Ok(config_dir.join("config.toml"))
    }
}

/// [`PreferenceStore`] backed by a parsed TOML table.
#[derive(Debug, Default)]
pub struct TomlPreferences {
    table: toml::Table,
}

impl TomlPreferences {
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        Ok(Self {
            table: toml::from_str(source)?,
        })
    }

    /// Loads preferences from `path`, or from the default location when `None`.
    ///
    /// # Errors
    /// Returns an error only if the default location cannot be determined or an
    /// existing file cannot be read. Syntax errors fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Config::get_config_path()?,
        };

        if !config_path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", config_path.display());
            return Ok(Self::default());
        }

        let source = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        match Self::from_toml_str(&source) {
            Ok(prefs) => {
                info!("Loaded config from {}", config_path.display());
                Ok(prefs)
            }
            Err(err) => {
                warn!(
                    "Failed to parse config from {}, using defaults: {}",
                    config_path.display(),
                    err
                );
                Ok(Self::default())
            }
        }
    }
}

impl PreferenceStore for TomlPreferences {
    fn get_int(&self, key: &str) -> Option<i32> {
        let value = self.table.get(key)?.as_integer()?;
        i32::try_from(value).ok()
    }

    fn get_string_array(&self, key: &str, max_count: usize) -> Option<Vec<String>> {
        let array = self.table.get(key)?.as_array()?;
        if array.len() > max_count {
            return None;
        }
        array
            .iter()
            .map(|value| value.as_str().map(str::to_owned))
            .collect()
    }
}

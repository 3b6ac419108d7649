//! Config
//!
//! Module toggles, optionally overridden per store.

use std::{fmt, fs, path::Path};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Store id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(pub u32);

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Configuration Errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading the config file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse config: {0}")]
    Yaml(#[from] serde_norway::Error),
}

/// Per-store overrides; unset values fall back to the global setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOverrides {
    /// Module toggle for the store
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Message toggle for the store
    #[serde(default)]
    pub messages_enabled: Option<bool>,
}

/// Module configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Whether exclusion logic runs at all
    pub enabled: bool,

    /// Whether shopper-facing messages are built
    pub messages_enabled: bool,

    /// Bypass flag given to new rules and written by the sync utility
    pub bypass_default: bool,

    /// Per-store overrides
    pub stores: FxHashMap<StoreId, StoreOverrides>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            messages_enabled: true,
            bypass_default: false,
            stores: FxHashMap::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }

    /// Parse configuration from YAML. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        Ok(serde_norway::from_str(contents)?)
    }

    /// Set an override for `store`.
    #[must_use]
    pub fn with_store(mut self, store: StoreId, overrides: StoreOverrides) -> Self {
        self.stores.insert(store, overrides);
        self
    }

    /// Whether the module is enabled, for `store` if given.
    pub fn is_enabled(&self, store: Option<StoreId>) -> bool {
        self.store_overrides(store)
            .and_then(|overrides| overrides.enabled)
            .unwrap_or(self.enabled)
    }

    /// Whether messages are enabled, for `store` if given.
    pub fn is_messages_enabled(&self, store: Option<StoreId>) -> bool {
        self.store_overrides(store)
            .and_then(|overrides| overrides.messages_enabled)
            .unwrap_or(self.messages_enabled)
    }

    /// Default bypass flag for rules.
    pub fn is_bypass_default(&self) -> bool {
        self.bypass_default
    }

    fn store_overrides(&self, store: Option<StoreId>) -> Option<&StoreOverrides> {
        store.and_then(|store| self.stores.get(&store))
    }
}

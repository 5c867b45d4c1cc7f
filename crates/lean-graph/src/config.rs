//! Configuration for graph construction.
//!
//! Configuration lives in a small YAML file:
//!
//! ```yaml
//! ingest:
//!   max-in-flight: 20
//! ```
//!
//! Every field has a default, so an empty file (or no file) is valid.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default cap on concurrently running edge-weight computations.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 20;

/// Top-level configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LeanConfig {
    /// Ingestion settings
    pub ingest: IngestConfig,
}

/// Ingestion section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct IngestConfig {
    /// How many edge weights may be computed at once
    pub max_in_flight: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

impl IngestConfig {
    /// Check that the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `max_in_flight` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_in_flight == 0 {
            return Err(Error::Config(
                "ingest.max-in-flight must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl LeanConfig {
    /// Parse configuration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the YAML is malformed or a value is invalid.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))?
        };
        config.ingest.validate()?;
        Ok(config)
    }

    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, or [`Error::Config`]
    /// if its contents are invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Serialize configuration to YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))
    }
}

//! YAML Configuration File Support for admatch
//!
//! One file configures every stage. Each section is optional and falls back
//! to the stage's defaults, so an empty document (or just `version: "1"`)
//! is a valid configuration.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1"
//! log_level: info
//!
//! ingest:
//!   max_input_bytes: 10485760
//!   max_users: 1000
//!
//! perceptual:
//!   hash_size: 8
//!   filter: lanczos3
//!
//! fetch:
//!   timeout_secs: 10
//!   max_concurrency: 8
//!   max_image_bytes: 33554432
//!   user_agent: "admatch/0.1.0"
//!
//! matcher:
//!   direction: targets_to_candidates
//!   group_variants: false
//! ```

use std::fs;
use std::path::Path;

use fetch::FetchConfig;
use ingest::IngestConfig;
use matcher::MatchConfig;
use perceptual::PerceptualConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level configuration for a whole admatch run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AdmatchConfig {
    /// Configuration format version
    pub version: String,

    /// Fallback log filter used when `RUST_LOG` is unset
    pub log_level: String,

    pub ingest: IngestConfig,
    pub perceptual: PerceptualConfig,
    pub fetch: FetchConfig,
    pub matcher: MatchConfig,
}

impl Default for AdmatchConfig {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            log_level: "info".to_string(),
            ingest: IngestConfig::default(),
            perceptual: PerceptualConfig::default(),
            fetch: FetchConfig::default(),
            matcher: MatchConfig::default(),
        }
    }
}

impl AdmatchConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        // An empty document deserializes to unit, not an empty mapping.
        let config: AdmatchConfig = if yaml.trim().is_empty() {
            AdmatchConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_perceptual(mut self, perceptual: PerceptualConfig) -> Self {
        self.perceptual = perceptual;
        self
    }

    pub fn with_fetch(mut self, fetch: FetchConfig) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn with_matcher(mut self, matcher: MatchConfig) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_ingest(mut self, ingest: IngestConfig) -> Self {
        self.ingest = ingest;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1" | "1.0" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        if self.log_level.trim().is_empty() {
            return Err(ConfigLoadError::Validation(
                "log_level must not be empty".to_string(),
            ));
        }

        self.ingest
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("ingest: {e}")))?;
        self.perceptual
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("perceptual: {e}")))?;
        self.fetch
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("fetch: {e}")))?;
        self.matcher
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("matcher: {e}")))?;

        Ok(())
    }
}

//! Configuration for payload intake.
//!
//! [`IngestConfig`] bounds how much input a single invocation accepts. All
//! limits are optional and off by default.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Runtime limits applied while parsing an input payload.
///
/// ```rust
/// use ingest::IngestConfig;
///
/// let config = IngestConfig::default().with_max_users(500);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.max_users, Some(500));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct IngestConfig {
    /// Maximum size of the raw JSON text in bytes.
    pub max_input_bytes: Option<usize>,
    /// Maximum number of user records in one payload.
    pub max_users: Option<usize>,
}

impl IngestConfig {
    pub fn with_max_input_bytes(mut self, limit: usize) -> Self {
        self.max_input_bytes = Some(limit);
        self
    }

    pub fn with_max_users(mut self, limit: usize) -> Self {
        self.max_users = Some(limit);
        self
    }

    /// Validate configuration values. Zero limits would reject every input.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_input_bytes == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "max_input_bytes",
                message: "must be greater than zero".into(),
            });
        }
        if self.max_users == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "max_users",
                message: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

/// Errors returned by [`IngestConfig::validate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid ingest config `{field}`: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

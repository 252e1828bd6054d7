use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::FetchError;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Default number of in-flight downloads per user.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;
/// Default body size cap (32 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 32 * 1024 * 1024;

/// Settings for [`HttpFetcher`](crate::HttpFetcher) and [`fetch_all`](crate::fetch_all).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub max_concurrency: usize,
    /// `None` disables the size check.
    pub max_image_bytes: Option<u64>,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_image_bytes: Some(DEFAULT_MAX_IMAGE_BYTES),
            user_agent: concat!("admatch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl FetchConfig {
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n;
        self
    }

    pub fn with_max_image_bytes(mut self, limit: Option<u64>) -> Self {
        self.max_image_bytes = limit;
        self
    }

    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), FetchError> {
        if self.timeout_secs == 0 {
            return Err(FetchError::InvalidConfig(
                "timeout_secs must be >= 1".into(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(FetchError::InvalidConfig(
                "max_concurrency must be >= 1".into(),
            ));
        }
        if self.max_image_bytes == Some(0) {
            return Err(FetchError::InvalidConfig(
                "max_image_bytes must be > 0 when set".into(),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(FetchError::InvalidConfig(
                "user_agent must not be empty".into(),
            ));
        }
        Ok(())
    }
}

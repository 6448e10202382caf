//! Account service config, loaded from API_BASE_URL and API_TIMEOUT_SECS.

use anyhow::Result;
use std::env;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Where the account service lives and how long a single request may take.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API_BASE_URL
    pub base_url: String,
    /// API_TIMEOUT_SECS
    pub timeout_secs: u64,
}

impl ApiConfig {
    /// Load from environment variables; both are optional.
    pub fn from_env() -> Result<Self> {
        let base_url = env::var("API_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_secs = env::var("API_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Ok(Self {
            base_url,
            timeout_secs,
        })
    }

    /// Uses the given base URL, default timeout.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Base URL must be an absolute http(s) URL.
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            anyhow::anyhow!("API_BASE_URL is not a valid URL: {} ({})", self.base_url, e)
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("API_BASE_URL must use http or https: {}", self.base_url);
        }
        Ok(())
    }
}

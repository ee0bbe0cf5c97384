//! Configuration module
//!
//! Handles console configuration: where the backend lives, how often
//! in-flight jobs are polled, and how long a single request may take.

use std::time::Duration;

use anyhow::Context;

/// Console configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the backend API
    pub api_base_url: String,

    /// Pause between the end of one status poll and the start of the next
    pub poll_interval: Duration,

    /// Timeout for a single HTTP request
    pub request_timeout: Duration,
}

impl Config {
    /// Creates a configuration with default intervals
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            poll_interval: Duration::from_millis(500),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_base_url.is_empty() {
            anyhow::bail!("api_base_url cannot be empty");
        }

        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            anyhow::bail!("api_base_url must start with http:// or https://");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        Ok(())
    }

    /// HTTP client honoring the request timeout
    pub fn http_client(&self) -> anyhow::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .context("Failed to build HTTP client")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("http://localhost:8000")
    }
}

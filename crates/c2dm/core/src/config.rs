use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Gateway endpoints and retry policy. Passed by reference to every
/// authenticator and dispatcher; never mutated after construction.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GatewayConfig {
    pub auth_url: String,
    pub push_url: String,
    pub account_type: String,
    pub service: String,
    pub collapse_key: String,
    pub request_timeout_secs: u64,
    pub max_consecutive_timeouts: u32,
    pub max_consecutive_quota_exceeded: u32,
    pub quota_backoff_secs: u64,
    pub max_concurrency: usize,
    pub max_retry_rounds: u32,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            auth_url: "https://www.google.com/accounts/ClientLogin".to_string(),
            push_url: "https://android.apis.google.com/c2dm/send".to_string(),
            account_type: "HOSTED_OR_GOOGLE".to_string(),
            service: "ac2dm".to_string(),
            collapse_key: "foobar".to_string(),
            request_timeout_secs: 30,
            max_consecutive_timeouts: 4,
            max_consecutive_quota_exceeded: 4,
            quota_backoff_secs: 5,
            max_concurrency: 50,
            max_retry_rounds: 3,
        }
    }
}

impl GatewayConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Point both endpoints at a different host, e.g. a local test server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.auth_url = format!("{base}/accounts/ClientLogin");
        self.push_url = format!("{base}/c2dm/send");
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn quota_backoff(&self) -> Duration {
        Duration::from_secs(self.quota_backoff_secs)
    }

    /// Concurrency cap, never below one.
    pub fn concurrency(&self) -> usize {
        self.max_concurrency.max(1)
    }
}

//! Configuration for the blocking client.

use std::time::Duration;

use kerbalstuff_core::{ApiError, Result, DEFAULT_BASE_URL};

/// Image host that `Mod::background` paths are relative to.
pub const DEFAULT_CDN_URL: &str = "https://cdn.mediacru.sh";

pub const ENV_BASE_URL: &str = "KERBALSTUFF_URL";
pub const ENV_CDN_URL: &str = "KERBALSTUFF_CDN_URL";
pub const ENV_TIMEOUT_SECS: &str = "KERBALSTUFF_TIMEOUT_SECS";

/// Settings shared by `KerbalStuff` and `Session`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Site root; API paths are appended as `/api/...`.
    pub base_url: String,
    pub cdn_url: String,
    /// Whole-request timeout handed to the transport.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cdn_url: DEFAULT_CDN_URL.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: concat!("kerbalstuff-rs/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `KERBALSTUFF_*` variables, reading `.env` first
    /// when one exists.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            config.base_url = url;
        }
        if let Some(url) = lookup(ENV_CDN_URL).filter(|v| !v.is_empty()) {
            config.cdn_url = url;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ApiError::invalid(format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds, got {secs:?}"))
            })?;
            if secs == 0 {
                return Err(ApiError::invalid(format!("{ENV_TIMEOUT_SECS} must be at least 1 second")));
            }
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

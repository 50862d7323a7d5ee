//! Client configuration: upstream hosts, timeouts, retry budget and cache lifetimes.

use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

pub const DEFAULT_PRIMARY_BASE_URL: &str = "https://api.binance.com";
pub const DEFAULT_DATA_BASE_URL: &str = "https://data-api.binance.vision";

pub const ENV_PRIMARY_BASE_URL: &str = "SPOTLINK_PRIMARY_BASE_URL";
pub const ENV_DATA_BASE_URL: &str = "SPOTLINK_DATA_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "SPOTLINK_TIMEOUT_MS";
pub const ENV_ACTIVITY_LOG: &str = "SPOTLINK_ACTIVITY_LOG";

/// How long each kind of cached lookup stays fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub price: Duration,
    pub ticker_24h: Duration,
    pub exchange_info: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            price: Duration::from_secs(5),
            ticker_24h: Duration::from_secs(10),
            exchange_info: Duration::from_secs(60 * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Host serving exchange info and spot prices.
    pub primary_base_url: String,
    /// Host serving 24 hour ticker statistics.
    pub data_base_url: String,
    /// Per-attempt HTTP timeout.
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub ttls: CacheTtls,
    /// JSON-lines file that activity records are appended to, if any.
    pub activity_log_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            primary_base_url: String::from(DEFAULT_PRIMARY_BASE_URL),
            data_base_url: String::from(DEFAULT_DATA_BASE_URL),
            request_timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
            ttls: CacheTtls::default(),
            activity_log_path: None,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `SPOTLINK_*` environment variables.
    ///
    /// Unset, empty or unparsable values keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = non_empty(lookup(ENV_PRIMARY_BASE_URL)) {
            config.primary_base_url = url;
        }
        if let Some(url) = non_empty(lookup(ENV_DATA_BASE_URL)) {
            config.data_base_url = url;
        }
        if let Some(timeout_ms) = lookup(ENV_TIMEOUT_MS).and_then(|v| v.trim().parse::<u64>().ok())
        {
            if timeout_ms > 0 {
                config.request_timeout = Duration::from_millis(timeout_ms);
            }
        }
        if let Some(path) = non_empty(lookup(ENV_ACTIVITY_LOG)) {
            config.activity_log_path = Some(PathBuf::from(path));
        }

        config
    }

    pub fn with_base_urls(
        mut self,
        primary_base_url: impl Into<String>,
        data_base_url: impl Into<String>,
    ) -> Self {
        self.primary_base_url = primary_base_url.into();
        self.data_base_url = data_base_url.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_activity_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.activity_log_path = Some(path.into());
        self
    }

    pub(crate) fn primary_url(&self, path: &str) -> String {
        join_url(&self.primary_base_url, path)
    }

    pub(crate) fn data_url(&self, path: &str) -> String {
        join_url(&self.data_base_url, path)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

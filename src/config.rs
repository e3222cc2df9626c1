//! Runtime configuration for the nutrition client and search service.

use crate::error::FoodSearchError;
use std::time::Duration;

/// Default nutrition API host.
pub const DEFAULT_BASE_URL: &str = "https://api.edamam.com";

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default connection timeout in seconds
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Environment variable holding the API application id.
pub const ENV_APP_ID: &str = "FOODSEARCH_APP_ID";

/// Environment variable holding the API application key.
pub const ENV_APP_KEY: &str = "FOODSEARCH_APP_KEY";

/// Environment variable overriding the API host.
pub const ENV_BASE_URL: &str = "FOODSEARCH_BASE_URL";

/// Maximum number of terms kept in a user's search history.
pub const HISTORY_CAPACITY: usize = 5;

/// Connection settings for the nutrition API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Scheme and host, without a trailing slash
    pub base_url: String,
    pub app_id: String,
    pub app_key: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl ApiConfig {
    /// Creates a configuration against the default host.
    #[must_use]
    pub fn new(app_id: impl Into<String>, app_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            app_id: app_id.into(),
            app_key: app_key.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }

    /// Points the client at a different host (test servers, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Reads credentials and host from the environment.
    ///
    /// # Errors
    ///
    /// Returns `FoodSearchError::Config` if the id or key variable is missing.
    pub fn from_env() -> Result<Self, FoodSearchError> {
        let app_id = std::env::var(ENV_APP_ID)
            .map_err(|_| FoodSearchError::Config(format!("{ENV_APP_ID} is not set")))?;
        let app_key = std::env::var(ENV_APP_KEY)
            .map_err(|_| FoodSearchError::Config(format!("{ENV_APP_KEY} is not set")))?;

        let config = Self::new(app_id, app_key);
        Ok(match std::env::var(ENV_BASE_URL) {
            Ok(url) if !url.trim().is_empty() => config.with_base_url(url),
            _ => config,
        })
    }
}

/// Tuning for the search pipeline.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Upper bound on in-flight nutrient lookups for one search
    pub max_concurrent_lookups: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: 4,
        }
    }
}

impl SearchConfig {
    /// Concurrency actually used; zero is treated as sequential.
    #[must_use]
    pub fn lookup_concurrency(&self) -> usize {
        self.max_concurrent_lookups.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::new("id", "key");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = ApiConfig::new("id", "key").with_base_url("http://127.0.0.1:8080/");
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
    }

    #[test]
    fn test_zero_concurrency_is_sequential() {
        let config = SearchConfig {
            max_concurrent_lookups: 0,
        };
        assert_eq!(config.lookup_concurrency(), 1);
        assert_eq!(SearchConfig::default().lookup_concurrency(), 4);
    }
}

//! Service configuration.

use std::path::PathBuf;
use std::time::Duration;

use coinfeed_common::constants::{CACHE_SLIDING_WINDOW, FETCH_TIMEOUT};
use coinfeed_feed::engine::{DEFAULT_PRIMARY_URL, LOCAL_FALLBACK};
use coinfeed_feed::{FeedEngineConfig, NameStrategy};

/// Main service configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Primary price source.
    pub primary_url: String,
    /// Fallback price source: a URL, or `local` for the built-in snapshot.
    /// `None` disables the fallback.
    pub fallback_url: Option<String>,
    /// Hard timeout of one price source request.
    pub fetch_timeout: Duration,
    /// Sliding window of the catalog name cache.
    pub cache_window: Duration,
    /// Catalog database URL, or `memory` for an in-process catalog.
    pub database_url: String,
    /// Locale used when a command does not name one.
    pub locale: String,
    /// Name strategy used when a command does not name one.
    pub name_strategy: NameStrategy,
    /// JSON file replacing the built-in resource bundle.
    pub resource_bundle: Option<PathBuf>,
    /// Log level.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            primary_url: DEFAULT_PRIMARY_URL.to_string(),
            fallback_url: Some(LOCAL_FALLBACK.to_string()),
            fetch_timeout: FETCH_TIMEOUT,
            cache_window: CACHE_SLIDING_WINDOW,
            database_url: "sqlite://coinfeed.db".to_string(),
            locale: "en-US".to_string(),
            name_strategy: NameStrategy::Resource,
            resource_bundle: None,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from `lookup`, keeping defaults for unset or
    /// unparsable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("COINFEED_PRIMARY_URL") {
            config.primary_url = url;
        }

        if let Some(url) = lookup("COINFEED_FALLBACK_URL") {
            config.fallback_url = if url.trim().is_empty() { None } else { Some(url) };
        }

        if let Some(secs) = lookup("COINFEED_FETCH_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.fetch_timeout = Duration::from_secs(secs);
            }
        }

        if let Some(secs) = lookup("COINFEED_CACHE_WINDOW_SECS") {
            if let Ok(secs) = secs.parse() {
                config.cache_window = Duration::from_secs(secs);
            }
        }

        if let Some(url) = lookup("DATABASE_URL") {
            config.database_url = url;
        }

        if let Some(locale) = lookup("COINFEED_LOCALE") {
            config.locale = locale;
        }

        if let Some(strategy) = lookup("COINFEED_NAME_STRATEGY") {
            if let Ok(strategy) = strategy.parse() {
                config.name_strategy = strategy;
            }
        }

        if let Some(path) = lookup("COINFEED_RESOURCE_BUNDLE") {
            if !path.trim().is_empty() {
                config.resource_bundle = Some(PathBuf::from(path));
            }
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Check whether the catalog lives in process memory.
    pub fn uses_memory_catalog(&self) -> bool {
        self.database_url == "memory"
    }

    /// Feed engine settings.
    pub fn feed_config(&self) -> FeedEngineConfig {
        FeedEngineConfig {
            primary_url: self.primary_url.clone(),
            fallback_url: self.fallback_url.clone(),
            fetch_timeout: self.fetch_timeout,
            cache_window: self.cache_window,
            strategy: self.name_strategy,
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !is_http_url(&self.primary_url) {
            return Err(format!("Primary URL must be http(s): {}", self.primary_url));
        }

        if let Some(url) = &self.fallback_url {
            if url != LOCAL_FALLBACK && !is_http_url(url) {
                return Err(format!("Fallback URL must be http(s) or {LOCAL_FALLBACK}: {url}"));
            }
        }

        if self.fetch_timeout.is_zero() {
            return Err("Fetch timeout cannot be 0".to_string());
        }

        if self.cache_window.is_zero() {
            return Err("Cache window cannot be 0".to_string());
        }

        if self.database_url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }

        if self.locale.trim().is_empty() {
            return Err("Locale cannot be empty".to_string());
        }

        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

//! Currency display name resolution.
//!
//! Two strategies are available per call: a static localized resource bundle
//! and the persisted catalog. Neither fails; a miss or an error resolves to
//! the currency code itself.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use coinfeed_catalog::CatalogService;
use coinfeed_common::{CoinFeedError, Result};

use crate::cache::{SharedTtlCache, TtlCache};

/// Where display names come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameStrategy {
    /// Built-in or file-based localized bundle.
    #[default]
    Resource,
    /// Persisted catalog, cached.
    Catalog,
}

impl fmt::Display for NameStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameStrategy::Resource => write!(f, "resource"),
            NameStrategy::Catalog => write!(f, "catalog"),
        }
    }
}

impl FromStr for NameStrategy {
    type Err = CoinFeedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "resource" => Ok(NameStrategy::Resource),
            "catalog" => Ok(NameStrategy::Catalog),
            other => Err(CoinFeedError::ConfigurationError(format!(
                "unknown name strategy '{other}'"
            ))),
        }
    }
}

/// Localized string table.
pub trait ResourceBundle: Send + Sync {
    /// Look up `key` for `locale`, without any fallback to the key itself.
    fn lookup(&self, key: &str, locale: &str) -> Option<String>;
}

/// Resource bundle held in memory, keyed by locale then currency code.
///
/// Lookup tries the exact locale, then its bare language (`zh-TW` → `zh`).
#[derive(Debug, Clone, Default)]
pub struct StaticResourceBundle {
    tables: HashMap<String, HashMap<String, String>>,
}

impl StaticResourceBundle {
    /// Create an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundle shipped with the service.
    pub fn builtin() -> Self {
        let mut bundle = Self::new();
        for (code, name) in [
            ("USD", "United States Dollar"),
            ("GBP", "British Pound Sterling"),
            ("EUR", "Euro"),
            ("JPY", "Japanese Yen"),
            ("CNY", "Chinese Yuan"),
            ("TWD", "New Taiwan Dollar"),
        ] {
            bundle.insert("en", code, name);
        }
        for (code, name) in [
            ("USD", "美元"),
            ("GBP", "英鎊"),
            ("EUR", "歐元"),
            ("JPY", "日圓"),
            ("CNY", "人民幣"),
            ("TWD", "新臺幣"),
        ] {
            bundle.insert("zh-TW", code, name);
        }
        bundle
    }

    /// Parse a bundle of the form `{ "<locale>": { "<CODE>": "<name>" } }`.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let tables: HashMap<String, HashMap<String, String>> = serde_json::from_str(raw)
            .map_err(|e| {
                CoinFeedError::ConfigurationError(format!("invalid resource bundle: {e}"))
            })?;
        Ok(Self { tables })
    }

    /// Load a bundle from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CoinFeedError::ConfigurationError(format!(
                "cannot read resource bundle {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json_str(&raw)
    }

    /// Add or replace one name.
    pub fn insert(&mut self, locale: &str, code: &str, name: &str) {
        self.tables
            .entry(locale.to_string())
            .or_default()
            .insert(code.to_string(), name.to_string());
    }

    /// Locales with at least one entry.
    pub fn locales(&self) -> Vec<&str> {
        let mut locales: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        locales.sort_unstable();
        locales
    }

    fn lookup_exact(&self, key: &str, locale: &str) -> Option<String> {
        self.tables.get(locale)?.get(key).cloned()
    }
}

impl ResourceBundle for StaticResourceBundle {
    fn lookup(&self, key: &str, locale: &str) -> Option<String> {
        if let Some(name) = self.lookup_exact(key, locale) {
            return Some(name);
        }
        match locale.split_once('-') {
            Some((language, _)) => self.lookup_exact(key, language),
            None => None,
        }
    }
}

/// Resolves one currency code to a display name.
#[async_trait]
pub trait NameLookup: Send + Sync {
    /// Display name of `code` in `locale`; never fails.
    async fn resolve(&self, code: &str, locale: &str) -> String;
}

/// Name resolver over a resource bundle and the catalog.
pub struct NameResolver {
    resources: Arc<dyn ResourceBundle>,
    catalog: CatalogService,
    cache: SharedTtlCache<(String, String), String>,
    strategy: NameStrategy,
}

impl NameResolver {
    /// Create a resolver whose catalog names are cached for `cache_window`
    /// after their last read.
    pub fn new(
        resources: Arc<dyn ResourceBundle>,
        catalog: CatalogService,
        cache_window: Duration,
        strategy: NameStrategy,
    ) -> Self {
        Self {
            resources,
            catalog,
            cache: Arc::new(TtlCache::with_window(cache_window)),
            strategy,
        }
    }

    /// Get the default strategy.
    pub fn strategy(&self) -> NameStrategy {
        self.strategy
    }

    /// Get the catalog name cache.
    pub fn cache(&self) -> &SharedTtlCache<(String, String), String> {
        &self.cache
    }

    /// Resolve `code` in `locale` with an explicit strategy.
    pub async fn resolve_name(&self, code: &str, locale: &str, strategy: NameStrategy) -> String {
        match strategy {
            NameStrategy::Resource => self.resolve_from_resource(code, locale),
            NameStrategy::Catalog => self.resolve_from_catalog(code, locale).await,
        }
    }

    /// Resolve from the resource bundle.
    pub fn resolve_from_resource(&self, code: &str, locale: &str) -> String {
        match self.resources.lookup(code, locale) {
            Some(name) => name,
            None => {
                debug!(code = %code, locale = %locale, "No resource name, using code");
                code.to_string()
            }
        }
    }

    /// Resolve from the catalog through the name cache.
    ///
    /// A catalog miss or a blank name caches the code itself; a storage
    /// failure is not cached.
    #[instrument(skip(self))]
    pub async fn resolve_from_catalog(&self, code: &str, locale: &str) -> String {
        let key = (code.to_string(), locale.to_string());
        let catalog = &self.catalog;
        let result = self
            .cache
            .get_or_compute(key, move || async move {
                let name = catalog
                    .find_lang(code, locale)
                    .await?
                    .map(|lang| lang.name)
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| code.to_string());
                Ok::<_, CoinFeedError>(name)
            })
            .await;

        match result {
            Ok(name) => name,
            Err(e) => {
                warn!(
                    code = %code,
                    locale = %locale,
                    error = %e,
                    "Catalog lookup failed, using code"
                );
                code.to_string()
            }
        }
    }

    /// Drop the cached catalog name for `(code, locale)`.
    pub fn invalidate(&self, code: &str, locale: &str) {
        self.cache.invalidate(&(code.to_string(), locale.to_string()));
    }

    /// Borrow this resolver with a fixed strategy.
    pub fn with_strategy(&self, strategy: NameStrategy) -> StrategyLookup<'_> {
        StrategyLookup {
            resolver: self,
            strategy,
        }
    }
}

#[async_trait]
impl NameLookup for NameResolver {
    async fn resolve(&self, code: &str, locale: &str) -> String {
        self.resolve_name(code, locale, self.strategy).await
    }
}

/// A resolver bound to one strategy.
pub struct StrategyLookup<'a> {
    resolver: &'a NameResolver,
    strategy: NameStrategy,
}

#[async_trait]
impl NameLookup for StrategyLookup<'_> {
    async fn resolve(&self, code: &str, locale: &str) -> String {
        self.resolver.resolve_name(code, locale, self.strategy).await
    }
}

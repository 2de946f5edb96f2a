//! Currency service facade.
//!
//! Combines the price pipeline with the catalog and turns every failure into
//! an outcome the caller can hand back as is.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use coinfeed_catalog::{
    CatalogService, MemoryCatalogStore, SharedCatalogStore, SqliteCatalogStore,
};
use coinfeed_common::{ApiResponse, CoinFeedError, CurrencyRow, EnrichedResponse, Result};
use coinfeed_feed::{
    FeedEngine, FeedError, HttpClient, NameStrategy, ResourceBundle, StaticResourceBundle,
};

use crate::config::ServerConfig;
use crate::metrics::{ServiceMetrics, SharedMetrics};

/// Open the catalog store named by the configuration.
pub async fn open_catalog_store(config: &ServerConfig) -> Result<SharedCatalogStore> {
    if config.uses_memory_catalog() {
        info!("Using in-memory catalog");
        return Ok(Arc::new(MemoryCatalogStore::new()));
    }
    let store = SqliteCatalogStore::connect(&config.database_url).await?;
    Ok(Arc::new(store))
}

/// Load the configured resource bundle, or the built-in one.
pub fn load_resource_bundle(config: &ServerConfig) -> Result<Arc<dyn ResourceBundle>> {
    match &config.resource_bundle {
        Some(path) => {
            let bundle = StaticResourceBundle::from_json_file(path)?;
            info!(path = %path.display(), locales = ?bundle.locales(), "Loaded resource bundle");
            Ok(Arc::new(bundle))
        }
        None => Ok(Arc::new(StaticResourceBundle::builtin())),
    }
}

fn failure_context(err: &FeedError) -> &'static str {
    match err {
        FeedError::Source { .. } => "price source request failed",
        FeedError::MalformedPayload(_) => "price payload rejected",
        FeedError::MissingSnapshot => "price snapshot unavailable",
    }
}

/// Entry point for every currency operation.
pub struct CurrencyService {
    engine: FeedEngine,
    catalog: CatalogService,
    metrics: SharedMetrics,
}

impl CurrencyService {
    /// Create a new service.
    pub fn new(engine: FeedEngine, catalog: CatalogService, metrics: SharedMetrics) -> Self {
        Self {
            engine,
            catalog,
            metrics,
        }
    }

    /// Wire the service from configuration.
    pub fn from_config(
        config: &ServerConfig,
        store: SharedCatalogStore,
        http: Arc<dyn HttpClient>,
    ) -> Result<Self> {
        let resources = load_resource_bundle(config)?;
        let catalog = CatalogService::new(store);
        let engine =
            FeedEngine::from_config(&config.feed_config(), http, resources, catalog.clone());
        Ok(Self::new(engine, catalog, Arc::new(ServiceMetrics::new())))
    }

    /// Get the service metrics.
    pub fn metrics(&self) -> &SharedMetrics {
        &self.metrics
    }

    /// Fetch, parse and enrich the current prices with the default strategy.
    pub async fn fetch_and_enrich_prices(&self, locale: &str) -> ApiResponse<EnrichedResponse> {
        let strategy = self.engine.resolver().strategy();
        self.fetch_and_enrich_prices_with(locale, strategy).await
    }

    /// Fetch, parse and enrich the current prices with `strategy`.
    #[instrument(skip(self))]
    pub async fn fetch_and_enrich_prices_with(
        &self,
        locale: &str,
        strategy: NameStrategy,
    ) -> ApiResponse<EnrichedResponse> {
        let result = self.engine.fetch_and_enrich_with(locale, strategy).await;
        self.metrics.enrich_finished(result.is_ok());

        match result {
            Ok(response) => ApiResponse::ok(response),
            Err(e) => {
                let context = failure_context(&e);
                let err = CoinFeedError::from(e);
                warn!(error = %err, code = err.error_code(), "Price enrichment failed");
                ApiResponse::failure(context, &err)
            }
        }
    }

    /// Display name of `code` in `locale` with the default strategy.
    pub async fn resolve_currency_name(&self, code: &str, locale: &str) -> String {
        self.resolve_currency_name_with(code, locale, self.engine.resolver().strategy())
            .await
    }

    /// Display name of `code` in `locale` with `strategy`.
    pub async fn resolve_currency_name_with(
        &self,
        code: &str,
        locale: &str,
        strategy: NameStrategy,
    ) -> String {
        self.engine
            .resolver()
            .resolve_name(code, locale, strategy)
            .await
    }

    /// Every localized rendering of `code`.
    pub async fn list_currency_rows(&self, code: &str) -> Vec<CurrencyRow> {
        self.catalog.list_currency_rows(code).await
    }

    /// The rendering of `code` for `locale`.
    pub async fn query_currency_info(&self, code: &str, locale: &str) -> Option<CurrencyRow> {
        self.catalog.query_currency_info(code, locale).await
    }

    /// Add a localized rendering of `code`.
    pub async fn add_currency(
        &self,
        code: &str,
        locale: &str,
        full_name: &str,
        short_name: &str,
        description: &str,
    ) -> bool {
        let ok = self
            .catalog
            .add_currency(code, locale, full_name, short_name, description)
            .await;
        self.write_finished(code, locale, ok)
    }

    /// Change the short name of one rendering.
    pub async fn update_short_name(&self, code: &str, locale: &str, short_name: &str) -> bool {
        let ok = self.catalog.update_short_name(code, locale, short_name).await;
        self.write_finished(code, locale, ok)
    }

    /// Change the display name of one rendering.
    pub async fn update_currency_name(&self, code: &str, locale: &str, name: &str) -> bool {
        let ok = self.catalog.update_currency_name(code, locale, name).await;
        self.write_finished(code, locale, ok)
    }

    /// Remove the rendering of `code` for `locale`.
    pub async fn delete_currency(&self, code: &str, locale: &str) -> bool {
        let ok = self.catalog.delete_currency(code, locale).await;
        self.write_finished(code, locale, ok)
    }

    fn write_finished(&self, code: &str, locale: &str, ok: bool) -> bool {
        self.metrics.catalog_write_finished(ok);
        // A cached miss would otherwise hide a freshly added name. Lookups
        // that read the old row before this point do not cache it.
        self.engine.resolver().invalidate(code, locale);
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinfeed_catalog::CatalogStore;
    use coinfeed_feed::parser::LOCAL_SNAPSHOT;
    use coinfeed_feed::MockHttpClient;
    use std::time::Duration;

    const PRIMARY: &str = "http://prices.test/current";

    fn config() -> ServerConfig {
        ServerConfig {
            primary_url: PRIMARY.to_string(),
            fallback_url: None,
            database_url: "memory".to_string(),
            ..Default::default()
        }
    }

    async fn service(http: Arc<MockHttpClient>) -> (CurrencyService, Arc<MemoryCatalogStore>) {
        let store = Arc::new(MemoryCatalogStore::new());
        let service = CurrencyService::from_config(&config(), store.clone(), http).unwrap();
        (service, store)
    }

    #[tokio::test]
    async fn test_prices_envelope() {
        let http = Arc::new(MockHttpClient::new());
        http.respond(PRIMARY, 200, LOCAL_SNAPSHOT);
        let (service, _) = service(http).await;

        let response = service.fetch_and_enrich_prices("en-US").await;

        assert!(response.is_ok);
        let data = response.data.unwrap();
        assert_eq!(data.codes(), vec!["EUR", "GBP", "USD"]);
        assert_eq!(data.currency_infos[0].currency_name, "Euro");
        assert_eq!(service.metrics().snapshot().enrich_requests, 1);
    }

    #[tokio::test]
    async fn test_transport_failure_envelope() {
        let http = Arc::new(MockHttpClient::new());
        http.respond(PRIMARY, 500, "");
        let (service, _) = service(http).await;

        let response = service.fetch_and_enrich_prices("en-US").await;

        assert!(!response.is_ok);
        assert!(response.data.is_none());
        assert_eq!(response.error_code.as_deref(), Some("TRANSPORT_FAILURE"));
        assert!(response
            .message
            .unwrap()
            .starts_with("price source request failed"));
        assert_eq!(service.metrics().snapshot().enrich_failures, 1);
    }

    #[tokio::test]
    async fn test_local_fallback_envelope() {
        let http = Arc::new(MockHttpClient::new());
        http.respond(PRIMARY, 500, "");
        let config = ServerConfig {
            fallback_url: Some("local".to_string()),
            ..config()
        };
        let store = Arc::new(MemoryCatalogStore::new());
        let service = CurrencyService::from_config(&config, store, http).unwrap();

        let response = service.fetch_and_enrich_prices("en-US").await;

        assert!(response.is_ok);
        assert_eq!(response.data.unwrap().codes(), vec!["EUR", "GBP", "USD"]);
        assert_eq!(service.metrics().snapshot().enrich_failures, 0);
    }

    #[tokio::test]
    async fn test_empty_and_malformed_payloads() {
        let http = Arc::new(MockHttpClient::new());
        http.respond(PRIMARY, 200, "");
        let (service, _) = service(http.clone()).await;

        let response = service.fetch_and_enrich_prices("en-US").await;
        assert_eq!(response.error_code.as_deref(), Some("EMPTY_PAYLOAD"));

        http.respond(PRIMARY, 200, "[]");
        let response = service.fetch_and_enrich_prices("en-US").await;
        assert_eq!(response.error_code.as_deref(), Some("MALFORMED_PAYLOAD"));
    }

    #[tokio::test]
    async fn test_catalog_writes_refresh_names() {
        let (service, _) = service(Arc::new(MockHttpClient::new())).await;
        let catalog = NameStrategy::Catalog;

        assert_eq!(service.resolve_currency_name_with("JPY", "ja-JP", catalog).await, "JPY");

        assert!(service.add_currency("JPY", "ja-JP", "日本円", "円", "").await);
        assert_eq!(service.resolve_currency_name_with("JPY", "ja-JP", catalog).await, "日本円");

        assert!(service.update_currency_name("JPY", "ja-JP", "円貨").await);
        assert_eq!(service.resolve_currency_name_with("JPY", "ja-JP", catalog).await, "円貨");

        assert!(service.delete_currency("JPY", "ja-JP").await);
        assert_eq!(service.resolve_currency_name_with("JPY", "ja-JP", catalog).await, "JPY");
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_during_catalog_lookup_refreshes_name() {
        let (service, store) = service(Arc::new(MockHttpClient::new())).await;
        let catalog = NameStrategy::Catalog;
        assert!(service.add_currency("JPY", "ja-JP", "日本円", "円", "").await);

        store.delay_next_read(Duration::from_secs(1));
        let lookup = service.resolve_currency_name_with("JPY", "ja-JP", catalog);
        let write = async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            service.update_currency_name("JPY", "ja-JP", "円貨").await
        };
        let (stale, updated) = tokio::join!(lookup, write);

        assert_eq!(stale, "日本円");
        assert!(updated);
        assert_eq!(service.resolve_currency_name_with("JPY", "ja-JP", catalog).await, "円貨");
    }

    #[tokio::test]
    async fn test_catalog_operations() {
        let (service, store) = service(Arc::new(MockHttpClient::new())).await;

        assert!(service.add_currency("JPY", "ja-JP", "日本円", "円", "").await);
        assert!(service.add_currency("JPY", "en-US", "Japanese Yen", "JPY", "").await);
        assert!(service.update_short_name("JPY", "en-US", "¥").await);

        assert_eq!(service.list_currency_rows("JPY").await.len(), 2);
        assert_eq!(service.query_currency_info("JPY", "en-US").await.unwrap().short_name, "¥");
        assert_eq!(store.info_count(), 1);

        assert!(service.delete_currency("JPY", "ja-JP").await);
        assert!(service.query_currency_info("JPY", "en-US").await.is_some());
        assert!(!service.delete_currency("JPY", "ja-JP").await);

        let snapshot = service.metrics().snapshot();
        assert_eq!(snapshot.catalog_writes, 5);
        assert_eq!(snapshot.catalog_write_failures, 1);

        let exported = service.metrics().to_prometheus();
        assert!(exported.contains("coinfeed_catalog_writes_total 5"));
        assert!(exported.contains("coinfeed_enrich_requests_total 0"));
    }

    #[tokio::test]
    async fn test_default_strategy_is_resource() {
        let (service, _) = service(Arc::new(MockHttpClient::new())).await;

        assert_eq!(service.resolve_currency_name("XYZ", "en-US").await, "XYZ");
        assert_eq!(service.resolve_currency_name("GBP", "zh-TW").await, "英鎊");
    }

    #[tokio::test]
    async fn test_open_memory_store() {
        let store = open_catalog_store(&config()).await.unwrap();
        assert_eq!(store.name(), "memory");
    }
}

//! Price pipeline: fetch, parse, resolve names, assemble.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument};

use coinfeed_catalog::CatalogService;
use coinfeed_common::constants::{CACHE_SLIDING_WINDOW, FETCH_TIMEOUT};
use coinfeed_common::{EnrichedResponse, PriceSnapshot};

use crate::assembler::assemble;
use crate::error::FeedResult;
use crate::fetcher::{
    FallbackSnapshotSource, HttpClient, HttpSnapshotSource, SnapshotSource, StaticSnapshotSource,
};
use crate::parser::parse_snapshot;
use crate::resolver::{NameResolver, NameStrategy, ResourceBundle};

/// Default primary price source.
pub const DEFAULT_PRIMARY_URL: &str = "https://api.coindesk.com/v1/bpi/currentprice.json";

/// Fallback setting that selects the built-in local snapshot.
pub const LOCAL_FALLBACK: &str = "local";

/// Configuration for the feed engine.
#[derive(Debug, Clone)]
pub struct FeedEngineConfig {
    /// Primary price source.
    pub primary_url: String,
    /// Fallback price source, tried only after the primary fails. Either a
    /// URL or [`LOCAL_FALLBACK`].
    pub fallback_url: Option<String>,
    /// Hard timeout of one source request.
    pub fetch_timeout: Duration,
    /// Sliding window of the catalog name cache.
    pub cache_window: Duration,
    /// Strategy used when the caller does not pick one.
    pub strategy: NameStrategy,
}

impl Default for FeedEngineConfig {
    fn default() -> Self {
        Self {
            primary_url: DEFAULT_PRIMARY_URL.to_string(),
            fallback_url: Some(LOCAL_FALLBACK.to_string()),
            fetch_timeout: FETCH_TIMEOUT,
            cache_window: CACHE_SLIDING_WINDOW,
            strategy: NameStrategy::Resource,
        }
    }
}

/// The price feed engine.
pub struct FeedEngine {
    source: Arc<dyn SnapshotSource>,
    resolver: Arc<NameResolver>,
}

impl FeedEngine {
    /// Create an engine over an existing source and resolver.
    pub fn new(source: Arc<dyn SnapshotSource>, resolver: Arc<NameResolver>) -> Self {
        Self { source, resolver }
    }

    /// Build the source chain and resolver described by `config`.
    pub fn from_config(
        config: &FeedEngineConfig,
        http: Arc<dyn HttpClient>,
        resources: Arc<dyn ResourceBundle>,
        catalog: CatalogService,
    ) -> Self {
        let primary: Arc<dyn SnapshotSource> = Arc::new(HttpSnapshotSource::new(
            "primary",
            config.primary_url.clone(),
            config.fetch_timeout,
            http.clone(),
        ));

        let mut source = FallbackSnapshotSource::new(primary);
        match config.fallback_url.as_deref() {
            Some(LOCAL_FALLBACK) => {
                source = source.with_fallback(Arc::new(StaticSnapshotSource::local()));
            }
            Some(url) => {
                source = source.with_fallback(Arc::new(HttpSnapshotSource::new(
                    "fallback",
                    url,
                    config.fetch_timeout,
                    http,
                )));
            }
            None => {}
        }

        let resolver = NameResolver::new(resources, catalog, config.cache_window, config.strategy);

        info!(
            primary = %config.primary_url,
            fallback = ?config.fallback_url,
            strategy = %config.strategy,
            "Feed engine configured"
        );

        Self::new(Arc::new(source), Arc::new(resolver))
    }

    /// Get the name resolver.
    pub fn resolver(&self) -> &Arc<NameResolver> {
        &self.resolver
    }

    /// Fetch and parse one snapshot.
    pub async fn fetch_snapshot(&self) -> FeedResult<PriceSnapshot> {
        let raw = self.source.fetch().await?;
        let snapshot = parse_snapshot(&raw)?;
        debug!(quotes = snapshot.len(), chart = %snapshot.chart_label, "Parsed price snapshot");
        Ok(snapshot)
    }

    /// Run the full pipeline with the resolver's default strategy.
    pub async fn fetch_and_enrich(&self, locale: &str) -> FeedResult<EnrichedResponse> {
        self.fetch_and_enrich_with(locale, self.resolver.strategy()).await
    }

    /// Run the full pipeline resolving names with `strategy`.
    #[instrument(skip(self))]
    pub async fn fetch_and_enrich_with(
        &self,
        locale: &str,
        strategy: NameStrategy,
    ) -> FeedResult<EnrichedResponse> {
        let snapshot = self.fetch_snapshot().await?;
        let names = self.resolver.with_strategy(strategy);
        let response = assemble(Some(&snapshot), &names, locale).await?;

        info!(currencies = response.currency_infos.len(), "Enriched price snapshot");
        Ok(response)
    }
}

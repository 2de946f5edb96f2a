//! coinfeed Price Feed
//!
//! Fetches a price snapshot from a primary or fallback source, parses it,
//! resolves localized currency names and assembles a sorted response.
//!
//! # Example
//!
//! ```rust,ignore
//! use coinfeed_feed::{FeedEngine, FeedEngineConfig, ReqwestHttpClient, StaticResourceBundle};
//!
//! let engine = FeedEngine::from_config(
//!     &FeedEngineConfig::default(),
//!     Arc::new(ReqwestHttpClient::new()),
//!     Arc::new(StaticResourceBundle::builtin()),
//!     catalog,
//! );
//!
//! let response = engine.fetch_and_enrich("en-US").await?;
//! ```

pub mod assembler;
pub mod cache;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod parser;
pub mod resolver;

pub use assembler::assemble;
pub use cache::{CacheConfig, CacheStats, SharedTtlCache, TtlCache};
pub use engine::{FeedEngine, FeedEngineConfig};
pub use error::{FeedError, FeedResult, FetchError, FetchResult};
pub use fetcher::{
    fetch_snapshot, FallbackSnapshotSource, HttpClient, HttpResponse, HttpSnapshotSource,
    ReqwestHttpClient, SnapshotSource, StaticSnapshotSource,
};
pub use parser::parse_snapshot;
pub use resolver::{
    NameLookup, NameResolver, NameStrategy, ResourceBundle, StaticResourceBundle, StrategyLookup,
};

#[cfg(any(test, feature = "test-utils"))]
pub use fetcher::MockHttpClient;

//! coinfeed Server
//!
//! Configuration, metrics and the `CurrencyService` facade over the price
//! feed and the currency catalog.

pub mod config;
pub mod metrics;
pub mod service;

pub use config::ServerConfig;
pub use metrics::{MetricsSnapshot, ServiceMetrics, SharedMetrics};
pub use service::{load_resource_bundle, open_catalog_store, CurrencyService};

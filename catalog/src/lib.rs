//! coinfeed Currency Catalog
//!
//! Persisted reference data: one catalog entry per currency code, each owning
//! localized renderings keyed by locale.

pub mod memory;
pub mod service;
pub mod sqlite;
pub mod store;

pub use memory::MemoryCatalogStore;
pub use service::CatalogService;
pub use sqlite::SqliteCatalogStore;
pub use store::{CatalogStore, SharedCatalogStore};

//! Persistence interface of the currency catalog.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use coinfeed_common::{CatalogEntry, InfoId, LangEntry, LangId, Result};

/// Storage for catalog entries and their localized renderings.
///
/// Every method propagates storage errors as `PersistenceFailure`; turning
/// them into boolean outcomes is the job of [`crate::CatalogService`].
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Get the store name.
    fn name(&self) -> &str;

    /// Find a catalog entry by currency code.
    async fn find_info_by_code(&self, code: &str) -> Result<Option<CatalogEntry>>;

    /// Find the localized rendering of a catalog entry.
    async fn find_lang(&self, info_id: InfoId, lang_key: &str) -> Result<Option<LangEntry>>;

    /// List every localized rendering of a currency code.
    async fn list_langs_by_code(&self, code: &str) -> Result<Vec<LangEntry>>;

    /// Insert a catalog entry and return its id.
    ///
    /// Inserting a code that already exists returns the existing id and
    /// refreshes its modification time.
    async fn insert_info(&self, entry: &CatalogEntry) -> Result<InfoId>;

    /// Insert a localized rendering and return its id.
    async fn insert_lang(&self, entry: &LangEntry) -> Result<LangId>;

    /// Persist the mutable fields of a localized rendering and bump the
    /// owning entry's modification time.
    async fn update_lang(&self, entry: &LangEntry, modified_at: DateTime<Utc>) -> Result<bool>;

    /// Delete a localized rendering.
    async fn delete_lang(&self, entry: &LangEntry) -> Result<bool>;
}

/// Shared catalog store.
pub type SharedCatalogStore = Arc<dyn CatalogStore>;

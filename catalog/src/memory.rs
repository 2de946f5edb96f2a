//! In-memory catalog store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use coinfeed_common::{CatalogEntry, CoinFeedError, InfoId, LangEntry, LangId, Result};

use crate::store::CatalogStore;

#[derive(Debug, Default)]
struct Tables {
    infos: BTreeMap<InfoId, CatalogEntry>,
    langs: BTreeMap<LangId, LangEntry>,
    next_info_id: InfoId,
    next_lang_id: LangId,
}

impl Tables {
    fn info_by_code(&self, code: &str) -> Option<&CatalogEntry> {
        self.infos.values().find(|info| info.code == code)
    }
}

/// Catalog store kept in process memory, with the same uniqueness rules as
/// the SQLite schema.
#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    tables: RwLock<Tables>,
    failing: AtomicBool,
    read_delay: Mutex<Option<Duration>>,
}

impl MemoryCatalogStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `PersistenceFailure`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Hold the result of the next `find_lang` for `delay` after reading it.
    pub fn delay_next_read(&self, delay: Duration) {
        *self.read_delay.lock() = Some(delay);
    }

    /// Number of catalog entries.
    pub fn info_count(&self) -> usize {
        self.tables.read().infos.len()
    }

    /// Number of localized renderings.
    pub fn lang_count(&self) -> usize {
        self.tables.read().langs.len()
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CoinFeedError::PersistenceFailure(
                "catalog store unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn find_info_by_code(&self, code: &str) -> Result<Option<CatalogEntry>> {
        self.check()?;
        Ok(self.tables.read().info_by_code(code).cloned())
    }

    async fn find_lang(&self, info_id: InfoId, lang_key: &str) -> Result<Option<LangEntry>> {
        self.check()?;
        let lang = self
            .tables
            .read()
            .langs
            .values()
            .find(|lang| lang.info_id == info_id && lang.lang_key == lang_key)
            .cloned();

        let delay = self.read_delay.lock().take();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(lang)
    }

    async fn list_langs_by_code(&self, code: &str) -> Result<Vec<LangEntry>> {
        self.check()?;
        let tables = self.tables.read();
        let Some(info) = tables.info_by_code(code) else {
            return Ok(Vec::new());
        };

        let mut langs: Vec<LangEntry> = tables
            .langs
            .values()
            .filter(|lang| lang.info_id == info.info_id)
            .cloned()
            .collect();
        langs.sort_by(|a, b| a.lang_key.cmp(&b.lang_key));
        Ok(langs)
    }

    async fn insert_info(&self, entry: &CatalogEntry) -> Result<InfoId> {
        self.check()?;
        let mut tables = self.tables.write();

        let existing = tables.info_by_code(&entry.code).map(|info| info.info_id);
        if let Some(info_id) = existing {
            if let Some(info) = tables.infos.get_mut(&info_id) {
                info.last_modified_utc = entry.last_modified_utc;
            }
            return Ok(info_id);
        }

        tables.next_info_id += 1;
        let info_id = tables.next_info_id;
        tables.infos.insert(
            info_id,
            CatalogEntry {
                info_id,
                code: entry.code.clone(),
                last_modified_utc: entry.last_modified_utc,
            },
        );
        Ok(info_id)
    }

    async fn insert_lang(&self, entry: &LangEntry) -> Result<LangId> {
        self.check()?;
        let mut tables = self.tables.write();

        if !tables.infos.contains_key(&entry.info_id) {
            return Err(CoinFeedError::PersistenceFailure(format!(
                "catalog entry {} does not exist",
                entry.info_id
            )));
        }
        if tables
            .langs
            .values()
            .any(|lang| lang.info_id == entry.info_id && lang.lang_key == entry.lang_key)
        {
            return Err(CoinFeedError::PersistenceFailure(format!(
                "locale {} already exists for catalog entry {}",
                entry.lang_key, entry.info_id
            )));
        }

        tables.next_lang_id += 1;
        let lang_id = tables.next_lang_id;
        let mut stored = entry.clone();
        stored.lang_id = lang_id;
        tables.langs.insert(lang_id, stored);
        Ok(lang_id)
    }

    async fn update_lang(&self, entry: &LangEntry, modified_at: DateTime<Utc>) -> Result<bool> {
        self.check()?;
        let mut tables = self.tables.write();

        let Some(stored) = tables.langs.get_mut(&entry.lang_id) else {
            return Ok(false);
        };
        stored.name = entry.name.clone();
        stored.short_name = entry.short_name.clone();
        stored.description = entry.description.clone();

        if let Some(info) = tables.infos.get_mut(&entry.info_id) {
            info.last_modified_utc = modified_at;
        }
        Ok(true)
    }

    async fn delete_lang(&self, entry: &LangEntry) -> Result<bool> {
        self.check()?;
        Ok(self.tables.write().langs.remove(&entry.lang_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_locale_uniqueness() {
        let store = MemoryCatalogStore::new();
        let info_id = store.insert_info(&CatalogEntry::new("JPY")).await.unwrap();

        store
            .insert_lang(&LangEntry::new(info_id, "ja-JP", "日本円", "円", ""))
            .await
            .unwrap();
        let result = store
            .insert_lang(&LangEntry::new(info_id, "ja-JP", "Yen", "JPY", ""))
            .await;

        assert!(result.is_err());
        assert_eq!(store.lang_count(), 1);
    }

    #[tokio::test]
    async fn test_orphan_lang_rejected() {
        let store = MemoryCatalogStore::new();
        let result = store
            .insert_lang(&LangEntry::new(7, "ja-JP", "Yen", "JPY", ""))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_failing_store() {
        let store = MemoryCatalogStore::new();
        store.set_failing(true);

        let err = store.find_info_by_code("JPY").await.unwrap_err();
        assert_eq!(err.error_code(), "PERSISTENCE_FAILURE");

        store.set_failing(false);
        assert!(store.find_info_by_code("JPY").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_read_returns_value_read_before_the_delay() {
        let store = MemoryCatalogStore::new();
        let info_id = store.insert_info(&CatalogEntry::new("JPY")).await.unwrap();
        store
            .insert_lang(&LangEntry::new(info_id, "ja-JP", "日本円", "円", ""))
            .await
            .unwrap();

        store.delay_next_read(Duration::from_secs(1));
        let read = store.find_lang(info_id, "ja-JP");
        let delete = async {
            let lang = store.find_lang(info_id, "ja-JP").await.unwrap().unwrap();
            store.delete_lang(&lang).await.unwrap()
        };
        let (read, deleted) = tokio::join!(read, delete);

        assert!(deleted);
        assert_eq!(read.unwrap().unwrap().name, "日本円");
        assert!(store.find_lang(info_id, "ja-JP").await.unwrap().is_none());
    }
}

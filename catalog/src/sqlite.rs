//! SQLite-backed catalog store.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use coinfeed_common::{CatalogEntry, CoinFeedError, InfoId, LangEntry, LangId, Result};

use crate::store::CatalogStore;

static MIGRATOR: Migrator = sqlx::migrate!();

#[derive(Debug, sqlx::FromRow)]
struct InfoRow {
    currency_info_id: i64,
    currency_code: String,
    last_modified_time: DateTime<Utc>,
}

impl From<InfoRow> for CatalogEntry {
    fn from(row: InfoRow) -> Self {
        Self {
            info_id: row.currency_info_id,
            code: row.currency_code,
            last_modified_utc: row.last_modified_time,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LangRow {
    currency_lang_id: i64,
    currency_info_id: i64,
    lang_key: String,
    currency_name: String,
    currency_short_name: String,
    currency_description: String,
}

impl From<LangRow> for LangEntry {
    fn from(row: LangRow) -> Self {
        Self {
            lang_id: row.currency_lang_id,
            info_id: row.currency_info_id,
            lang_key: row.lang_key,
            name: row.currency_name,
            short_name: row.currency_short_name,
            description: row.currency_description,
        }
    }
}

/// Catalog store over a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteCatalogStore {
    pool: SqlitePool,
}

impl SqliteCatalogStore {
    /// Open (creating if needed) the database at `database_url` and run migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(CoinFeedError::persistence)?
            .create_if_missing(true)
            .foreign_keys(true);

        // An in-memory database lives only as long as its connection.
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(CoinFeedError::persistence)?;

        info!(database_url = %database_url, "Catalog database connected");

        Self::with_pool(pool).await
    }

    /// Open a private in-memory database.
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:").await
    }

    /// Wrap an existing pool, running migrations first.
    pub async fn with_pool(pool: SqlitePool) -> Result<Self> {
        MIGRATOR
            .run(&pool)
            .await
            .map_err(CoinFeedError::persistence)?;
        Ok(Self { pool })
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl CatalogStore for SqliteCatalogStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn find_info_by_code(&self, code: &str) -> Result<Option<CatalogEntry>> {
        let row = sqlx::query_as::<_, InfoRow>(
            r#"
            SELECT currency_info_id, currency_code, last_modified_time
            FROM currency_info
            WHERE currency_code = ?
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(CoinFeedError::persistence)?;

        Ok(row.map(CatalogEntry::from))
    }

    async fn find_lang(&self, info_id: InfoId, lang_key: &str) -> Result<Option<LangEntry>> {
        let row = sqlx::query_as::<_, LangRow>(
            r#"
            SELECT currency_lang_id, currency_info_id, lang_key,
                   currency_name, currency_short_name, currency_description
            FROM currency_lang
            WHERE currency_info_id = ? AND lang_key = ?
            "#,
        )
        .bind(info_id)
        .bind(lang_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(CoinFeedError::persistence)?;

        Ok(row.map(LangEntry::from))
    }

    async fn list_langs_by_code(&self, code: &str) -> Result<Vec<LangEntry>> {
        let rows = sqlx::query_as::<_, LangRow>(
            r#"
            SELECT l.currency_lang_id, l.currency_info_id, l.lang_key,
                   l.currency_name, l.currency_short_name, l.currency_description
            FROM currency_lang l
            JOIN currency_info i ON i.currency_info_id = l.currency_info_id
            WHERE i.currency_code = ?
            ORDER BY l.lang_key
            "#,
        )
        .bind(code)
        .fetch_all(&self.pool)
        .await
        .map_err(CoinFeedError::persistence)?;

        Ok(rows.into_iter().map(LangEntry::from).collect())
    }

    async fn insert_info(&self, entry: &CatalogEntry) -> Result<InfoId> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO currency_info (currency_code, last_modified_time)
            VALUES (?, ?)
            ON CONFLICT(currency_code) DO UPDATE SET
                last_modified_time = excluded.last_modified_time
            RETURNING currency_info_id
            "#,
        )
        .bind(&entry.code)
        .bind(entry.last_modified_utc)
        .fetch_one(&self.pool)
        .await
        .map_err(CoinFeedError::persistence)?;

        debug!(code = %entry.code, info_id = id, "Catalog entry stored");
        Ok(id)
    }

    async fn insert_lang(&self, entry: &LangEntry) -> Result<LangId> {
        let result = sqlx::query(
            r#"
            INSERT INTO currency_lang
                (currency_info_id, lang_key, currency_name,
                 currency_short_name, currency_description)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.info_id)
        .bind(&entry.lang_key)
        .bind(&entry.name)
        .bind(&entry.short_name)
        .bind(&entry.description)
        .execute(&self.pool)
        .await
        .map_err(CoinFeedError::persistence)?;

        Ok(result.last_insert_rowid())
    }

    async fn update_lang(&self, entry: &LangEntry, modified_at: DateTime<Utc>) -> Result<bool> {
        let mut tx = self.pool.begin().await.map_err(CoinFeedError::persistence)?;

        let updated = sqlx::query(
            r#"
            UPDATE currency_lang
            SET currency_name = ?, currency_short_name = ?, currency_description = ?
            WHERE currency_lang_id = ?
            "#,
        )
        .bind(&entry.name)
        .bind(&entry.short_name)
        .bind(&entry.description)
        .bind(entry.lang_id)
        .execute(&mut *tx)
        .await
        .map_err(CoinFeedError::persistence)?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await.map_err(CoinFeedError::persistence)?;
            return Ok(false);
        }

        sqlx::query("UPDATE currency_info SET last_modified_time = ? WHERE currency_info_id = ?")
            .bind(modified_at)
            .bind(entry.info_id)
            .execute(&mut *tx)
            .await
            .map_err(CoinFeedError::persistence)?;

        tx.commit().await.map_err(CoinFeedError::persistence)?;
        Ok(true)
    }

    async fn delete_lang(&self, entry: &LangEntry) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM currency_lang WHERE currency_lang_id = ?")
            .bind(entry.lang_id)
            .execute(&self.pool)
            .await
            .map_err(CoinFeedError::persistence)?
            .rows_affected();

        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn stored_lang(store: &SqliteCatalogStore, code: &str, lang_key: &str) -> LangEntry {
        let info_id = store.insert_info(&CatalogEntry::new(code)).await.unwrap();
        let mut lang = LangEntry::new(info_id, lang_key, "Japanese Yen", "JPY", "desc");
        lang.lang_id = store.insert_lang(&lang).await.unwrap();
        lang
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = SqliteCatalogStore::in_memory().await.unwrap();
        let lang = stored_lang(&store, "JPY", "ja-JP").await;

        let info = store.find_info_by_code("JPY").await.unwrap().unwrap();
        assert_eq!(info.info_id, lang.info_id);
        assert_eq!(info.code, "JPY");

        let found = store.find_lang(info.info_id, "ja-JP").await.unwrap().unwrap();
        assert_eq!(found, lang);

        assert!(store.find_lang(info.info_id, "en-US").await.unwrap().is_none());
        assert!(store.find_info_by_code("XYZ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_info_is_idempotent_by_code() {
        let store = SqliteCatalogStore::in_memory().await.unwrap();

        let first = store.insert_info(&CatalogEntry::new("JPY")).await.unwrap();
        let second = store.insert_info(&CatalogEntry::new("JPY")).await.unwrap();
        assert_eq!(first, second);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM currency_info")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_duplicate_locale_rejected() {
        let store = SqliteCatalogStore::in_memory().await.unwrap();
        let lang = stored_lang(&store, "JPY", "ja-JP").await;

        let duplicate = LangEntry::new(lang.info_id, "ja-JP", "Yen", "JPY", "");
        let err = store.insert_lang(&duplicate).await.unwrap_err();
        assert_eq!(err.error_code(), "PERSISTENCE_FAILURE");
    }

    #[tokio::test]
    async fn test_update_bumps_modified_time() {
        let store = SqliteCatalogStore::in_memory().await.unwrap();
        let mut lang = stored_lang(&store, "JPY", "ja-JP").await;
        let before = store.find_info_by_code("JPY").await.unwrap().unwrap();

        lang.short_name = "円".to_string();
        let modified_at = before.last_modified_utc + chrono::Duration::seconds(5);
        assert!(store.update_lang(&lang, modified_at).await.unwrap());

        let after = store.find_info_by_code("JPY").await.unwrap().unwrap();
        assert_eq!(after.last_modified_utc, modified_at);
        let found = store.find_lang(lang.info_id, "ja-JP").await.unwrap().unwrap();
        assert_eq!(found.short_name, "円");
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_row() {
        let store = SqliteCatalogStore::in_memory().await.unwrap();
        let mut ghost = LangEntry::new(1, "ja-JP", "Yen", "JPY", "");
        ghost.lang_id = 42;

        assert!(!store.update_lang(&ghost, Utc::now()).await.unwrap());
        assert!(!store.delete_lang(&ghost).await.unwrap());
    }

    #[tokio::test]
    async fn test_removing_info_cascades_to_langs() {
        let store = SqliteCatalogStore::in_memory().await.unwrap();
        stored_lang(&store, "JPY", "ja-JP").await;

        sqlx::query("DELETE FROM currency_info WHERE currency_code = ?")
            .bind("JPY")
            .execute(store.pool())
            .await
            .unwrap();

        assert!(store.list_langs_by_code("JPY").await.unwrap().is_empty());
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM currency_lang")
            .fetch_one(store.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}

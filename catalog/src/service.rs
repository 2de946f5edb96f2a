//! Catalog operations with failure-to-outcome conversion.

use chrono::Utc;
use tracing::{error, info, instrument};

use coinfeed_common::{CatalogEntry, CurrencyRow, LangEntry, Result};

use crate::store::SharedCatalogStore;

/// Catalog operations exposed to the service layer.
///
/// Storage failures never escape: writes report `false`, reads report an
/// empty result, and the failure is logged.
#[derive(Clone)]
pub struct CatalogService {
    store: SharedCatalogStore,
}

impl CatalogService {
    /// Create a new catalog service over `store`.
    pub fn new(store: SharedCatalogStore) -> Self {
        Self { store }
    }

    /// Get the underlying store.
    pub fn store(&self) -> &SharedCatalogStore {
        &self.store
    }

    /// Add a localized rendering of `code`, creating the catalog entry on
    /// first use.
    #[instrument(skip(self, name, short_name, description))]
    pub async fn add_currency(
        &self,
        code: &str,
        lang_key: &str,
        name: &str,
        short_name: &str,
        description: &str,
    ) -> bool {
        match self
            .try_add_currency(code, lang_key, name, short_name, description)
            .await
        {
            Ok(lang_id) => {
                info!(code = %code, lang_key = %lang_key, lang_id, "Currency added");
                true
            }
            Err(e) => {
                error!(code = %code, lang_key = %lang_key, error = %e, "Failed to add currency");
                false
            }
        }
    }

    async fn try_add_currency(
        &self,
        code: &str,
        lang_key: &str,
        name: &str,
        short_name: &str,
        description: &str,
    ) -> Result<i64> {
        let info_id = match self.store.find_info_by_code(code).await? {
            Some(existing) => existing.info_id,
            None => self.store.insert_info(&CatalogEntry::new(code)).await?,
        };

        let lang = LangEntry::new(info_id, lang_key, name, short_name, description);
        self.store.insert_lang(&lang).await
    }

    /// List every localized rendering of `code`.
    #[instrument(skip(self))]
    pub async fn list_currency_rows(&self, code: &str) -> Vec<CurrencyRow> {
        match self.store.list_langs_by_code(code).await {
            Ok(langs) => langs
                .into_iter()
                .map(|lang| CurrencyRow::join(code, lang))
                .collect(),
            Err(e) => {
                error!(code = %code, error = %e, "Failed to list currency rows");
                Vec::new()
            }
        }
    }

    /// Get the rendering of `code` for `lang_key`.
    #[instrument(skip(self))]
    pub async fn query_currency_info(&self, code: &str, lang_key: &str) -> Option<CurrencyRow> {
        match self.find_lang(code, lang_key).await {
            Ok(lang) => lang.map(|lang| CurrencyRow::join(code, lang)),
            Err(e) => {
                error!(
                    code = %code,
                    lang_key = %lang_key,
                    error = %e,
                    "Failed to query currency info"
                );
                None
            }
        }
    }

    /// Look up the localized rendering of `code`, propagating storage errors.
    pub async fn find_lang(&self, code: &str, lang_key: &str) -> Result<Option<LangEntry>> {
        let Some(info) = self.store.find_info_by_code(code).await? else {
            return Ok(None);
        };
        self.store.find_lang(info.info_id, lang_key).await
    }

    /// Change the short name of one rendering.
    #[instrument(skip(self))]
    pub async fn update_short_name(&self, code: &str, lang_key: &str, short_name: &str) -> bool {
        self.update_lang(code, lang_key, "short name", |lang| {
            lang.short_name = short_name.to_string();
        })
        .await
    }

    /// Change the display name of one rendering.
    #[instrument(skip(self))]
    pub async fn update_currency_name(&self, code: &str, lang_key: &str, name: &str) -> bool {
        self.update_lang(code, lang_key, "name", |lang| {
            lang.name = name.to_string();
        })
        .await
    }

    async fn update_lang(
        &self,
        code: &str,
        lang_key: &str,
        field: &str,
        apply: impl FnOnce(&mut LangEntry),
    ) -> bool {
        let result: Result<bool> = async {
            let Some(mut lang) = self.find_lang(code, lang_key).await? else {
                return Ok(false);
            };
            apply(&mut lang);
            self.store.update_lang(&lang, Utc::now()).await
        }
        .await;

        match result {
            Ok(updated) => {
                info!(
                    code = %code,
                    lang_key = %lang_key,
                    field,
                    updated,
                    "Currency update finished"
                );
                updated
            }
            Err(e) => {
                error!(
                    code = %code,
                    lang_key = %lang_key,
                    field,
                    error = %e,
                    "Failed to update currency"
                );
                false
            }
        }
    }

    /// Remove the rendering of `code` for `lang_key`; other locales and the
    /// catalog entry itself remain.
    #[instrument(skip(self))]
    pub async fn delete_currency(&self, code: &str, lang_key: &str) -> bool {
        let result: Result<bool> = async {
            let Some(lang) = self.find_lang(code, lang_key).await? else {
                return Ok(false);
            };
            self.store.delete_lang(&lang).await
        }
        .await;

        match result {
            Ok(deleted) => {
                info!(code = %code, lang_key = %lang_key, deleted, "Currency delete finished");
                deleted
            }
            Err(e) => {
                error!(code = %code, lang_key = %lang_key, error = %e, "Failed to delete currency");
                false
            }
        }
    }
}

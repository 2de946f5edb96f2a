//! Currency catalog records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Catalog record id.
pub type InfoId = i64;

/// Localized name record id.
pub type LangId = i64;

/// A currency known to the catalog, unique by code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub info_id: InfoId,
    pub code: String,
    pub last_modified_utc: DateTime<Utc>,
}

impl CatalogEntry {
    /// Create an unsaved entry; the store assigns the id.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            info_id: 0,
            code: code.into(),
            last_modified_utc: Utc::now(),
        }
    }
}

/// One localized rendering of a catalog currency.
///
/// `(info_id, lang_key)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LangEntry {
    pub lang_id: LangId,
    pub info_id: InfoId,
    pub lang_key: String,
    pub name: String,
    pub short_name: String,
    pub description: String,
}

impl LangEntry {
    /// Create an unsaved localized entry under `info_id`.
    pub fn new(
        info_id: InfoId,
        lang_key: impl Into<String>,
        name: impl Into<String>,
        short_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            lang_id: 0,
            info_id,
            lang_key: lang_key.into(),
            name: name.into(),
            short_name: short_name.into(),
            description: description.into(),
        }
    }
}

/// A catalog entry joined with one of its localized renderings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyRow {
    pub info_id: InfoId,
    pub code: String,
    pub lang_id: LangId,
    pub lang_key: String,
    pub name: String,
    pub short_name: String,
    pub description: String,
}

impl CurrencyRow {
    /// Join a catalog entry code with a localized rendering.
    pub fn join(code: &str, lang: LangEntry) -> Self {
        Self {
            info_id: lang.info_id,
            code: code.to_string(),
            lang_id: lang.lang_id,
            lang_key: lang.lang_key,
            name: lang.name,
            short_name: lang.short_name,
            description: lang.description,
        }
    }
}

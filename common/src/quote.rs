//! Price snapshot types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One currency entry of a price snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyQuote {
    /// ISO 4217 currency code.
    pub code: String,
    /// Markup-encoded glyph as published, e.g. `&euro;`.
    pub symbol: String,
    /// Locale-formatted rate, kept verbatim (e.g. `100,695.327`).
    #[serde(rename = "rate")]
    pub rate_display: String,
    /// Rate as a float.
    #[serde(rename = "rate_float", default)]
    pub rate_float: f64,
    #[serde(default)]
    pub description: String,
}

/// Publication times of a snapshot, raw and parsed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotTimes {
    pub updated_raw: String,
    pub updated_iso_raw: String,
    pub updated_uk_raw: String,
    /// `None` when the raw value does not match its layout.
    pub updated_at_utc: Option<NaiveDateTime>,
    pub updated_at_iso: Option<NaiveDateTime>,
    pub updated_at_uk: Option<NaiveDateTime>,
}

/// A price feed response at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSnapshot {
    pub times: SnapshotTimes,
    pub chart_label: String,
    pub disclaimer: String,
    /// Quotes keyed by currency code.
    pub entries: BTreeMap<String, CurrencyQuote>,
}

impl PriceSnapshot {
    /// Get a quote by currency code.
    pub fn quote(&self, code: &str) -> Option<&CurrencyQuote> {
        self.entries.get(code)
    }

    /// Currency codes in ascending order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of quotes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the snapshot carries no quotes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Snapshot payload parsing.

use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

use coinfeed_common::{
    parse_updated_iso, parse_updated_uk, parse_updated_utc, CurrencyQuote, PriceSnapshot,
    SnapshotTimes,
};

use crate::error::{FeedError, FeedResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPayload {
    time: RawTimes,
    chart_name: String,
    #[serde(default)]
    disclaimer: String,
    #[serde(default)]
    bpi: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTimes {
    #[serde(default)]
    updated: String,
    #[serde(rename = "updatedISO", default)]
    updated_iso: String,
    #[serde(rename = "updateduk", default)]
    updated_uk: String,
}

impl From<RawTimes> for SnapshotTimes {
    fn from(raw: RawTimes) -> Self {
        Self {
            updated_at_utc: parse_updated_utc(&raw.updated),
            updated_at_iso: parse_updated_iso(&raw.updated_iso),
            updated_at_uk: parse_updated_uk(&raw.updated_uk),
            updated_raw: raw.updated,
            updated_iso_raw: raw.updated_iso,
            updated_uk_raw: raw.updated_uk,
        }
    }
}

/// Parse a raw price payload.
///
/// Quotes that do not match the expected shape are skipped. Timestamps are
/// parsed per field and a bad field only clears itself.
pub fn parse_snapshot(raw: &str) -> FeedResult<PriceSnapshot> {
    let payload: RawPayload =
        serde_json::from_str(raw).map_err(|e| FeedError::MalformedPayload(e.to_string()))?;

    let mut entries = BTreeMap::new();
    for (key, value) in payload.bpi {
        match serde_json::from_value::<CurrencyQuote>(value) {
            Ok(quote) => {
                entries.insert(key, quote);
            }
            Err(e) => debug!(key = %key, error = %e, "Skipping entry that is not a quote"),
        }
    }

    let times = SnapshotTimes::from(payload.time);
    if times.updated_at_utc.is_none()
        || times.updated_at_iso.is_none()
        || times.updated_at_uk.is_none()
    {
        debug!(
            updated = %times.updated_raw,
            updated_iso = %times.updated_iso_raw,
            updated_uk = %times.updated_uk_raw,
            "Some snapshot timestamps did not parse"
        );
    }

    Ok(PriceSnapshot {
        times,
        chart_label: payload.chart_name,
        disclaimer: payload.disclaimer,
        entries,
    })
}

/// Snapshot served by the local fallback source, in the published format.
pub const LOCAL_SNAPSHOT: &str = r#"{
  "time": {
    "updated": "Feb 4, 2025 13:34:32 UTC",
    "updatedISO": "2025-02-04T13:34:32+00:00",
    "updateduk": "Feb 4, 2025 at 13:34 GMT"
  },
  "disclaimer": "This data was produced from the CoinDesk Bitcoin Price Index (USD).",
  "chartName": "Bitcoin",
  "bpi": {
    "USD": {
      "code": "USD",
      "symbol": "&#36;",
      "rate": "100,695.327",
      "description": "United States Dollar",
      "rate_float": 100695.3269
    },
    "GBP": {
      "code": "GBP",
      "symbol": "&pound;",
      "rate": "80,898.745",
      "description": "British Pound Sterling",
      "rate_float": 80898.7445
    },
    "EUR": {
      "code": "EUR",
      "symbol": "&euro;",
      "rate": "97,568.213",
      "description": "Euro",
      "rate_float": 97568.2128
    }
  }
}"#;

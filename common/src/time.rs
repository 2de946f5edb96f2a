//! Time utilities and constants for coinfeed.
//!
//! The price feed publishes the same instant three times, each rendered with
//! its own layout. Each layout is parsed independently and a field that does
//! not match degrades to `None` on its own.

use chrono::{DateTime, NaiveDateTime};

/// Service timing constants.
pub mod constants {
    use std::time::Duration;

    /// Sliding expiration window of the name cache (30 seconds).
    pub const CACHE_SLIDING_WINDOW: Duration = Duration::from_secs(30);

    /// Hard timeout for a single price source request (30 seconds).
    pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
}

/// `updated` layout, e.g. `Feb 4, 2025 13:34:32 UTC`.
pub const UPDATED_UTC_FORMAT: &str = "%b %d, %Y %H:%M:%S UTC";

/// `updateduk` layout, e.g. `Feb 4, 2025 at 13:34 GMT`.
pub const UPDATED_UK_FORMAT: &str = "%b %d, %Y at %H:%M GMT";

/// Layout of every timestamp in an enriched response.
pub const DISPLAY_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Parse the `updated` field.
pub fn parse_updated_utc(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), UPDATED_UTC_FORMAT).ok()
}

/// Parse the `updatedISO` field (RFC 3339 with an explicit offset or `Z`),
/// normalized to UTC.
pub fn parse_updated_iso(raw: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.naive_utc())
}

/// Parse the `updateduk` field.
pub fn parse_updated_uk(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), UPDATED_UK_FORMAT).ok()
}

/// Render a timestamp for display; an absent timestamp renders as an empty string.
pub fn format_display(timestamp: Option<NaiveDateTime>) -> String {
    timestamp
        .map(|ts| ts.format(DISPLAY_FORMAT).to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_updated_utc() {
        let ts = parse_updated_utc("Feb 4, 2025 13:34:32 UTC").unwrap();
        assert_eq!(format_display(Some(ts)), "2025/02/04 13:34:32");

        let ts = parse_updated_utc("Dec 24, 2024 08:05:09 UTC").unwrap();
        assert_eq!(format_display(Some(ts)), "2024/12/24 08:05:09");
    }

    #[test]
    fn test_parse_updated_iso() {
        let ts = parse_updated_iso("2025-02-04T13:34:32+00:00").unwrap();
        assert_eq!(format_display(Some(ts)), "2025/02/04 13:34:32");

        let ts = parse_updated_iso("2025-02-04T21:34:32+08:00").unwrap();
        assert_eq!(format_display(Some(ts)), "2025/02/04 13:34:32");

        assert!(parse_updated_iso("2025-02-04T13:34:32Z").is_some());
    }

    #[test]
    fn test_parse_updated_uk() {
        let ts = parse_updated_uk("Feb 4, 2025 at 13:34 GMT").unwrap();
        assert_eq!(format_display(Some(ts)), "2025/02/04 13:34:00");
    }

    #[test]
    fn test_mismatched_layouts() {
        assert!(parse_updated_utc("Feb 4, 2025 at 13:34 GMT").is_none());
        assert!(parse_updated_uk("Feb 4, 2025 13:34:32 UTC").is_none());
        assert!(parse_updated_iso("Feb 4, 2025").is_none());
        assert!(parse_updated_utc("").is_none());
        assert_eq!(format_display(None), "");
    }
}

//! Response types handed to the routing layer.

use serde::{Deserialize, Serialize};

use crate::error::CoinFeedError;

/// Reformatted publication times; empty when the source value did not parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTimes {
    #[serde(rename = "updateTime")]
    pub update_time: String,
    #[serde(rename = "updateTimeISO")]
    pub update_time_iso: String,
    #[serde(rename = "updateTimeUK")]
    pub update_time_uk: String,
}

/// A quote joined with its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedCurrency {
    pub currency_code: String,
    pub currency_name: String,
    pub currency_rate: String,
}

/// Final payload of the price pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedResponse {
    pub update_times: UpdateTimes,
    /// Ordered by currency code ascending.
    pub currency_infos: Vec<EnrichedCurrency>,
}

impl EnrichedResponse {
    /// Currency codes in response order.
    pub fn codes(&self) -> Vec<&str> {
        self.currency_infos
            .iter()
            .map(|c| c.currency_code.as_str())
            .collect()
    }
}

/// Uniform response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub is_ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying data.
    pub fn ok(data: T) -> Self {
        Self {
            is_ok: true,
            message: None,
            error_code: None,
            data: Some(data),
        }
    }

    /// Response with an explicit outcome and message.
    pub fn with_outcome(is_ok: bool, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            is_ok,
            message: Some(message.into()),
            error_code: None,
            data,
        }
    }

    /// Failed response built from an error.
    pub fn failure(context: &str, err: &CoinFeedError) -> Self {
        Self {
            is_ok: false,
            message: Some(format!("{context}: {err}")),
            error_code: Some(err.error_code().to_string()),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_serialization() {
        let response = ApiResponse::ok(EnrichedResponse {
            update_times: UpdateTimes {
                update_time: "2025/02/04 13:34:32".to_string(),
                update_time_iso: "2025/02/04 13:34:32".to_string(),
                update_time_uk: String::new(),
            },
            currency_infos: vec![EnrichedCurrency {
                currency_code: "EUR".to_string(),
                currency_name: "Euro".to_string(),
                currency_rate: "96,272.486".to_string(),
            }],
        });

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["isOk"], true);
        assert!(json.get("message").is_none());
        assert_eq!(json["data"]["updateTimes"]["updateTimeISO"], "2025/02/04 13:34:32");
        assert_eq!(json["data"]["updateTimes"]["updateTimeUK"], "");
        assert_eq!(json["data"]["currencyInfos"][0]["currencyCode"], "EUR");
        assert_eq!(json["data"]["currencyInfos"][0]["currencyRate"], "96,272.486");
    }

    #[test]
    fn test_failure_envelope() {
        let err = CoinFeedError::MalformedPayload("expected value".to_string());
        let response: ApiResponse<()> = ApiResponse::failure("price snapshot rejected", &err);

        assert!(!response.is_ok);
        assert_eq!(response.error_code.as_deref(), Some("MALFORMED_PAYLOAD"));
        assert_eq!(
            response.message.as_deref(),
            Some("price snapshot rejected: Malformed payload: expected value")
        );
        assert!(response.data.is_none());
    }
}

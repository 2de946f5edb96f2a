//! Error types for the coinfeed service.

use thiserror::Error;

/// Main error type for coinfeed operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoinFeedError {
    /// The price source could not be reached or answered with a failure.
    #[error("Transport failure from {source_name}: {reason}")]
    TransportFailure { source_name: String, reason: String },

    /// The price source answered with an empty body.
    #[error("Empty payload from {0}")]
    EmptyPayload(String),

    /// The payload could not be parsed into a price snapshot.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// No snapshot was available to assemble.
    #[error("Price snapshot missing")]
    MissingSnapshot,

    /// Catalog read or write failed.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl CoinFeedError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoinFeedError::TransportFailure { .. }
                | CoinFeedError::EmptyPayload(_)
                | CoinFeedError::PersistenceFailure(_)
        )
    }

    /// Get error code for response envelopes.
    pub fn error_code(&self) -> &'static str {
        match self {
            CoinFeedError::TransportFailure { .. } => "TRANSPORT_FAILURE",
            CoinFeedError::EmptyPayload(_) => "EMPTY_PAYLOAD",
            CoinFeedError::MalformedPayload(_) => "MALFORMED_PAYLOAD",
            CoinFeedError::MissingSnapshot => "MISSING_SNAPSHOT",
            CoinFeedError::PersistenceFailure(_) => "PERSISTENCE_FAILURE",
            CoinFeedError::ConfigurationError(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Create a persistence failure from any displayable error.
    pub fn persistence(err: impl std::fmt::Display) -> Self {
        CoinFeedError::PersistenceFailure(err.to_string())
    }
}

/// Result type alias for coinfeed operations.
pub type Result<T> = std::result::Result<T, CoinFeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = CoinFeedError::TransportFailure {
            source_name: "primary".to_string(),
            reason: "status 500".to_string(),
        };
        assert_eq!(err.error_code(), "TRANSPORT_FAILURE");
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "Transport failure from primary: status 500");

        let err = CoinFeedError::MalformedPayload("missing field `chartName`".to_string());
        assert_eq!(err.error_code(), "MALFORMED_PAYLOAD");
        assert!(!err.is_retryable());
    }
}

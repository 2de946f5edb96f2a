//! Feed pipeline error types.

use std::time::Duration;

use coinfeed_common::CoinFeedError;
use thiserror::Error;

/// Ways a single price source request can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read.
    #[error("Connection failure: {0}")]
    ConnectionFailure(String),

    /// No complete response within the timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The source answered with a non-2xx status.
    #[error("Non-success status {0}")]
    NonSuccessStatus(u16),

    /// The source answered 2xx with nothing in the body.
    #[error("Empty response body")]
    EmptyBody,
}

/// Errors that abort the price pipeline for one request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeedError {
    /// Every configured price source failed; carries the reported failure.
    #[error("Price source {origin} failed: {error}")]
    Source { origin: String, error: FetchError },

    /// The payload does not have the required structure.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// There was no snapshot to assemble.
    #[error("Price snapshot missing")]
    MissingSnapshot,
}

impl From<FeedError> for CoinFeedError {
    fn from(err: FeedError) -> Self {
        match err {
            FeedError::Source {
                origin,
                error: FetchError::EmptyBody,
            } => CoinFeedError::EmptyPayload(origin),
            FeedError::Source { origin, error } => CoinFeedError::TransportFailure {
                source_name: origin,
                reason: error.to_string(),
            },
            FeedError::MalformedPayload(reason) => CoinFeedError::MalformedPayload(reason),
            FeedError::MissingSnapshot => CoinFeedError::MissingSnapshot,
        }
    }
}

/// Result type for a single fetch.
pub type FetchResult<T> = Result<T, FetchError>;

/// Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;

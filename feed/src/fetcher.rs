//! Price source fetching.
//!
//! A single fetch is one GET with a hard timeout and no retry. Falling back
//! to a second source is done by [`FallbackSnapshotSource`], which composes
//! two independent sources.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::{FeedError, FeedResult, FetchError, FetchResult};
use crate::parser::LOCAL_SNAPSHOT;

/// Status and body of an HTTP GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Check for a 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP transport used by price sources.
///
/// Implementations report only `ConnectionFailure` or `Timeout`; status
/// handling belongs to [`fetch_snapshot`].
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Issue a GET against `uri`.
    async fn get(&self, uri: &str, timeout: Duration) -> FetchResult<HttpResponse>;
}

/// [`HttpClient`] backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a new client.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn classify(err: reqwest::Error, timeout: Duration) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(timeout)
        } else {
            FetchError::ConnectionFailure(err.to_string())
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, uri: &str, timeout: Duration) -> FetchResult<HttpResponse> {
        let response = self
            .client
            .get(uri)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::classify(e, timeout))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Self::classify(e, timeout))?;

        Ok(HttpResponse { status, body })
    }
}

/// Fetch the raw payload at `uri` with a single GET bounded by `timeout`.
pub async fn fetch_snapshot(
    http: &dyn HttpClient,
    uri: &str,
    timeout: Duration,
) -> FetchResult<String> {
    // Dropping the request future on expiry releases the connection.
    let response = match tokio::time::timeout(timeout, http.get(uri, timeout)).await {
        Ok(result) => result?,
        Err(_) => return Err(FetchError::Timeout(timeout)),
    };

    if !response.is_success() {
        return Err(FetchError::NonSuccessStatus(response.status));
    }

    if response.body.trim().is_empty() {
        return Err(FetchError::EmptyBody);
    }

    Ok(response.body)
}

/// A source of raw price snapshots.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Get the source name.
    fn name(&self) -> &str;

    /// Fetch one raw payload.
    async fn fetch(&self) -> FeedResult<String>;
}

/// A price source reached over HTTP.
pub struct HttpSnapshotSource {
    name: String,
    uri: String,
    timeout: Duration,
    http: Arc<dyn HttpClient>,
}

impl HttpSnapshotSource {
    /// Create a new HTTP source.
    pub fn new(
        name: impl Into<String>,
        uri: impl Into<String>,
        timeout: Duration,
        http: Arc<dyn HttpClient>,
    ) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            timeout,
            http,
        }
    }

    /// Get the source URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(source = %self.name, uri = %self.uri))]
    async fn fetch(&self) -> FeedResult<String> {
        match fetch_snapshot(self.http.as_ref(), &self.uri, self.timeout).await {
            Ok(body) => {
                debug!(bytes = body.len(), "Fetched price snapshot");
                Ok(body)
            }
            Err(error) => Err(FeedError::Source {
                origin: self.name.clone(),
                error,
            }),
        }
    }
}

/// Serves a fixed payload without touching the network.
pub struct StaticSnapshotSource {
    name: String,
    body: String,
}

impl StaticSnapshotSource {
    /// Create a source that always returns `body`.
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }

    /// The built-in local snapshot, used when the remote feed is unreachable.
    pub fn local() -> Self {
        Self::new("local", LOCAL_SNAPSHOT)
    }
}

#[async_trait]
impl SnapshotSource for StaticSnapshotSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> FeedResult<String> {
        debug!(source = %self.name, bytes = self.body.len(), "Serving static price snapshot");
        Ok(self.body.clone())
    }
}

/// Tries a primary source and, only if it fails, one fallback source.
pub struct FallbackSnapshotSource {
    primary: Arc<dyn SnapshotSource>,
    fallback: Option<Arc<dyn SnapshotSource>>,
}

impl FallbackSnapshotSource {
    /// Create a source without fallback.
    pub fn new(primary: Arc<dyn SnapshotSource>) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    /// Set the fallback source.
    pub fn with_fallback(mut self, fallback: Arc<dyn SnapshotSource>) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

#[async_trait]
impl SnapshotSource for FallbackSnapshotSource {
    fn name(&self) -> &str {
        self.primary.name()
    }

    async fn fetch(&self) -> FeedResult<String> {
        let primary_error = match self.primary.fetch().await {
            Ok(body) => return Ok(body),
            Err(e) => e,
        };

        let Some(fallback) = &self.fallback else {
            warn!(
                source = self.primary.name(),
                error = %primary_error,
                "Price source failed, no fallback configured"
            );
            return Err(primary_error);
        };

        warn!(
            source = self.primary.name(),
            fallback = fallback.name(),
            error = %primary_error,
            "Price source failed, trying fallback"
        );

        match fallback.fetch().await {
            Ok(body) => {
                info!(source = fallback.name(), "Price snapshot served by fallback");
                Ok(body)
            }
            Err(fallback_error) => {
                warn!(
                    source = fallback.name(),
                    error = %fallback_error,
                    "Fallback price source failed"
                );
                Err(primary_error)
            }
        }
    }
}

/// Mock HTTP client for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockHttpClient {
    replies: dashmap::DashMap<String, FetchResult<HttpResponse>>,
    calls: dashmap::DashMap<String, usize>,
    delay: Option<Duration>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockHttpClient {
    /// Create a mock with no routes.
    pub fn new() -> Self {
        Self {
            replies: dashmap::DashMap::new(),
            calls: dashmap::DashMap::new(),
            delay: None,
        }
    }

    /// Delay every reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Answer GETs on `uri` with `status` and `body`.
    pub fn respond(&self, uri: &str, status: u16, body: impl Into<String>) {
        self.replies.insert(
            uri.to_string(),
            Ok(HttpResponse {
                status,
                body: body.into(),
            }),
        );
    }

    /// Fail GETs on `uri` at the transport level.
    pub fn fail(&self, uri: &str, error: FetchError) {
        self.replies.insert(uri.to_string(), Err(error));
    }

    /// Number of GETs issued against `uri`.
    pub fn calls_to(&self, uri: &str) -> usize {
        self.calls.get(uri).map(|c| *c).unwrap_or(0)
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, uri: &str, _timeout: Duration) -> FetchResult<HttpResponse> {
        *self.calls.entry(uri.to_string()).or_insert(0) += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.replies
            .get(uri)
            .map(|reply| reply.clone())
            .unwrap_or_else(|| Err(FetchError::ConnectionFailure(format!("no route to {uri}"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIMARY: &str = "https://prices.example/v1/bpi/currentprice.json";
    const FALLBACK: &str = "http://localhost:5023/bpi";
    const TIMEOUT: Duration = Duration::from_secs(30);

    fn source(name: &str, uri: &str, http: &Arc<MockHttpClient>) -> Arc<dyn SnapshotSource> {
        Arc::new(HttpSnapshotSource::new(name, uri, TIMEOUT, http.clone()))
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let http = MockHttpClient::new();
        http.respond(PRIMARY, 200, r#"{"chartName":"Bitcoin"}"#);

        let body = fetch_snapshot(&http, PRIMARY, TIMEOUT).await.unwrap();
        assert_eq!(body, r#"{"chartName":"Bitcoin"}"#);
    }

    #[tokio::test]
    async fn test_fetch_failure_taxonomy() {
        let http = MockHttpClient::new();
        http.respond(PRIMARY, 500, "internal error");
        http.respond(FALLBACK, 200, "  \n");

        assert_eq!(
            fetch_snapshot(&http, PRIMARY, TIMEOUT).await,
            Err(FetchError::NonSuccessStatus(500))
        );
        assert_eq!(
            fetch_snapshot(&http, FALLBACK, TIMEOUT).await,
            Err(FetchError::EmptyBody)
        );
        assert!(matches!(
            fetch_snapshot(&http, "http://nowhere", TIMEOUT).await,
            Err(FetchError::ConnectionFailure(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_timeout() {
        let http = MockHttpClient::new().with_delay(Duration::from_secs(60));
        http.respond(PRIMARY, 200, "{}");

        let result = fetch_snapshot(&http, PRIMARY, TIMEOUT).await;
        assert_eq!(result, Err(FetchError::Timeout(TIMEOUT)));
    }

    #[tokio::test]
    async fn test_fallback_used_after_primary_failure() {
        let http = Arc::new(MockHttpClient::new());
        http.respond(PRIMARY, 503, "");
        http.respond(FALLBACK, 200, "{}");

        let composed = FallbackSnapshotSource::new(source("primary", PRIMARY, &http))
            .with_fallback(source("fallback", FALLBACK, &http));

        assert_eq!(composed.fetch().await.unwrap(), "{}");
        assert_eq!(http.calls_to(PRIMARY), 1);
        assert_eq!(http.calls_to(FALLBACK), 1);
    }

    #[tokio::test]
    async fn test_fallback_skipped_when_primary_succeeds() {
        let http = Arc::new(MockHttpClient::new());
        http.respond(PRIMARY, 200, "{}");
        http.respond(FALLBACK, 200, "{}");

        let composed = FallbackSnapshotSource::new(source("primary", PRIMARY, &http))
            .with_fallback(source("fallback", FALLBACK, &http));

        composed.fetch().await.unwrap();
        assert_eq!(http.calls_to(FALLBACK), 0);
    }

    #[tokio::test]
    async fn test_all_sources_failing_reports_primary() {
        let http = Arc::new(MockHttpClient::new());
        http.respond(PRIMARY, 500, "");
        http.fail(FALLBACK, FetchError::ConnectionFailure("refused".to_string()));

        let composed = FallbackSnapshotSource::new(source("primary", PRIMARY, &http))
            .with_fallback(source("fallback", FALLBACK, &http));

        assert_eq!(
            composed.fetch().await,
            Err(FeedError::Source {
                origin: "primary".to_string(),
                error: FetchError::NonSuccessStatus(500),
            })
        );
    }

    #[tokio::test]
    async fn test_static_source_as_fallback() {
        let http = Arc::new(MockHttpClient::new());
        http.fail(PRIMARY, FetchError::Timeout(TIMEOUT));

        let composed = FallbackSnapshotSource::new(source("primary", PRIMARY, &http))
            .with_fallback(Arc::new(StaticSnapshotSource::local()));

        assert_eq!(composed.fetch().await.unwrap(), LOCAL_SNAPSHOT);
        assert_eq!(http.calls_to(PRIMARY), 1);
        assert_eq!(StaticSnapshotSource::local().name(), "local");
    }
}

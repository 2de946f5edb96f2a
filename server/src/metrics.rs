//! Metrics collection for service monitoring.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Service metrics.
pub struct ServiceMetrics {
    /// Price enrichment requests.
    pub enrich_requests: AtomicU64,
    /// Price enrichment requests that failed.
    pub enrich_failures: AtomicU64,
    /// Catalog write operations.
    pub catalog_writes: AtomicU64,
    /// Catalog write operations that reported failure.
    pub catalog_write_failures: AtomicU64,
}

impl ServiceMetrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self {
            enrich_requests: AtomicU64::new(0),
            enrich_failures: AtomicU64::new(0),
            catalog_writes: AtomicU64::new(0),
            catalog_write_failures: AtomicU64::new(0),
        }
    }

    /// Record an enrichment outcome.
    pub fn enrich_finished(&self, ok: bool) {
        self.enrich_requests.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.enrich_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a catalog write outcome.
    pub fn catalog_write_finished(&self, ok: bool) {
        self.catalog_writes.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.catalog_write_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            enrich_requests: self.enrich_requests.load(Ordering::Relaxed),
            enrich_failures: self.enrich_failures.load(Ordering::Relaxed),
            catalog_writes: self.catalog_writes.load(Ordering::Relaxed),
            catalog_write_failures: self.catalog_write_failures.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        format!(
            r#"# HELP coinfeed_enrich_requests_total Price enrichment requests
# TYPE coinfeed_enrich_requests_total counter
coinfeed_enrich_requests_total {}

# HELP coinfeed_enrich_failures_total Failed price enrichment requests
# TYPE coinfeed_enrich_failures_total counter
coinfeed_enrich_failures_total {}

# HELP coinfeed_catalog_writes_total Catalog write operations
# TYPE coinfeed_catalog_writes_total counter
coinfeed_catalog_writes_total {}

# HELP coinfeed_catalog_write_failures_total Failed catalog write operations
# TYPE coinfeed_catalog_write_failures_total counter
coinfeed_catalog_write_failures_total {}
"#,
            snapshot.enrich_requests,
            snapshot.enrich_failures,
            snapshot.catalog_writes,
            snapshot.catalog_write_failures,
        )
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub enrich_requests: u64,
    pub enrich_failures: u64,
    pub catalog_writes: u64,
    pub catalog_write_failures: u64,
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<ServiceMetrics>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_increment() {
        let metrics = ServiceMetrics::new();

        metrics.enrich_finished(true);
        metrics.enrich_finished(false);
        metrics.catalog_write_finished(true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.enrich_requests, 2);
        assert_eq!(snapshot.enrich_failures, 1);
        assert_eq!(snapshot.catalog_writes, 1);
        assert_eq!(snapshot.catalog_write_failures, 0);
    }

    #[test]
    fn test_prometheus_export() {
        let metrics = ServiceMetrics::new();
        metrics.catalog_write_finished(false);

        let output = metrics.to_prometheus();
        assert!(output.contains("coinfeed_catalog_writes_total 1"));
        assert!(output.contains("coinfeed_catalog_write_failures_total 1"));
    }
}

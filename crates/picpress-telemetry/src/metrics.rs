//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Exposes only the counters/gauges the conversion service reports on.

use std::sync::Arc;

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    conversions_total: IntCounterVec,
    cleanup_removed_total: IntCounterVec,
    archive_bytes_total: IntCounter,
    active_jobs: IntGauge,
}

/// Snapshot of selected gauges and counters for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Conversion jobs currently in flight.
    pub active_jobs: i64,
    /// Total bytes of finalized archives.
    pub archive_bytes_total: u64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests received"),
            &["route", "code"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "http_requests_total",
            source,
        })?;
        let conversions_total = IntCounterVec::new(
            Opts::new("conversions_total", "Per-file conversion outcomes"),
            &["outcome"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "conversions_total",
            source,
        })?;
        let cleanup_removed_total = IntCounterVec::new(
            Opts::new(
                "cleanup_removed_total",
                "Entries removed from transient areas by cleanup",
            ),
            &["area"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "cleanup_removed_total",
            source,
        })?;
        let archive_bytes_total = IntCounter::with_opts(Opts::new(
            "archive_bytes_total",
            "Bytes of finalized conversion archives",
        ))
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "archive_bytes_total",
            source,
        })?;
        let active_jobs = IntGauge::with_opts(Opts::new(
            "active_jobs",
            "Conversion jobs currently in flight",
        ))
        .map_err(|source| TelemetryError::MetricsCollector {
            name: "active_jobs",
            source,
        })?;

        register(&registry, "http_requests_total", &http_requests_total)?;
        register(&registry, "conversions_total", &conversions_total)?;
        register(&registry, "cleanup_removed_total", &cleanup_removed_total)?;
        register(&registry, "archive_bytes_total", &archive_bytes_total)?;
        register(&registry, "active_jobs", &active_jobs)?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                conversions_total,
                cleanup_removed_total,
                archive_bytes_total,
                active_jobs,
            }),
        })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        self.inner
            .http_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Increment the per-file conversion counter (`success`, `invalid_image`, ...).
    pub fn inc_conversion(&self, outcome: &str) {
        self.inner
            .conversions_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Record entries removed from a transient area.
    pub fn add_cleanup_removed(&self, area: &str, removed: usize) {
        let removed = u64::try_from(removed).unwrap_or(u64::MAX);
        self.inner
            .cleanup_removed_total
            .with_label_values(&[area])
            .inc_by(removed);
    }

    /// Record the size of a finalized archive.
    pub fn add_archive_bytes(&self, bytes: u64) {
        self.inner.archive_bytes_total.inc_by(bytes);
    }

    /// Mark a conversion job as started.
    pub fn job_started(&self) {
        self.inner.active_jobs.inc();
    }

    /// Mark a conversion job as finished.
    pub fn job_finished(&self) {
        self.inner.active_jobs.dec();
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if the metrics cannot be encoded or if the encoded
    /// buffer is not valid UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsEncode { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Take a point-in-time snapshot of the most relevant gauges and counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            active_jobs: self.inner.active_jobs.get(),
            archive_bytes_total: self.inner.archive_bytes_total.get(),
        }
    }
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
where
    C: prometheus::core::Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_snapshot_reflects_updates() -> anyhow::Result<()> {
        let metrics = Metrics::new()?;
        metrics.inc_http_request("/convert", 200);
        metrics.inc_conversion("success");
        metrics.inc_conversion("invalid_image");
        metrics.add_cleanup_removed("intake", 3);
        metrics.add_archive_bytes(2_048);
        metrics.job_started();
        metrics.job_started();
        metrics.job_finished();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.active_jobs, 1);
        assert_eq!(snapshot.archive_bytes_total, 2_048);

        let rendered = metrics.render()?;
        assert!(rendered.contains("http_requests_total"));
        assert!(rendered.contains("conversions_total{outcome=\"invalid_image\"} 1"));
        assert!(rendered.contains("cleanup_removed_total{area=\"intake\"} 3"));
        Ok(())
    }

    #[test]
    fn registries_are_independent_per_instance() -> anyhow::Result<()> {
        let first = Metrics::new()?;
        let second = Metrics::new()?;
        first.add_archive_bytes(10);
        assert_eq!(second.snapshot().archive_bytes_total, 0);
        Ok(())
    }
}

//! Prometheus metrics for the whisker hub
//!
//! This module provides metrics tracking for:
//! - Pipeline: scans, records, parse failures by kind
//! - Ingest: records appended per device
//! - Publisher: broadcasts per feed, subscribers per feed
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter, register_counter_vec, register_gauge_vec, Counter, CounterVec, Encoder,
    GaugeVec, TextEncoder,
};
use std::sync::OnceLock;

use crate::models::ScanReport;

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for all hub metrics
struct HubMetrics {
    scans: Counter,
    scan_records: Counter,
    scan_failures: CounterVec,
    ingest_records: CounterVec,
    broadcasts: CounterVec,
    feed_subscribers: GaugeVec,
}

/// Global storage for hub metrics
static HUB_METRICS: OnceLock<HubMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// This function should be called once at application startup.
/// If metric registration fails, errors are logged and subsequent
/// metric operations become no-ops.
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    // Prevent double initialization
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let metrics = HubMetrics {
        scans: register_counter!(
            "whisker_scans_total",
            "Total full-log scans performed"
        )?,
        scan_records: register_counter!(
            "whisker_scan_records_total",
            "Total records parsed across all scans"
        )?,
        scan_failures: register_counter_vec!(
            "whisker_scan_failures_total",
            "Total lines skipped during scans, by failure kind",
            &["kind"]
        )?,
        ingest_records: register_counter_vec!(
            "whisker_ingest_records_total",
            "Total records appended to the status log, by device",
            &["device"]
        )?,
        broadcasts: register_counter_vec!(
            "whisker_broadcasts_total",
            "Total payloads broadcast to subscribers, by feed",
            &["feed"]
        )?,
        feed_subscribers: register_gauge_vec!(
            "whisker_feed_subscribers",
            "Currently connected subscribers, by feed",
            &["feed"]
        )?,
    };

    HUB_METRICS
        .set(metrics)
        .map_err(|_| "Hub metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record the outcome of one full-log scan
pub fn record_scan(report: &ScanReport) {
    let Some(m) = HUB_METRICS.get() else {
        return;
    };

    m.scans.inc();
    if report.records > 0 {
        m.scan_records.inc_by(report.records as f64);
    }

    let failures = &report.failures;
    for (kind, count) in [
        ("unknown_port", failures.unknown_port),
        ("bad_duration", failures.bad_duration),
        ("unknown_format", failures.unknown_format),
        ("missing_field", failures.missing_field),
    ] {
        if count > 0 {
            m.scan_failures
                .with_label_values(&[kind])
                .inc_by(count as f64);
        }
    }
}

/// Record a record appended to the log for a device
pub fn record_ingest(device: &str) {
    if let Some(m) = HUB_METRICS.get() {
        m.ingest_records.with_label_values(&[device]).inc();
    }
}

/// Record a broadcast on a feed
pub fn record_broadcast(feed: &str) {
    if let Some(m) = HUB_METRICS.get() {
        m.broadcasts.with_label_values(&[feed]).inc();
    }
}

/// Update the subscriber gauge for a feed
pub fn set_feed_subscribers(feed: &str, count: usize) {
    if let Some(m) = HUB_METRICS.get() {
        m.feed_subscribers
            .with_label_values(&[feed])
            .set(count as f64);
    }
}

// ============================================================================
// Tests
// ============================================================================

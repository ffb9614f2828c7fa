//! Full-log reduction into per-device duration totals
//!
//! The aggregator is deliberately stateless across invocations: every trigger
//! rescans the whole log and rebuilds the table from scratch. Recomputation
//! is idempotent, so overlapping scans converge on the same result and no
//! incremental bookkeeping can drift.

pub mod leader;

use std::collections::BTreeMap;

use crate::models::{GroupedRecords, ScanReport, StatusRecord};
use crate::parser::{parse_line, LineError};
use crate::{devices::CatDevice, metrics};

/// Cumulative seconds per state label, per device id
///
/// BTreeMaps keep serialization order stable; label insertion order is
/// irrelevant to the semantics.
pub type AggregateTable = BTreeMap<String, BTreeMap<String, u64>>;

/// Stateless full-scan reducer over the status log text
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator;

impl Aggregator {
    pub fn new() -> Self {
        Self
    }

    /// Reduce the full log text into a duration table
    ///
    /// Every known device is pre-initialized with an empty state map, so the
    /// leader selector always sees the complete candidate set even when a
    /// device has no records yet. A malformed line is counted and skipped,
    /// never fatal. Csv records are duration-less and do not touch the table.
    pub fn scan(&self, text: &str) -> (AggregateTable, ScanReport) {
        let mut table: AggregateTable = CatDevice::all()
            .into_iter()
            .map(|d| (d.id().to_string(), BTreeMap::new()))
            .collect();

        let report = self.reduce(text, |record| {
            if record.has_duration() {
                let total = table
                    .entry(record.device.id().to_string())
                    .or_default()
                    .entry(record.state.clone())
                    .or_insert(0);
                // The log only grows; totals cap at u64::MAX rather than wrap
                *total = total.saturating_add(record.duration_secs);
            }
        });

        (table, report)
    }

    /// Collect every record grouped by device id, unfiltered by state
    ///
    /// This is the raw view pushed on the data feed; csv records appear here
    /// even though they never enter the duration table.
    pub fn group(&self, text: &str) -> (GroupedRecords, ScanReport) {
        let mut records = Vec::new();
        let report = self.reduce(text, |record| records.push(record.clone()));
        (GroupedRecords::from_records(records), report)
    }

    /// Shared line walk: parse each line, hand records to `keep`, count the
    /// rest
    fn reduce(&self, text: &str, mut keep: impl FnMut(&StatusRecord)) -> ScanReport {
        let mut report = ScanReport::default();

        for line in text.lines() {
            report.lines += 1;
            match parse_line(line) {
                Ok(Some(record)) => {
                    report.records += 1;
                    keep(&record);
                }
                Ok(None) => report.blank += 1,
                Err(err) => {
                    tracing::debug!(line = %line.trim(), error = %err, "skipping unparsable line");
                    count_failure(&mut report, &err);
                }
            }
        }

        metrics::record_scan(&report);
        report
    }
}

fn count_failure(report: &mut ScanReport, err: &LineError) {
    match err {
        LineError::UnknownPort { .. } => report.failures.unknown_port += 1,
        LineError::BadDuration { .. } => report.failures.bad_duration += 1,
        LineError::UnknownFormat => report.failures.unknown_format += 1,
        LineError::MissingField { .. } => report.failures.missing_field += 1,
    }
}

//! Interval and event driven fan-out to subscribers
//!
//! The publisher owns the broadcast channels behind the push feeds and one
//! scheduled loop with an explicit start/stop lifecycle. Every cycle reads
//! its own snapshot of the log and recomputes from scratch; overlapping
//! cycles are harmless because recomputation is idempotent and the last
//! publish wins.
//!
//! Three feeds exist:
//! - **buzz**: the bare leader device id, broadcast on every tick
//! - **data**: raw records grouped by device, broadcast on ticks and on
//!   every log append; an explicit error payload replaces data when the log
//!   cannot be read
//! - **chart**: the full per-state duration table, computed once per
//!   subscriber at connect time (see [`Publisher::chart_snapshot`])

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};

use crate::aggregate::leader::select_leader;
use crate::aggregate::{AggregateTable, Aggregator};
use crate::error::{Error, Result};
use crate::metrics;
use crate::models::GroupedRecords;
use crate::store::StatusLog;

// ============================================================================
// Publisher Configuration
// ============================================================================

/// Configuration for the publisher loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Seconds between broadcast ticks
    pub tick_secs: u64,

    /// Capacity of each feed's broadcast channel
    pub channel_capacity: usize,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            tick_secs: 5,
            channel_capacity: 64,
        }
    }
}

impl PublisherConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.tick_secs == 0 {
            return Err(Error::config("tick_secs must be greater than 0"));
        }
        if self.channel_capacity == 0 {
            return Err(Error::config("channel_capacity must be greater than 0"));
        }
        Ok(())
    }

    /// Tick period as a Duration
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }
}

// ============================================================================
// Feed Payloads
// ============================================================================

/// Payload of the data feed
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DataPayload {
    /// Raw records grouped by device id
    Groups(GroupedRecords),
    /// The log could not be read; subscribers get this instead of stale data
    Error { error: String },
}

/// Payload of the chart feed
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ChartPayload {
    /// Per-device per-state duration totals
    Table(AggregateTable),
    /// The log could not be read
    Error { error: String },
}

// ============================================================================
// Publisher
// ============================================================================

/// Owns the push feeds and the scheduled broadcast loop
pub struct Publisher {
    config: PublisherConfig,
    log: Arc<StatusLog>,
    aggregator: Aggregator,
    leader_tx: broadcast::Sender<String>,
    data_tx: broadcast::Sender<DataPayload>,
    is_running: Arc<RwLock<bool>>,
}

impl Publisher {
    /// Create a new publisher over the given status log
    pub fn new(log: Arc<StatusLog>, config: PublisherConfig) -> Result<Self> {
        config.validate()?;

        let (leader_tx, _) = broadcast::channel(config.channel_capacity);
        let (data_tx, _) = broadcast::channel(config.channel_capacity);

        Ok(Self {
            config,
            log,
            aggregator: Aggregator::new(),
            leader_tx,
            data_tx,
            is_running: Arc::new(RwLock::new(false)),
        })
    }

    /// Create with default config
    pub fn with_defaults(log: Arc<StatusLog>) -> Result<Self> {
        Self::new(log, PublisherConfig::default())
    }

    /// Subscribe to the leader feed (bare device ids)
    pub fn subscribe_leader(&self) -> broadcast::Receiver<String> {
        self.leader_tx.subscribe()
    }

    /// Subscribe to the data feed
    pub fn subscribe_data(&self) -> broadcast::Receiver<DataPayload> {
        self.data_tx.subscribe()
    }

    /// Currently subscribed leader-feed receivers
    pub fn leader_subscribers(&self) -> usize {
        self.leader_tx.receiver_count()
    }

    /// Currently subscribed data-feed receivers
    pub fn data_subscribers(&self) -> usize {
        self.data_tx.receiver_count()
    }

    /// Compute a fresh data payload from the current log contents
    ///
    /// Used on every cycle and once per new data-feed subscriber.
    pub async fn data_snapshot(&self) -> DataPayload {
        match self.log.snapshot().await {
            Ok(text) => {
                let (groups, _) = self.aggregator.group(&text);
                DataPayload::Groups(groups)
            }
            Err(err) => {
                tracing::warn!(error = %err, "data snapshot failed");
                DataPayload::Error {
                    error: "Failed to load data.".to_string(),
                }
            }
        }
    }

    /// Compute a fresh chart payload from the current log contents
    ///
    /// Pushed once per chart-feed subscriber at connect time.
    pub async fn chart_snapshot(&self) -> ChartPayload {
        match self.log.snapshot().await {
            Ok(text) => {
                let (table, _) = self.aggregator.scan(&text);
                ChartPayload::Table(table)
            }
            Err(err) => {
                tracing::warn!(error = %err, "chart snapshot failed");
                ChartPayload::Error {
                    error: "Failed to load data.".to_string(),
                }
            }
        }
    }

    /// Compute the current leader id from a fresh snapshot
    ///
    /// Returns `None` when the log cannot be read; the caller skips that
    /// broadcast rather than announcing a stale leader.
    pub async fn leader_snapshot(&self) -> Option<String> {
        let text = match self.log.snapshot().await {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(error = %err, "leader snapshot failed");
                return None;
            }
        };
        let (table, _) = self.aggregator.scan(&text);
        select_leader(&table).map(|d| d.id().to_string())
    }

    /// Run the broadcast loop until stopped
    ///
    /// Ticks fire on a fixed interval; log appends trigger an immediate data
    /// broadcast between ticks.
    pub async fn start(&self) {
        *self.is_running.write().await = true;
        tracing::info!(tick_secs = self.config.tick_secs, "publisher started");

        let mut ticker = tokio::time::interval(self.config.tick_interval());
        // The first interval tick fires immediately; that gives fresh output
        // right after startup.
        let mut appends = self.log.subscribe();

        while *self.is_running.read().await {
            tokio::select! {
                _ = ticker.tick() => {
                    self.publish_tick().await;
                }
                event = appends.recv() => {
                    match event {
                        Ok(()) => self.publish_data().await,
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            // The next broadcast carries the full log anyway
                            tracing::debug!(missed, "append notifications lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                _ = self.wait_for_stop() => break,
            }
        }

        tracing::info!("publisher stopped");
    }

    /// Stop the broadcast loop
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
    }

    /// Check if the loop is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Get publisher status
    pub async fn status(&self) -> PublisherStatus {
        PublisherStatus {
            is_running: *self.is_running.read().await,
            tick_secs: self.config.tick_secs,
            leader_subscribers: self.leader_subscribers(),
            data_subscribers: self.data_subscribers(),
        }
    }

    // Internal: wait for stop signal
    async fn wait_for_stop(&self) {
        loop {
            if !*self.is_running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    // Internal: one full tick (data + leader)
    async fn publish_tick(&self) {
        self.publish_data().await;

        if let Some(leader) = self.leader_snapshot().await {
            tracing::debug!(leader = %leader, "broadcasting leader");
            // Err only means nobody is listening right now
            if self.leader_tx.send(leader).is_ok() {
                metrics::record_broadcast("buzz");
            }
        }
    }

    // Internal: data-feed broadcast from a fresh snapshot
    async fn publish_data(&self) {
        let payload = self.data_snapshot().await;
        if self.data_tx.send(payload).is_ok() {
            metrics::record_broadcast("data");
        }
    }
}

/// Publisher status information
#[derive(Debug, Clone, Serialize)]
pub struct PublisherStatus {
    pub is_running: bool,
    pub tick_secs: u64,
    pub leader_subscribers: usize,
    pub data_subscribers: usize,
}

// ============================================================================
// Tests
// ============================================================================

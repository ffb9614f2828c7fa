//! Network-to-log ingest sinks
//!
//! Collectors receive free-text status payloads from collar devices and
//! append them to the status log as piped-format lines. They are thin
//! shells: no parsing happens here, the pipeline reads everything back from
//! the log. Connection failures are logged and retried, never fatal.

pub mod tcp;
pub mod udp;

pub use tcp::DeviceCollector;
pub use udp::UdpListener;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;

use crate::devices::CatDevice;
use crate::error::{Error, Result};

/// A long-running ingest sink with cooperative shutdown
#[async_trait]
pub trait Collector: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Run until the shutdown flag flips to true
    async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<()>;
}

/// One collar device endpoint to dial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEndpoint {
    pub host: String,
    pub port: u16,
}

impl DeviceEndpoint {
    /// Logical device id for this endpoint's port, falling back to the raw
    /// port for endpoints outside the fixed table
    pub fn device_label(&self) -> String {
        CatDevice::from_port(self.port)
            .map(|d| d.id().to_string())
            .unwrap_or_else(|| self.port.to_string())
    }
}

impl std::fmt::Display for DeviceEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Configuration for the ingest sinks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Dial out to devices over TCP
    pub enable_tcp: bool,

    /// Listen for device datagrams over UDP
    pub enable_udp: bool,

    /// Device endpoints the TCP collector dials
    pub devices: Vec<DeviceEndpoint>,

    /// Bind address for the UDP listener
    pub udp_bind: String,

    /// Seconds between reconnect attempts
    pub retry_secs: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            enable_tcp: true,
            enable_udp: false,
            devices: CatDevice::all()
                .into_iter()
                .map(|d| DeviceEndpoint {
                    host: "127.0.0.1".to_string(),
                    port: d.port(),
                })
                .collect(),
            udp_bind: "0.0.0.0:3333".to_string(),
            retry_secs: 5,
        }
    }
}

impl IngestConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.enable_tcp && self.devices.is_empty() {
            return Err(Error::config("TCP ingest enabled with no devices"));
        }
        if self.enable_udp && self.udp_bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(Error::config(format!(
                "invalid udp_bind address: {}",
                self.udp_bind
            )));
        }
        if self.retry_secs == 0 {
            return Err(Error::config("retry_secs must be greater than 0"));
        }
        Ok(())
    }

    /// Reconnect backoff as a Duration
    #[must_use]
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_secs)
    }
}

/// Wrap a raw device payload as one piped-format log line
///
/// The ID field carries the receive time in epoch milliseconds, matching
/// what the devices themselves report when they stamp messages.
pub fn format_entry(port: u16, payload: &str) -> String {
    format!(
        "Port {port} | ID {} | Message: {}",
        chrono::Utc::now().timestamp_millis(),
        payload.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_line;

    #[test]
    fn test_default_config_covers_all_devices() {
        let config = IngestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.devices.len(), 3);
        assert_eq!(config.devices[1].port, 3334);
        assert_eq!(config.devices[1].device_label(), "2");
    }

    #[test]
    fn test_invalid_udp_bind_rejected() {
        let config = IngestConfig {
            enable_udp: true,
            udp_bind: "not-an-address".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tcp_without_devices_rejected() {
        let config = IngestConfig {
            devices: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_formatted_entry_round_trips_through_parser() {
        let line = format_entry(3334, "00:03:01, Cat state: Wander Time\n");
        let record = parse_line(&line).unwrap().unwrap();

        assert_eq!(record.device, CatDevice::Two);
        assert_eq!(record.duration_secs, 181);
        assert_eq!(record.state, "Wander Time");
        assert!(!record.stamp.is_empty());
    }
}

//! TCP device collector
//!
//! Dials every configured collar endpoint, reads newline-separated status
//! payloads, and appends each as a piped-format log line. Connections are
//! re-established with a fixed backoff; a dead device never takes the
//! collector down.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::watch;

use super::{format_entry, Collector, DeviceEndpoint, IngestConfig};
use crate::error::Result;
use crate::metrics;
use crate::store::StatusLog;

/// Dial-out collector for all configured devices
pub struct DeviceCollector {
    config: IngestConfig,
    log: Arc<StatusLog>,
}

impl DeviceCollector {
    pub fn new(config: IngestConfig, log: Arc<StatusLog>) -> Self {
        Self { config, log }
    }

    /// Connect-read-append loop for one device
    async fn collect_device(
        device: DeviceEndpoint,
        log: Arc<StatusLog>,
        retry: std::time::Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            if *shutdown.borrow() {
                break;
            }

            match TcpStream::connect((device.host.as_str(), device.port)).await {
                Ok(stream) => {
                    tracing::info!(device = %device, "connected to collar");
                    Self::read_stream(&device, stream, &log, &mut shutdown).await;
                    tracing::info!(device = %device, "connection closed");
                }
                Err(err) => {
                    tracing::warn!(device = %device, error = %err, "connection failed");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(retry) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::debug!(device = %device, "collector loop finished");
    }

    /// Read payload lines from one live connection until EOF, error, or
    /// shutdown
    async fn read_stream(
        device: &DeviceEndpoint,
        stream: TcpStream,
        log: &StatusLog,
        shutdown: &mut watch::Receiver<bool>,
    ) {
        let mut lines = BufReader::new(stream).lines();

        loop {
            tokio::select! {
                next = lines.next_line() => match next {
                    Ok(Some(payload)) => {
                        if payload.trim().is_empty() {
                            continue;
                        }
                        let entry = format_entry(device.port, &payload);
                        match log.append_line(&entry).await {
                            Ok(()) => metrics::record_ingest(&device.device_label()),
                            Err(err) => {
                                tracing::error!(device = %device, error = %err, "append failed, payload dropped");
                            }
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        tracing::warn!(device = %device, error = %err, "read failed");
                        break;
                    }
                },
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }
}

#[async_trait]
impl Collector for DeviceCollector {
    fn name(&self) -> &'static str {
        "tcp-collector"
    }

    async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<()> {
        let retry = self.config.retry_interval();
        let handles: Vec<_> = self
            .config
            .devices
            .iter()
            .cloned()
            .map(|device| {
                tokio::spawn(Self::collect_device(
                    device,
                    self.log.clone(),
                    retry,
                    shutdown.clone(),
                ))
            })
            .collect();

        for result in futures::future::join_all(handles).await {
            // A panicked device task is a bug worth surfacing, not hiding
            if let Err(err) = result {
                tracing::error!(error = %err, "device collector task failed");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_payloads_are_appended_as_piped_lines() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Fake collar: accept one connection, push two payloads, hang up
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            stream
                .write_all(b"00:03:01, Cat state: Wander Time\n0:30, Cat state: Moonwalk Time\n")
                .await
                .unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(StatusLog::new(dir.path().join("status.log")));
        let config = IngestConfig {
            devices: vec![DeviceEndpoint {
                host: addr.ip().to_string(),
                // Unknown port on purpose; ingest must not care
                port: addr.port(),
            }],
            retry_secs: 60,
            ..Default::default()
        };

        let collector = DeviceCollector::new(config, log.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let runner = tokio::spawn(async move { collector.run(shutdown_rx).await });

        // Give the collector time to connect and drain the payloads
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        shutdown_tx.send(true).unwrap();
        runner.await.unwrap().unwrap();

        let text = log.snapshot().await.unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(&format!("Port {} | ID ", addr.port())));
        assert!(lines[0].ends_with("Message: 00:03:01, Cat state: Wander Time"));
    }
}

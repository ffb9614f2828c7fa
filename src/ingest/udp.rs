//! UDP listener sink
//!
//! Some collars push datagrams instead of holding a TCP connection. One
//! socket receives them all; each datagram is trimmed and appended as a
//! piped-format line attributed to the bound port's device.

use async_trait::async_trait;
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::watch;

use super::{format_entry, Collector, IngestConfig};
use crate::devices::CatDevice;
use crate::error::{Error, Result};
use crate::metrics;
use crate::store::StatusLog;

const MAX_DATAGRAM: usize = 2048;

/// Datagram-to-log sink bound to one UDP port
pub struct UdpListener {
    socket: UdpSocket,
    log: Arc<StatusLog>,
    port: u16,
    device_label: String,
}

impl UdpListener {
    /// Bind the listener socket per the ingest config
    pub async fn bind(config: &IngestConfig, log: Arc<StatusLog>) -> Result<Self> {
        let socket = UdpSocket::bind(&config.udp_bind)
            .await
            .map_err(|e| Error::with_source(format!("UDP bind {} failed", config.udp_bind), e))?;

        let port = socket
            .local_addr()
            .map_err(|e| Error::with_source("UDP local_addr failed", e))?
            .port();
        let device_label = CatDevice::from_port(port)
            .map(|d| d.id().to_string())
            .unwrap_or_else(|| port.to_string());

        Ok(Self {
            socket,
            log,
            port,
            device_label,
        })
    }

    /// Address the socket actually bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket
            .local_addr()
            .map_err(|e| Error::with_source("UDP local_addr failed", e))
    }
}

#[async_trait]
impl Collector for UdpListener {
    fn name(&self) -> &'static str {
        "udp-listener"
    }

    async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        tracing::info!(port = self.port, "UDP listener started");

        let mut buf = BytesMut::zeroed(MAX_DATAGRAM);
        loop {
            tokio::select! {
                received = self.socket.recv_from(&mut buf) => {
                    let (len, peer) = match received {
                        Ok(ok) => ok,
                        Err(err) => {
                            tracing::warn!(error = %err, "UDP receive failed");
                            continue;
                        }
                    };

                    let payload = String::from_utf8_lossy(&buf[..len]);
                    let payload = payload.trim();
                    if payload.is_empty() {
                        continue;
                    }

                    tracing::debug!(peer = %peer, payload = %payload, "datagram received");
                    let entry = format_entry(self.port, payload);
                    match self.log.append_line(&entry).await {
                        Ok(()) => metrics::record_ingest(&self.device_label),
                        Err(err) => {
                            tracing::error!(error = %err, "append failed, datagram dropped");
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("UDP listener stopped");
        Ok(())
    }
}

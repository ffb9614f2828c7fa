use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::watch;

use whisker::config::Config;
use whisker::hub::{HubConfig, HubServer};
use whisker::ingest::{Collector, DeviceCollector, UdpListener};
use whisker::publish::Publisher;
use whisker::store::StatusLog;

/// Run the full hub: ingest sinks, publisher loop, and HTTP/WS server
pub async fn serve(config: Config) -> Result<()> {
    if let Err(e) = whisker::metrics::init_metrics() {
        tracing::warn!(error = %e, "metrics initialization failed, continuing without metrics");
    }

    let log = Arc::new(StatusLog::new(config.log.path.clone()));
    let publisher = Arc::new(
        Publisher::new(log.clone(), config.publisher.clone())
            .context("Failed to create publisher")?,
    );

    println!("Whisker telemetry hub");
    println!("=====================");
    println!("  Status log: {}", config.log.path.display());
    println!("  Broadcast tick: {}s", config.publisher.tick_secs);
    println!("  Listening on: http://{}", config.hub.bind_address);

    // Publisher loop
    let publisher_task = {
        let publisher = publisher.clone();
        tokio::spawn(async move { publisher.start().await })
    };

    // Ingest sinks
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut ingest_tasks = Vec::new();

    if config.ingest.enable_tcp {
        tracing::info!(devices = config.ingest.devices.len(), "starting TCP collector");
        let collector = DeviceCollector::new(config.ingest.clone(), log.clone());
        let rx = shutdown_rx.clone();
        ingest_tasks.push(tokio::spawn(async move { collector.run(rx).await }));
    }

    if config.ingest.enable_udp {
        let listener = UdpListener::bind(&config.ingest, log.clone())
            .await
            .context("Failed to bind UDP listener")?;
        let rx = shutdown_rx.clone();
        ingest_tasks.push(tokio::spawn(async move { listener.run(rx).await }));
    }

    // Hub server runs until ctrl-c
    let hub_config: HubConfig = config.hub.clone();
    let server = HubServer::new(hub_config, log, publisher.clone())
        .context("Failed to create hub server")?;

    server
        .start_with_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await
        .context("Hub server failed")?;

    // Wind down the background tasks
    publisher.stop().await;
    let _ = shutdown_tx.send(true);

    publisher_task.await.ok();
    for task in ingest_tasks {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(error = %err, "ingest task ended with error"),
            Err(err) => tracing::warn!(error = %err, "ingest task panicked"),
        }
    }

    println!("Shutdown complete.");
    Ok(())
}

use anyhow::{Context, Result};
use std::sync::Arc;

use whisker::aggregate::leader::select_leader;
use whisker::aggregate::Aggregator;
use whisker::config::Config;
use whisker::store::StatusLog;

/// One-shot leader computation, printing the bare device id
pub async fn leader(config: Config) -> Result<()> {
    let log = Arc::new(StatusLog::new(config.log.path.clone()));
    let text = log
        .snapshot()
        .await
        .with_context(|| format!("Failed to read status log {}", config.log.path.display()))?;

    let (table, report) = Aggregator::new().scan(&text);
    if report.failed() > 0 {
        tracing::warn!(failures = report.failed(), "scan skipped unparsable lines");
    }

    match select_leader(&table) {
        Some(device) => println!("{}", device.id()),
        None => anyhow::bail!("No known devices in the aggregate table"),
    }

    Ok(())
}

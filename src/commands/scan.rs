use anyhow::{Context, Result};
use std::sync::Arc;

use whisker::aggregate::leader::LeaderBoard;
use whisker::aggregate::Aggregator;
use whisker::config::Config;
use whisker::store::StatusLog;

/// One-shot scan of the status log, printed as a table or as JSON
pub async fn scan(config: Config, json: bool) -> Result<()> {
    let log = Arc::new(StatusLog::new(config.log.path.clone()));
    let text = log
        .snapshot()
        .await
        .with_context(|| format!("Failed to read status log {}", config.log.path.display()))?;

    let aggregator = Aggregator::new();
    let (table, report) = aggregator.scan(&text);
    let board = LeaderBoard::from_table(&table);

    if json {
        let output = serde_json::json!({
            "table": table,
            "report": report,
            "leader": board,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Status log scan");
    println!("{:-<40}", "");
    println!("Lines: {} ({} blank)", report.lines, report.blank);
    println!("Records: {}", report.records);
    println!("Failures: {}", report.failed());
    if report.failed() > 0 {
        let f = report.failures;
        println!(
            "  unknown port {}, bad duration {}, unknown format {}, missing field {}",
            f.unknown_port, f.bad_duration, f.unknown_format, f.missing_field
        );
    }
    println!();

    for (device, states) in &table {
        let score = board.scores.get(device).copied().unwrap_or(0);
        println!("Device {device} (score {score})");
        if states.is_empty() {
            println!("  (no records)");
        }
        for (state, secs) in states {
            let label = if state.is_empty() { "(unlabeled)" } else { state };
            println!("  {label:<20} {secs:>8}s");
        }
    }

    println!();
    match board.leader {
        Some(leader) => println!("Leader: {leader}"),
        None => println!("Leader: none"),
    }

    Ok(())
}

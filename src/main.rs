use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use whisker::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "whisker",
    version,
    about = "Cat collar telemetry hub: status log aggregation with live leader tracking",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the hub: ingest sinks, publisher, and HTTP/WebSocket server
    Serve {
        /// Override the server bind address
        #[arg(short, long)]
        bind: Option<String>,

        /// Override the status log path
        #[arg(short, long)]
        log_file: Option<PathBuf>,
    },

    /// Scan the status log once and print the aggregate
    Scan {
        /// Output as JSON instead of a table
        #[arg(long, default_value = "false")]
        json: bool,

        /// Override the status log path
        #[arg(short, long)]
        log_file: Option<PathBuf>,
    },

    /// Print the current leader device id
    Leader {
        /// Override the status log path
        #[arg(short, long)]
        log_file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { bind, log_file } => {
            if let Some(bind) = bind {
                config.hub.bind_address = bind
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Invalid bind address: {bind}"))?;
            }
            if let Some(path) = log_file {
                config.log.path = path;
            }
            tracing::info!(
                bind = %config.hub.bind_address,
                log = %config.log.path.display(),
                "Starting serve command"
            );
            commands::serve(config).await?;
        }

        Commands::Scan { json, log_file } => {
            if let Some(path) = log_file {
                config.log.path = path;
            }
            tracing::info!(log = %config.log.path.display(), "Starting scan command");
            commands::scan(config, json).await?;
        }

        Commands::Leader { log_file } => {
            if let Some(path) = log_file {
                config.log.path = path;
            }
            commands::leader(config).await?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("whisker=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("whisker=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

//! logship command line shipper
//!
//! Sends each positional message, or each line read from stdin, to the
//! configured collection endpoint and exits once everything is flushed.

use clap::Parser;
use logship::client::LogClient;
use logship::config::ClientConfig;
use logship::types::LogLevel;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "logship")]
#[command(about = "Ship log lines to a collection endpoint in batches")]
#[command(version)]
struct Args {
    /// Configuration file path (TOML); LOGSHIP_* environment variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API key
    #[arg(long)]
    api_key: Option<String>,

    /// API secret
    #[arg(long)]
    api_secret: Option<String>,

    /// Collection endpoint URL
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Service name stamped on every entry
    #[arg(short, long)]
    service: Option<String>,

    /// Level for every shipped entry
    #[arg(short, long, default_value = "info")]
    level: LogLevel,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Messages to ship; stdin lines are used when none are given
    messages: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize tracing; stdout is left alone for piped input
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(if args.verbose {
            "logship=debug,info"
        } else {
            "logship=warn,error"
        })
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting logship v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration, then override with CLI arguments
    let mut config = match ClientConfig::resolve(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Some(api_key) = args.api_key {
        config.api_key = api_key;
    }
    if let Some(api_secret) = args.api_secret {
        config.api_secret = api_secret;
    }
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(service) = args.service {
        config.service = service;
    }

    config.validate()?;

    info!("Endpoint: {}", config.endpoint);
    info!("Service: {}", config.service);
    info!("Workers: {}, batch size: {}", config.worker_count, config.batch_size);

    let client = LogClient::with_config(config)?;

    if args.messages.is_empty() {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if !line.trim().is_empty() {
                client.log(args.level, &line);
            }
        }
    } else {
        for message in &args.messages {
            client.log(args.level, message);
        }
    }

    let report = client.close().await;
    let stats = client.stats();

    info!(
        delivered = stats.delivered_entries,
        dropped = stats.dropped,
        lost = stats.lost_entries,
        abandoned_workers = report.abandoned,
        "logship finished"
    );

    if stats.lost_entries > 0 || stats.dropped > 0 || report.abandoned > 0 {
        error!(
            "{} entries were not delivered",
            stats.lost_entries + stats.dropped
        );
        std::process::exit(1);
    }

    Ok(())
}

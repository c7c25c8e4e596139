//! matchlog server - records Dota 2 GSI snapshots into per-match files.

use anyhow::Result;
use clap::Parser;
use matchlog_server::{app, config, logging, state};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use config::Config;
use logging::{LogConfig, LogFormat};
use state::AppState;

/// matchlog server - Dota 2 Game State Integration recorder.
#[derive(Parser, Debug)]
#[command(name = "matchlog-server")]
#[command(about = "HTTP receiver that records Dota 2 GSI snapshots per match")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override port from config
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the directory match files are written to
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Disable roster lookups against OpenDota
    #[arg(long)]
    no_lookup: bool,

    /// Enable verbose logging (INFO level for all targets)
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging (TRACE level for everything)
    #[arg(long)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "store=debug" or "lifecycle=trace").
    /// Can be specified multiple times. Targets are prefixed with "matchlog::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides,
        cli.log_format,
    );
    logging::init(&log_config);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }
    if cli.no_lookup {
        config.lookup.enabled = false;
    }

    tracing::info!(
        target: "matchlog::startup",
        "Loaded configuration (port: {}, output: {}, lookup: {})",
        config.port,
        config.output_dir.display(),
        config.lookup.enabled
    );

    std::fs::create_dir_all(&config.output_dir)?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = Arc::new(AppState::new(config)?);
    let app = app(state);

    tracing::info!(target: "matchlog::startup", "Starting server on {}", addr);
    tracing::info!(target: "matchlog::startup", "Waiting for data from Dota 2...");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

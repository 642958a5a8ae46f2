//! Hookscope Server
//!
//! Run with: cargo run --bin hookscope
//!
//! # Configuration
//!
//! Read from `--config`, or the first of
//! `~/.config/hookscope/config.toml`, `/etc/hookscope/config.toml`,
//! `./config.toml`. Environment variables override file values:
//! - `HOOKSCOPE_HOST`, `HOOKSCOPE_PORT`
//! - `HOOKSCOPE_DEBOUNCE_MS`
//! - `HOOKSCOPE_LOG_LEVEL`, `HOOKSCOPE_LOG_FORMAT`
//! - `RUST_LOG`: takes precedence over the configured level

use anyhow::Context;
use clap::Parser;
use hookscope::api::{serve, AppState};
use hookscope::config::{Config, LoggingConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "hookscope")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Capture, index and search incoming webhooks")]
struct Args {
    /// Config file (default: search the standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load_default(),
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_tracing(&config.logging);

    tracing::info!("Starting Hookscope v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        jsonpath_cache = config.search.jsonpath_cache_capacity,
        result_cache = config.search.result_cache_capacity,
        debounce_ms = config.search.debounce_ms,
        "Search engine configured"
    );

    serve(AppState::new(config)).await?;
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("hookscope={},tower_http=debug", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    }
}

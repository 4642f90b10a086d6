//! cardinality-exporter - the exporter daemon.
//!
//! Assembles the exporter:
//! - Metric state (four gauge collections)
//! - Prober + hourly scheduler
//! - Scrape endpoint + root page
//!
//! # Usage
//!
//! ```text
//! cardinality-exporter --upstream-url http://prometheus:9090 --interval 1h
//! ```

mod config;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cardinality_metrics::MetricState;
use cardinality_probe::scheduler;
use cardinality_probe::{IntervalTicker, Prober};

use crate::config::{Cli, ExporterConfig, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ExporterConfig::resolve(cli)?;

    init_tracing(config.log_format);

    run(config).await
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(config: ExporterConfig) -> anyhow::Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "cardinality exporter starting");
    info!(
        upstream = %config.upstream_url,
        interval = ?config.interval,
        timeout = ?config.timeout,
        metrics_path = %config.metrics_path,
        "configuration loaded"
    );

    // ── Initialize subsystems ──────────────────────────────────

    let metrics = MetricState::new()?;
    let prober = Prober::new(&config.upstream_url, config.timeout);

    // Initial probe, before the first scrape can be served. A failure is
    // logged and the exporter starts anyway.
    let _ = scheduler::run_once(&prober, &metrics).await;

    // ── Start background tasks ─────────────────────────────────

    let probe_handle = scheduler::spawn(
        prober,
        metrics.clone(),
        IntervalTicker::new(config.interval),
    );

    // ── Start scrape server ────────────────────────────────────

    let router = cardinality_api::build_router(metrics, &config.metrics_path);
    let listener = tokio::net::TcpListener::bind(config.listen_address.as_str()).await?;

    info!(address = %listener.local_addr()?, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    probe_handle.abort();
    info!("cardinality exporter stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            error!(error = %e, "failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    }
}

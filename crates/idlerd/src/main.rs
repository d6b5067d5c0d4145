//! idlerd — scales idle serverless functions to zero.
//!
//! Reads its configuration from the environment, loads gateway credentials
//! from a secrets directory, then reconciles on a fixed interval until
//! interrupted.
//!
//! # Usage
//!
//! ```text
//! gateway_url=http://gateway:8080/ prometheus_host=prometheus idlerd
//! idlerd --dry-run --once --secrets-dir ./secrets
//! ```

mod secrets;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use idler_core::{HttpClient, IdlerConfig};
use idler_gateway::GatewayClient;
use idler_query::{MetricsAggregator, QueryClient};
use idler_reconcile::Reconciler;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "idlerd", version, about = "Scale idle functions to zero")]
struct Cli {
    /// Log scale decisions without sending them (overrides `dry_run=false`).
    #[arg(long)]
    dry_run: bool,

    /// Run a single reconcile cycle and exit.
    #[arg(long)]
    once: bool,

    /// Directory holding `basic-auth-user` and `basic-auth-password`.
    #[arg(long, default_value = "/run/secrets")]
    secrets_dir: PathBuf,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

const DEFAULT_LOG_FILTER: &str = "info,idlerd=debug,idler=debug";

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let mut config = IdlerConfig::from_env().context("invalid configuration")?;
    config.dry_run |= cli.dry_run;

    let credentials = secrets::load_credentials(&cli.secrets_dir);

    info!(
        gateway_url = %config.gateway_url,
        prometheus = %config.prometheus_url(),
        inactivity = ?config.inactivity_duration,
        window = %config.lookback_window(),
        interval = ?config.reconcile_interval,
        dry_run = config.dry_run,
        query_concurrency = config.query_concurrency,
        http_timeout = ?config.http_timeout,
        username = %credentials.username,
        "idlerd starting"
    );
    if config.dry_run {
        warn!("dry run enabled, no functions will be scaled");
    }

    let http = HttpClient::new().with_timeout(config.http_timeout);
    let gateway = GatewayClient::new(config.gateway_url.clone(), Arc::new(credentials), http.clone())
        .with_dry_run(config.dry_run);
    let query = QueryClient::new(&config.prometheus_host, config.prometheus_port, http);
    let aggregator = MetricsAggregator::new(query, config.lookback_window())
        .with_concurrency(config.query_concurrency);
    let reconciler = Reconciler::new(gateway, aggregator);

    if cli.once {
        let report = reconciler
            .reconcile_once()
            .await
            .context("reconcile cycle failed")?;
        info!(
            functions = report.states.len(),
            idle = report.idle_count(),
            scaled = ?report.scaled_names(),
            "single cycle complete"
        );
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    reconciler.run(config.reconcile_interval, shutdown_rx).await;

    info!("idlerd stopped");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "cannot install SIGTERM handler, waiting for ctrl-c only");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

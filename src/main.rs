use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ratekeeper::clock::SystemClock;
use ratekeeper::config::ServiceConfig;
use ratekeeper::ratelimit::{Algorithm, RateLimiter};
use ratekeeper::store::{MemoryStore, Store};

/// Replay a burst of requests from one client through the rate limiter.
#[derive(Debug, Parser)]
#[command(name = "ratekeeper", version, about)]
struct Cli {
    /// Configuration file (YAML, TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Client identity to check
    #[arg(long, default_value = "127.0.0.1")]
    client: String,

    /// Algorithm name; defaults to the configured default algorithm
    #[arg(short, long)]
    algorithm: Option<String>,

    /// Number of requests to send
    #[arg(short = 'n', long, default_value_t = 15)]
    requests: u32,

    /// Pause between requests in milliseconds
    #[arg(long, default_value_t = 100)]
    interval_ms: u64,

    /// Force JSON log output
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ServiceConfig::from_file(path)?,
        None => ServiceConfig::default(),
    };

    init_tracing(&config.logging.level, cli.log_json || config.logging.json);

    info!("Starting Ratekeeper");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!(
        limit = config.rate_limiting.limit,
        window_secs = config.rate_limiting.window_secs,
        failure_policy = ?config.rate_limiting.failure_policy,
        "Configuration loaded"
    );

    let clock = Arc::new(SystemClock);
    let store = Arc::new(MemoryStore::with_clock(clock.clone()));
    store.ping().await?;

    let limiter = Arc::new(RateLimiter::from_config(&config, store, clock)?);
    info!("Rate limiter initialized");

    let worker = config
        .leak_worker
        .enabled
        .then(|| limiter.spawn_leak_worker());

    let algorithm = match &cli.algorithm {
        Some(name) => Algorithm::from_name(name),
        None => config.rate_limiting.default_algorithm,
    };

    tokio::select! {
        _ = simulate(&limiter, &cli, algorithm) => {}
        _ = shutdown_signal() => {}
    }

    let metrics = limiter.metrics().await?;
    println!("{}", serde_json::to_string_pretty(&metrics)?);

    if let Some(worker) = worker {
        worker.shutdown().await?;
    }
    limiter.shutdown().await?;

    info!("Ratekeeper stopped");
    Ok(())
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(true)
            .init();
    }
}

/// Send the requested burst, printing one line per decision.
async fn simulate(limiter: &RateLimiter, cli: &Cli, algorithm: Algorithm) {
    let effective = limiter.effective_config().await;
    info!(
        client = %cli.client,
        algorithm = %algorithm,
        limit = effective.limit,
        window = ?effective.window,
        "Replaying {} requests",
        cli.requests
    );

    for i in 1..=cli.requests {
        let decision = limiter.check(&cli.client, algorithm).await;
        match decision.reason() {
            None => println!("request {:>3}: allowed", i),
            Some(reason) => println!("request {:>3}: rejected ({})", i, reason),
        }
        tokio::time::sleep(Duration::from_millis(cli.interval_ms)).await;
    }
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping");
        }
        _ = terminate => {
            info!("Received SIGTERM, stopping");
        }
    }
}

use std::sync::Arc;

use anyhow::Context;
use holdings_aggregator::{
    Aggregator, AggregatorConfig, ChannelTradeSource, IngestSource, LinesTradeSource, LogFormat,
    SqliteHoldingsStore,
};
use holdings_clock::SystemClock;
use holdings_generator::TradeEmitter;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_help() {
    eprintln!(
        r#"Holdings Aggregator - trade ingestion and cached holdings API

USAGE:
    holdings-aggregator [OPTIONS]

OPTIONS:
    --config <PATH>     Load configuration from JSON file
    --help              Print this help message

ENVIRONMENT VARIABLES:
    HOST                      Server host (default: 0.0.0.0)
    PORT                      Server port (default: 8080)
    DATABASE_URL              SQLite URL (default: sqlite://holdings.db)
    CORS_ORIGIN               Allowed origin or * (default: *)
    INGEST_SOURCE             stdin | simulate | none (default: stdin)
    TRADES_PER_SEC            Simulated trades per second, 1-50 (default: 1)
    GENERATOR_SEED            Seed for the simulated stream
    INGEST_CHANNEL_CAPACITY   Simulated transport buffer (default: 1024)
    STORE_TIMEOUT_MS          Per-operation store timeout, 0 = none (default: 5000)
    LOG_FORMAT                text | json (default: text)
    RUST_LOG                  Log level filter

EXAMPLES:
    # Serve with an in-process trade simulator
    INGEST_SOURCE=simulate holdings-aggregator

    # Ingest newline-delimited JSON trades from another process
    trade-generator | holdings-aggregator

    # Run with config file
    holdings-aggregator --config config.json
"#
    );
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "holdings_aggregator=info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// Cancel `token` on SIGINT or SIGTERM
async fn watch_signals(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("shutdown signal received");
    token.cancel();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--config" | "-c" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
                config_path = Some(args[i].clone());
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config = match &config_path {
        Some(path) => AggregatorConfig::from_file(path)
            .with_context(|| format!("loading configuration from {path}"))?,
        None => AggregatorConfig::from_env().context("reading configuration from environment")?,
    };

    init_tracing(config.log_format);
    match &config_path {
        Some(path) => tracing::info!("Loaded configuration from: {}", path),
        None => tracing::info!("Using environment configuration"),
    }

    let store = SqliteHoldingsStore::connect(&config.database_url)
        .await
        .context("connecting to database")?;
    store.migrate().await.context("running migrations")?;

    let aggregator = Aggregator::new(
        config.clone(),
        Arc::new(store.clone()),
        Arc::new(SystemClock::new()),
    );
    let shutdown = aggregator.shutdown_token();
    tokio::spawn(watch_signals(shutdown.clone()));

    let ingestion = match config.ingest.source {
        IngestSource::Stdin => {
            tracing::info!("Ingesting newline-delimited JSON trades from stdin");
            Some(aggregator.spawn_ingestion(LinesTradeSource::stdin()))
        }
        IngestSource::Simulate => {
            let emitter = TradeEmitter::new(config.ingest.trades_per_sec)?;
            let rng = match config.ingest.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let (tx, source) = ChannelTradeSource::pair(config.ingest.channel_capacity);

            tracing::info!(
                trades_per_sec = config.ingest.trades_per_sec,
                "Ingesting simulated trades"
            );
            tokio::spawn(emitter.run(rng, Arc::new(SystemClock::new()), tx, shutdown.clone()));
            Some(aggregator.spawn_ingestion(source))
        }
        IngestSource::None => {
            tracing::info!("Ingestion disabled; serving reads only");
            None
        }
    };

    tracing::info!("Starting Holdings Aggregator");
    tracing::info!("Available endpoints:");
    tracing::info!("  GET  /health");
    tracing::info!("  GET  /api/holdings");
    tracing::info!("  GET  /api/holdings/{{entity}}");
    tracing::info!("  GET  /api/trades?limit=100&entity=all");

    let served = aggregator.serve().await;
    shutdown.cancel();

    if let Some(handle) = ingestion {
        match handle.await.context("ingestion task panicked")? {
            Ok(summary) => tracing::info!(
                received = summary.received,
                applied = summary.applied,
                skipped = summary.skipped(),
                "Ingestion finished"
            ),
            Err(err) => tracing::error!(error = %err, "Ingestion ended with transport error"),
        }
    }

    let stats = aggregator.cache_stats();
    tracing::info!(
        hits = stats.hits,
        misses = stats.misses,
        invalidations = stats.invalidations,
        "Cache statistics"
    );

    store.close().await;
    served.context("HTTP server failed")?;
    Ok(())
}

use std::sync::Arc;

use anyhow::Context;
use holdings_clock::SystemClock;
use holdings_generator::{ProducerConfig, TradeEmitter};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_help() {
    eprintln!(
        r#"Trade Generator - synthetic trades as newline-delimited JSON on stdout

USAGE:
    trade-generator [--help]

ENVIRONMENT VARIABLES:
    TRADES_PER_SEC        Trades per second, 1-50 (default: 1)
    PRODUCER_TTL          How long to emit, e.g. 90s, 2m (default: 2m)
    PRODUCER_STAY_ALIVE   Keep running after the TTL (default: false)
    GENERATOR_SEED        Seed for a reproducible stream
    RUST_LOG              Log level filter (logs go to stderr)

EXAMPLES:
    # Feed a local aggregator
    trade-generator | INGEST_SOURCE=stdin holdings-aggregator
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs on stderr; stdout carries the trades
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "holdings_generator=info,trade_generator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(arg) = std::env::args().nth(1) {
        if arg == "--help" || arg == "-h" {
            print_help();
            return Ok(());
        }
        eprintln!("Unknown argument: {}", arg);
        print_help();
        std::process::exit(1);
    }

    let config = ProducerConfig::from_env();
    tracing::info!(
        trades_per_sec = config.trades_per_sec,
        ttl_secs = config.ttl.as_secs(),
        stay_alive = config.stay_alive,
        "starting trade generator"
    );

    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let emitter = TradeEmitter::new(config.trades_per_sec)?;
    let shutdown = CancellationToken::new();
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(64);

    let emitting = tokio::spawn(emitter.run(
        rng,
        Arc::new(SystemClock::new()),
        tx,
        shutdown.clone(),
    ));

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(mut line) = rx.recv().await {
            line.push(b'\n');
            stdout.write_all(&line).await?;
            stdout.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    tokio::select! {
        _ = tokio::time::sleep(config.ttl) => tracing::info!("producer TTL reached"),
        _ = tokio::signal::ctrl_c() => tracing::info!("interrupted"),
    }
    shutdown.cancel();

    let summary = emitting.await.context("emitter task panicked")?;
    writer
        .await
        .context("writer task panicked")?
        .context("failed writing to stdout")?;
    tracing::info!(sent = summary.sent, "trade generator finished");

    if config.stay_alive {
        tracing::info!("staying alive until interrupted");
        tokio::signal::ctrl_c().await?;
    }

    Ok(())
}

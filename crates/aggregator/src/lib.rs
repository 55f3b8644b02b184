//! Holdings Aggregator
//!
//! Ingests trade events, folds them into per-entity, per-instrument running
//! totals, and serves trades and holdings through a cached read API.
//!
//! # Architecture
//!
//! - **Application**: the aggregation service, its query cache and the
//!   ingestion loop
//! - **Infrastructure**: store adapters (SQLite, in-memory), transports
//!   (channel, newline-delimited JSON), configuration
//! - **Presentation**: REST read API
//!
//! Domain types live in `holdings-core`, port traits in `holdings-ports`.
//!
//! # Example
//!
//! ```ignore
//! use holdings_aggregator::{Aggregator, AggregatorConfig, InMemoryHoldingsStore};
//! use holdings_clock::SystemClock;
//!
//! #[tokio::main]
//! async fn main() {
//!     let aggregator = Aggregator::new(
//!         AggregatorConfig::default(),
//!         Arc::new(InMemoryHoldingsStore::new()),
//!         Arc::new(SystemClock::new()),
//!     );
//!     aggregator.serve().await.unwrap();
//! }
//! ```

pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use application::{
    AggregationError, AggregationService, CacheStats, Disposition, HoldingsKey, IngestionLoop,
    IngestionSnapshot, IngestionStats, QueryCache, TradesKey,
};
pub use infrastructure::{
    AggregatorConfig, ChannelTradeSource, ConfigError, InMemoryHoldingsStore, IngestSource,
    LinesTradeSource, LogFormat, SqliteHoldingsStore,
};
pub use presentation::{ApiError, AppState, create_router};

use axum::Router;
use holdings_ports::{Clock, HoldingsStore, TradeSource, TransportError};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Wires the service, cache, ingestion and read API together
pub struct Aggregator<S, C>
where
    S: HoldingsStore + 'static,
    C: Clock + 'static,
{
    pub config: AggregatorConfig,
    pub service: Arc<AggregationService<S, C>>,
    shutdown: CancellationToken,
}

impl<S, C> Aggregator<S, C>
where
    S: HoldingsStore + 'static,
    C: Clock + 'static,
{
    pub fn new(config: AggregatorConfig, store: Arc<S>, clock: Arc<C>) -> Self {
        let cache = Arc::new(QueryCache::new());
        let service = Arc::new(AggregationService::new(store, clock, cache));

        Aggregator {
            config,
            service,
            shutdown: CancellationToken::new(),
        }
    }

    /// Cancelling this token stops ingestion and the HTTP server
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Create the REST API router
    pub fn router(&self) -> Router {
        let state = Arc::new(AppState::new(
            Arc::clone(&self.service),
            self.shutdown.clone(),
            self.config.store_timeout(),
        ));

        create_router(state, &self.config.server.cors_origin)
    }

    /// Start consuming `source` on a background task
    pub fn spawn_ingestion<T>(
        &self,
        source: T,
    ) -> JoinHandle<Result<IngestionSnapshot, TransportError>>
    where
        T: TradeSource + 'static,
    {
        let ingestion = IngestionLoop::new(Arc::clone(&self.service), source)
            .with_store_timeout(self.config.store_timeout());
        tokio::spawn(ingestion.run(self.shutdown.clone()))
    }

    /// Serve the read API until the shutdown token is cancelled
    pub async fn serve(&self) -> std::io::Result<()> {
        let addr = self.config.bind_address();
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("Holdings API listening on {}", addr);

        let shutdown = self.shutdown.clone();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.service.cache().stats()
    }
}

//! Pulls raw trade payloads from a transport and applies them one by one.
//!
//! A payload that cannot be decoded, fails validation or hits a store error
//! is logged and skipped; the loop keeps consuming. A skipped event is not
//! retried and never reaches the holdings total. The loop ends when the
//! transport closes or the shutdown token is cancelled.

mod stats;

use std::sync::Arc;
use std::time::Duration;

use holdings_core::TradeEvent;
use holdings_ports::{ApplyOutcome, Clock, Deadline, HoldingsStore, TradeSource, TransportError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub use stats::{IngestionSnapshot, IngestionStats};

use super::error::AggregationError;
use super::service::AggregationService;

/// What happened to one payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Applied,
    Duplicate,
    /// Not valid JSON for a trade event
    Undecodable,
    /// Decoded but failed validation
    Rejected,
    /// Store failure or interruption
    Failed,
}

pub struct IngestionLoop<S, C, T>
where
    S: HoldingsStore,
    C: Clock,
    T: TradeSource,
{
    applier: EventApplier<S, C>,
    source: T,
}

impl<S, C, T> IngestionLoop<S, C, T>
where
    S: HoldingsStore,
    C: Clock,
    T: TradeSource,
{
    pub fn new(service: Arc<AggregationService<S, C>>, source: T) -> Self {
        Self {
            applier: EventApplier {
                service,
                store_timeout: None,
                stats: Arc::new(IngestionStats::new()),
            },
            source,
        }
    }

    /// Bound each store write by `timeout`
    pub fn with_store_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.applier.store_timeout = timeout;
        self
    }

    pub fn stats(&self) -> Arc<IngestionStats> {
        Arc::clone(&self.applier.stats)
    }

    /// Consume until the transport closes or `shutdown` fires.
    ///
    /// Only a transport I/O failure ends the loop with an error.
    pub async fn run(
        mut self,
        shutdown: CancellationToken,
    ) -> Result<IngestionSnapshot, TransportError> {
        info!(source = self.source.name(), "ingestion started");
        let deadline = Deadline::new(shutdown);

        loop {
            let payload = match self.source.next(&deadline).await {
                Ok(Some(payload)) => payload,
                Ok(None) => {
                    info!(source = self.source.name(), "transport closed");
                    break;
                }
                Err(TransportError::Interrupted(reason)) => {
                    info!(source = self.source.name(), %reason, "ingestion stopping");
                    break;
                }
                Err(err) => {
                    error!(source = self.source.name(), error = %err, "transport failed");
                    return Err(err);
                }
            };

            self.applier.process(&payload, &deadline).await;
        }

        let summary = self.applier.stats.snapshot();
        info!(
            received = summary.received,
            applied = summary.applied,
            duplicates = summary.duplicates,
            skipped = summary.skipped(),
            "ingestion stopped"
        );
        Ok(summary)
    }

    /// Decode and apply a single payload
    pub async fn process(&self, payload: &[u8], deadline: &Deadline) -> Disposition {
        self.applier.process(payload, deadline).await
    }
}

/// Per-payload half of the loop. Split from the source so the source
/// does not have to be `Sync`.
struct EventApplier<S, C>
where
    S: HoldingsStore,
    C: Clock,
{
    service: Arc<AggregationService<S, C>>,
    store_timeout: Option<Duration>,
    stats: Arc<IngestionStats>,
}

impl<S, C> EventApplier<S, C>
where
    S: HoldingsStore,
    C: Clock,
{
    async fn process(&self, payload: &[u8], deadline: &Deadline) -> Disposition {
        self.stats.record_received();

        let event: TradeEvent = match serde_json::from_slice(payload) {
            Ok(event) => event,
            Err(err) => {
                self.stats.record_decode_failure();
                warn!(error = %err, bytes = payload.len(), "bad trade message, skipping");
                return Disposition::Undecodable;
            }
        };

        let trade_id = event.trade_id.clone();
        let op_deadline = match self.store_timeout {
            Some(timeout) => deadline.with_timeout(timeout),
            None => deadline.clone(),
        };

        match self.service.apply_trade(event, &op_deadline).await {
            Ok(ApplyOutcome::Applied) => {
                self.stats.record_applied();
                Disposition::Applied
            }
            Ok(ApplyOutcome::Duplicate) => {
                self.stats.record_duplicate();
                debug!(%trade_id, "redelivered trade");
                Disposition::Duplicate
            }
            Err(AggregationError::Validation(err)) => {
                self.stats.record_rejected();
                warn!(%trade_id, error = %err, "invalid trade, skipping");
                Disposition::Rejected
            }
            Err(err) => {
                self.stats.record_failed();
                error!(%trade_id, error = %err, "apply trade failed, skipping");
                Disposition::Failed
            }
        }
    }
}

use std::sync::Arc;
use std::time::Duration;

use holdings_ports::Clock;
use rand::Rng;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::universe::generate;

pub const MIN_TRADES_PER_SEC: u32 = 1;
pub const MAX_TRADES_PER_SEC: u32 = 50;

/// Upper bound of the random delay added to each send
const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(150);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitterError {
    #[error("trades per second must be between 1 and 50, got {0}")]
    InvalidRate(u32),
}

/// Why the emitter stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Shutdown,
    /// The receiving side hung up
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitterSummary {
    pub sent: u64,
    pub reason: StopReason,
}

/// Sends JSON-encoded trades at a fixed rate with a little jitter
#[derive(Debug, Clone)]
pub struct TradeEmitter {
    trades_per_sec: u32,
    max_jitter: Duration,
}

impl TradeEmitter {
    pub fn new(trades_per_sec: u32) -> Result<Self, EmitterError> {
        if !(MIN_TRADES_PER_SEC..=MAX_TRADES_PER_SEC).contains(&trades_per_sec) {
            return Err(EmitterError::InvalidRate(trades_per_sec));
        }
        Ok(Self {
            trades_per_sec,
            max_jitter: DEFAULT_MAX_JITTER,
        })
    }

    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    pub fn period(&self) -> Duration {
        Duration::from_secs(1) / self.trades_per_sec
    }

    /// Emit until `shutdown` fires or the receiver is dropped
    pub async fn run<R, C>(
        self,
        mut rng: R,
        clock: Arc<C>,
        tx: mpsc::Sender<Vec<u8>>,
        shutdown: CancellationToken,
    ) -> EmitterSummary
    where
        R: Rng + Send,
        C: Clock + ?Sized,
    {
        let mut ticker = interval(self.period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let max_jitter_ms = self.max_jitter.as_millis() as u64;
        let mut sent = 0u64;

        info!(trades_per_sec = self.trades_per_sec, "trade emitter started");

        let reason = loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break StopReason::Shutdown,
                _ = ticker.tick() => {}
            }

            if max_jitter_ms > 0 {
                let jitter = Duration::from_millis(rng.gen_range(0..max_jitter_ms));
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break StopReason::Shutdown,
                    _ = tokio::time::sleep(jitter) => {}
                }
            }

            let event = generate(&mut rng, clock.now());
            let payload = match serde_json::to_vec(&event) {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(error = %err, "failed to encode trade, skipping");
                    continue;
                }
            };

            if tx.send(payload).await.is_err() {
                break StopReason::Disconnected;
            }
            sent += 1;
            debug!(
                trade_id = %event.trade_id,
                entity = %event.entity,
                symbol = %event.symbol,
                quantity = %event.quantity,
                "trade emitted"
            );
        };

        info!(sent, ?reason, "trade emitter stopped");
        EmitterSummary { sent, reason }
    }
}

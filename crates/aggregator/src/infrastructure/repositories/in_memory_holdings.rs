use async_trait::async_trait;
use dashmap::DashMap;
use holdings_core::{Entity, Holding, HoldingKey, Quantity, Timestamp, Trade, TradeId, TradeLimit};
use holdings_ports::{ApplyOutcome, Deadline, HoldingsStore, StoreError, StoreResult};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Trade log ordered by (event time, insertion sequence)
#[derive(Default)]
struct TradeLog {
    ids: HashSet<TradeId>,
    by_time: BTreeMap<(Timestamp, u64), Trade>,
    next_seq: u64,
}

/// In-memory holdings store
///
/// Thread-safe storage using a mutex-guarded trade log and a DashMap of
/// running totals. Suitable for simulation and testing.
pub struct InMemoryHoldingsStore {
    log: Arc<Mutex<TradeLog>>,
    holdings: Arc<DashMap<HoldingKey, Quantity>>,
}

impl InMemoryHoldingsStore {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(TradeLog::default())),
            holdings: Arc::new(DashMap::new()),
        }
    }

    pub fn trade_count(&self) -> usize {
        self.log.lock().ids.len()
    }
}

impl Default for InMemoryHoldingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for InMemoryHoldingsStore {
    fn clone(&self) -> Self {
        Self {
            log: Arc::clone(&self.log),
            holdings: Arc::clone(&self.holdings),
        }
    }
}

#[async_trait]
impl HoldingsStore for InMemoryHoldingsStore {
    async fn apply_trade(&self, trade: &Trade, deadline: &Deadline) -> StoreResult<ApplyOutcome> {
        deadline.check()?;

        // The log lock makes insert-then-add one unit
        let mut log = self.log.lock();
        if !log.ids.insert(trade.trade_id.clone()) {
            return Ok(ApplyOutcome::Duplicate);
        }
        let seq = log.next_seq;
        log.next_seq += 1;
        log.by_time.insert((trade.ts, seq), trade.clone());

        *self
            .holdings
            .entry(trade.holding_key())
            .or_insert(Decimal::ZERO) += trade.quantity;

        Ok(ApplyOutcome::Applied)
    }

    async fn get_all_holdings(&self, deadline: &Deadline) -> StoreResult<Vec<Holding>> {
        deadline.check()?;
        let mut rows: Vec<Holding> = self
            .holdings
            .iter()
            .map(|entry| Holding::new(entry.key().clone(), *entry.value()))
            .collect();
        rows.sort_by(|a, b| a.key().cmp(&b.key()));
        Ok(rows)
    }

    async fn get_holdings_by_entity(
        &self,
        entity: Entity,
        deadline: &Deadline,
    ) -> StoreResult<Vec<Holding>> {
        deadline.check()?;
        let mut rows: Vec<Holding> = self
            .holdings
            .iter()
            .filter(|entry| entry.key().entity == entity)
            .map(|entry| Holding::new(entry.key().clone(), *entry.value()))
            .collect();
        if rows.is_empty() {
            return Err(StoreError::NotFound);
        }
        rows.sort_by(|a, b| a.key().cmp(&b.key()));
        Ok(rows)
    }

    async fn get_trades(
        &self,
        limit: TradeLimit,
        entity: Option<Entity>,
        deadline: &Deadline,
    ) -> StoreResult<Vec<Trade>> {
        deadline.check()?;
        let log = self.log.lock();
        Ok(log
            .by_time
            .values()
            .rev()
            .filter(|trade| entity.is_none_or(|e| trade.entity == e))
            .take(limit.get())
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        "InMemoryHoldingsStore"
    }
}

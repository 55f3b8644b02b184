use std::sync::Arc;

use holdings_core::{EntityScope, Holding, Trade, TradeEvent, TradeLimit};
use holdings_ports::{ApplyOutcome, Clock, Deadline, HoldingsStore, StoreError};
use tracing::{debug, warn};

use super::cache::{HoldingsKey, QueryCache, TradesKey};
use super::error::AggregationError;

/// Applies trades to the store and answers holdings/trade queries through
/// the query cache.
///
/// The store write always completes before the cache is invalidated, so a
/// read issued after `apply_trade` returns never sees a result computed
/// before the trade.
pub struct AggregationService<S, C>
where
    S: HoldingsStore,
    C: Clock,
{
    store: Arc<S>,
    clock: Arc<C>,
    cache: Arc<QueryCache>,
}

impl<S, C> AggregationService<S, C>
where
    S: HoldingsStore,
    C: Clock,
{
    pub fn new(store: Arc<S>, clock: Arc<C>, cache: Arc<QueryCache>) -> Self {
        Self {
            store,
            clock,
            cache,
        }
    }

    /// Validate a wire event and apply it exactly once
    pub async fn apply_trade(
        &self,
        event: TradeEvent,
        deadline: &Deadline,
    ) -> Result<ApplyOutcome, AggregationError> {
        let trade = Trade::from_event(event, self.clock.now())?;
        self.apply(&trade, deadline).await
    }

    /// Apply an already validated trade
    pub async fn apply(
        &self,
        trade: &Trade,
        deadline: &Deadline,
    ) -> Result<ApplyOutcome, AggregationError> {
        match self.store.apply_trade(trade, deadline).await {
            Ok(ApplyOutcome::Applied) => {
                self.cache.invalidate(trade.entity);
                debug!(
                    trade_id = %trade.trade_id,
                    entity = %trade.entity,
                    symbol = %trade.symbol,
                    quantity = %trade.quantity,
                    "trade applied"
                );
                Ok(ApplyOutcome::Applied)
            }
            Ok(ApplyOutcome::Duplicate) => {
                debug!(trade_id = %trade.trade_id, "duplicate trade ignored");
                Ok(ApplyOutcome::Duplicate)
            }
            Err(err) => {
                // The commit may have landed before the failure was observed
                self.cache.invalidate(trade.entity);
                warn!(trade_id = %trade.trade_id, error = %err, "trade not applied");
                Err(err.into())
            }
        }
    }

    pub async fn get_all_holdings(
        &self,
        deadline: &Deadline,
    ) -> Result<Arc<[Holding]>, AggregationError> {
        self.get_holdings(EntityScope::All, deadline).await
    }

    /// Holdings for a scope, ordered by `(entity, instrument_type, symbol)`.
    ///
    /// An entity with no holdings yields an empty list, not an error.
    pub async fn get_holdings(
        &self,
        scope: EntityScope,
        deadline: &Deadline,
    ) -> Result<Arc<[Holding]>, AggregationError> {
        let store = &self.store;
        self.cache
            .holdings(HoldingsKey::new(scope), || async move {
                match scope {
                    EntityScope::All => store.get_all_holdings(deadline).await,
                    EntityScope::Entity(entity) => {
                        match store.get_holdings_by_entity(entity, deadline).await {
                            Err(StoreError::NotFound) => Ok(Vec::new()),
                            other => other,
                        }
                    }
                }
            })
            .await
            .map_err(AggregationError::from)
    }

    /// Most recent trades for a scope, newest first
    pub async fn get_trades(
        &self,
        limit: TradeLimit,
        scope: EntityScope,
        deadline: &Deadline,
    ) -> Result<Arc<[Trade]>, AggregationError> {
        let store = &self.store;
        self.cache
            .trades(TradesKey::new(scope, limit), || async move {
                match store.get_trades(limit, scope.entity(), deadline).await {
                    Err(StoreError::NotFound) => Ok(Vec::new()),
                    other => other,
                }
            })
            .await
            .map_err(AggregationError::from)
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

use async_trait::async_trait;
use holdings_core::{Entity, Holding, Trade, TradeLimit};

use crate::deadline::Deadline;
use crate::error::StoreResult;

/// What applying a trade did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Trade row inserted and folded into its holding
    Applied,
    /// Trade id already present; nothing changed
    Duplicate,
}

/// Port for the durable holdings store
///
/// Implementations must make `apply_trade` atomic: the trade row and the
/// holding increment are kept together or not at all, and the increment is
/// an atomic add per holding key (never load-then-store).
#[async_trait]
pub trait HoldingsStore: Send + Sync {
    /// Insert the trade if its id is new and, only then, add its quantity
    /// to the `(entity, instrument_type, symbol)` holding.
    async fn apply_trade(&self, trade: &Trade, deadline: &Deadline) -> StoreResult<ApplyOutcome>;

    /// All holdings ordered by `(entity, instrument_type, symbol)`
    async fn get_all_holdings(&self, deadline: &Deadline) -> StoreResult<Vec<Holding>>;

    /// Holdings of one entity, same ordering.
    ///
    /// Returns `StoreError::NotFound` when the entity has no rows at all.
    async fn get_holdings_by_entity(
        &self,
        entity: Entity,
        deadline: &Deadline,
    ) -> StoreResult<Vec<Holding>>;

    /// Most recent trades by event time, newest first
    async fn get_trades(
        &self,
        limit: TradeLimit,
        entity: Option<Entity>,
        deadline: &Deadline,
    ) -> StoreResult<Vec<Trade>>;

    /// Get the store's name/identifier for debugging
    fn name(&self) -> &str {
        "HoldingsStore"
    }
}

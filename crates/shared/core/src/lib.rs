//! Holdings Core Domain
//!
//! Pure domain types for the holdings aggregator: trades, holdings and the
//! closed value sets (entities, instrument types) they are keyed by.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod error;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{Holding, HoldingKey, Trade, TradeEvent, TradeId};
pub use error::ValidationError;
pub use values::{
    Entity, EntityScope, InstrumentType, Price, QUANTITY_SCALE, Quantity, Symbol, Timestamp,
    TradeLimit,
};

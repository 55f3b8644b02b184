mod holding;
mod trade;

pub use holding::{Holding, HoldingKey};
pub use trade::{Trade, TradeEvent, TradeId};

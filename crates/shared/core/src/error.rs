use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

/// Rejection of a value that does not belong to the domain
///
/// Raised at the boundary where raw strings and numbers become domain types;
/// a trade carrying any of these never reaches the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown entity '{0}' (use 'zurich' or 'new_york')")]
    UnknownEntity(String),

    #[error("'all' is a query wildcard and cannot be the entity of a trade")]
    WildcardEntity,

    #[error("unknown instrument type '{0}' (use 'stock' or 'crypto')")]
    UnknownInstrumentType(String),

    #[error("invalid symbol '{symbol}': {reason}")]
    InvalidSymbol {
        symbol: String,
        reason: &'static str,
    },

    #[error("trade id cannot be empty")]
    EmptyTradeId,

    #[error("quantity {quantity} has more than {max_scale} fractional digits")]
    QuantityPrecision { quantity: Decimal, max_scale: u32 },

    #[error("price cannot be negative: {0}")]
    NegativePrice(Decimal),

    #[error("timestamp {0} is outside the representable nanosecond range")]
    TimestampOutOfRange(DateTime<Utc>),
}

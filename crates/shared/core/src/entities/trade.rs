use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::HoldingKey;
use crate::error::ValidationError;
use crate::values::{
    Entity, InstrumentType, Price, QUANTITY_SCALE, Quantity, Symbol, Timestamp,
};

/// Idempotency key of a trade
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TradeId(String);

impl TradeId {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value: String = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyTradeId);
        }
        Ok(TradeId(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TradeId {
    type Error = ValidationError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        TradeId::new(value)
    }
}

impl From<TradeId> for String {
    fn from(id: TradeId) -> Self {
        id.0
    }
}

/// Trade message as it arrives on the wire, before validation.
///
/// Entity, instrument type and symbol are free-form here; `Trade::from_event`
/// is the only way into the closed domain types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub trade_id: String,
    pub entity: String,
    pub instrument_type: String,
    pub symbol: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub quantity: Decimal,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "rust_decimal::serde::float_option::serialize"
    )]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<DateTime<Utc>>,
}

/// Validated, immutable trade fact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub entity: Entity,
    pub instrument_type: InstrumentType,
    pub symbol: Symbol,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub quantity: Quantity,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "rust_decimal::serde::float_option::serialize"
    )]
    pub price: Option<Price>,
    pub ts: Timestamp,
}

impl Trade {
    /// Validate a wire event.
    ///
    /// A missing timestamp, or one at or before the Unix epoch, is replaced
    /// by `received_at`. Timestamps must fit in signed 64-bit nanoseconds
    /// (1677 to 2262).
    pub fn from_event(event: TradeEvent, received_at: Timestamp) -> Result<Self, ValidationError> {
        let trade_id = TradeId::new(event.trade_id)?;
        let entity: Entity = event.entity.parse()?;
        let instrument_type: InstrumentType = event.instrument_type.parse()?;
        let symbol = Symbol::new(event.symbol)?;

        let quantity = event.quantity.normalize();
        if quantity.scale() > QUANTITY_SCALE {
            return Err(ValidationError::QuantityPrecision {
                quantity: event.quantity,
                max_scale: QUANTITY_SCALE,
            });
        }
        if let Some(price) = event.price {
            if price.is_sign_negative() && !price.is_zero() {
                return Err(ValidationError::NegativePrice(price));
            }
        }

        let ts = match event.ts {
            Some(ts) if ts > DateTime::<Utc>::UNIX_EPOCH => ts,
            _ => received_at,
        };
        if ts.timestamp_nanos_opt().is_none() {
            return Err(ValidationError::TimestampOutOfRange(ts));
        }

        Ok(Self {
            trade_id,
            entity,
            instrument_type,
            symbol,
            quantity,
            price: event.price,
            ts,
        })
    }

    pub fn holding_key(&self) -> HoldingKey {
        HoldingKey::new(self.entity, self.instrument_type, self.symbol.clone())
    }

    /// Wire representation of this trade
    pub fn to_event(&self) -> TradeEvent {
        TradeEvent {
            trade_id: self.trade_id.to_string(),
            entity: self.entity.to_string(),
            instrument_type: self.instrument_type.to_string(),
            symbol: self.symbol.to_string(),
            quantity: self.quantity,
            price: self.price,
            ts: Some(self.ts),
        }
    }
}

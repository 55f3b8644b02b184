use serde::{Deserialize, Serialize};

use crate::values::{Entity, InstrumentType, Quantity, Symbol};

/// Identity of a running position total.
///
/// Field order defines the canonical sort: entity, instrument type, symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HoldingKey {
    pub entity: Entity,
    pub instrument_type: InstrumentType,
    pub symbol: Symbol,
}

impl HoldingKey {
    pub fn new(entity: Entity, instrument_type: InstrumentType, symbol: Symbol) -> Self {
        Self {
            entity,
            instrument_type,
            symbol,
        }
    }
}

/// Running total of all distinct trades applied for one key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub entity: Entity,
    pub instrument_type: InstrumentType,
    pub symbol: Symbol,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub quantity: Quantity,
}

impl Holding {
    pub fn new(key: HoldingKey, quantity: Quantity) -> Self {
        Self {
            entity: key.entity,
            instrument_type: key.instrument_type,
            symbol: key.symbol,
            quantity,
        }
    }

    pub fn key(&self) -> HoldingKey {
        HoldingKey::new(self.entity, self.instrument_type, self.symbol.clone())
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

mod entity;
mod instrument_type;
mod limit;
mod symbol;

pub use entity::{Entity, EntityScope};
pub use instrument_type::InstrumentType;
pub use limit::TradeLimit;
pub use symbol::Symbol;

/// Price value - uses Decimal for precision
pub type Price = Decimal;

/// Signed quantity (positive = buy/increase, negative = sell/decrease)
pub type Quantity = Decimal;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Maximum number of fractional digits a trade quantity may carry.
///
/// Holdings totals are kept as exact fixed-point sums at this precision.
pub const QUANTITY_SCALE: u32 = 8;

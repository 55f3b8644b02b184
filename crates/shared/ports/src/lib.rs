//! Holdings Ports
//!
//! Port definitions (traits) for the holdings aggregator.
//! These define the boundaries between the aggregation logic and
//! infrastructure: the durable store, the message transport and time.

mod clock;
mod deadline;
mod error;
mod source;
mod store;

pub use clock::Clock;
pub use deadline::Deadline;
pub use error::{Interrupted, StoreError, StoreResult, TransportError};
pub use source::TradeSource;
pub use store::{ApplyOutcome, HoldingsStore};

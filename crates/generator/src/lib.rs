//! Holdings Generator
//!
//! Synthetic trade source for exercising the aggregator: a pure
//! `generate(rng, now)` function over a fixed instrument universe, and a
//! rate-limited emitter that pushes JSON-encoded trades into a channel.

pub mod config;
pub mod emitter;
pub mod universe;

pub use config::{ProducerConfig, parse_duration};
pub use emitter::{
    EmitterError, EmitterSummary, MAX_TRADES_PER_SEC, MIN_TRADES_PER_SEC, StopReason, TradeEmitter,
};
pub use universe::{CRYPTOS, STOCKS, generate};

pub mod config;
pub mod repositories;
pub mod transport;

pub use config::{AggregatorConfig, ConfigError, IngestSource, LogFormat};
pub use repositories::{InMemoryHoldingsStore, SqliteHoldingsStore};
pub use transport::{ChannelTradeSource, LinesTradeSource};

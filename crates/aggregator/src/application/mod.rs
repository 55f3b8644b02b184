pub mod cache;
pub mod error;
pub mod ingestion;
pub mod service;

pub use cache::{CacheStats, HoldingsKey, QueryCache, TradesKey};
pub use error::AggregationError;
pub use ingestion::{Disposition, IngestionLoop, IngestionSnapshot, IngestionStats};
pub use service::AggregationService;

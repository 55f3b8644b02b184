mod in_memory_holdings;
mod sqlite_holdings;

pub use in_memory_holdings::InMemoryHoldingsStore;
pub use sqlite_holdings::SqliteHoldingsStore;

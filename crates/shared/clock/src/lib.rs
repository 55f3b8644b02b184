//! Holdings Clock Infrastructure
//!
//! Time sources for the ingestion-time default of trades:
//!
//! - [`SystemClock`]: wall-clock time for production
//! - [`ManualClock`]: frozen time that only moves when told to, for tests

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

// Re-export the Clock trait for convenience
pub use holdings_ports::Clock;

use chrono::Utc;
use holdings_core::Timestamp;
use holdings_ports::Clock;

/// Wall-clock time in UTC.
///
/// Stamps trades that arrive without an event time, so ingestion order and
/// the recorded time agree for those trades.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn name(&self) -> &str {
        "SystemClock"
    }
}

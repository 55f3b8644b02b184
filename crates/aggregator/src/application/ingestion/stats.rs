use std::sync::atomic::{AtomicU64, Ordering};

/// Live ingestion counters, shared between the loop and observers
#[derive(Debug, Default)]
pub struct IngestionStats {
    received: AtomicU64,
    applied: AtomicU64,
    duplicates: AtomicU64,
    decode_failures: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
}

/// Copy of the counters at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionSnapshot {
    pub received: u64,
    pub applied: u64,
    pub duplicates: u64,
    pub decode_failures: u64,
    pub rejected: u64,
    pub failed: u64,
}

impl IngestionSnapshot {
    /// Payloads that did not change holdings and were not duplicates
    pub fn skipped(&self) -> u64 {
        self.decode_failures + self.rejected + self.failed
    }
}

impl IngestionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_applied(&self) {
        self.applied.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> IngestionSnapshot {
        IngestionSnapshot {
            received: self.received.load(Ordering::Relaxed),
            applied: self.applied.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

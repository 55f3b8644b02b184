use holdings_core::ValidationError;
use holdings_ports::{Interrupted, StoreError};
use thiserror::Error;

/// Errors surfaced by the aggregation service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregationError {
    /// The event was malformed; it never reached the store
    #[error("invalid trade: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(StoreError),

    /// Cancelled or timed out; no partial effects were kept
    #[error("operation interrupted: {0}")]
    Interrupted(Interrupted),
}

impl AggregationError {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, AggregationError::Interrupted(_))
    }
}

impl From<StoreError> for AggregationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Interrupted(reason) => AggregationError::Interrupted(reason),
            other => AggregationError::Store(other),
        }
    }
}

impl From<Interrupted> for AggregationError {
    fn from(reason: Interrupted) -> Self {
        AggregationError::Interrupted(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_interruption_is_lifted() {
        let err: AggregationError = StoreError::Interrupted(Interrupted::Cancelled).into();
        assert_eq!(err, AggregationError::Interrupted(Interrupted::Cancelled));
        assert!(err.is_interrupted());
    }

    #[test]
    fn test_backend_error_stays_store() {
        let err: AggregationError = StoreError::Backend("disk full".into()).into();
        assert_eq!(err.to_string(), "store failure: disk full");
        assert!(!err.is_interrupted());
    }
}

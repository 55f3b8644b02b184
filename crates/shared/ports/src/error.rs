use thiserror::Error;

/// Why an operation was abandoned before completing
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    #[error("cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    TimedOut,
}

/// Failures of the durable store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The query matched zero rows
    #[error("no rows found")]
    NotFound,

    /// Connectivity or constraint failure
    #[error("store failure: {0}")]
    Backend(String),

    /// The operation was abandoned; nothing it started was kept
    #[error("store operation interrupted: {0}")]
    Interrupted(Interrupted),
}

impl From<Interrupted> for StoreError {
    fn from(reason: Interrupted) -> Self {
        StoreError::Interrupted(reason)
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failures of the message transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport I/O error: {0}")]
    Io(String),

    #[error("transport read interrupted: {0}")]
    Interrupted(Interrupted),
}

impl From<Interrupted> for TransportError {
    fn from(reason: Interrupted) -> Self {
        TransportError::Interrupted(reason)
    }
}

use async_trait::async_trait;

use crate::deadline::Deadline;
use crate::error::TransportError;

/// Port for the inbound trade message transport
///
/// Yields raw message payloads; decoding belongs to the ingestion loop so
/// that a malformed message can be skipped without tearing down the source.
#[async_trait]
pub trait TradeSource: Send {
    /// Wait for the next payload. `Ok(None)` means the transport is closed.
    async fn next(&mut self, deadline: &Deadline) -> Result<Option<Vec<u8>>, TransportError>;

    /// Get the source's name/identifier for logging
    fn name(&self) -> &str {
        "TradeSource"
    }
}

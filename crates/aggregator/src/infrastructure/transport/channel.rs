use async_trait::async_trait;
use holdings_ports::{Deadline, TradeSource, TransportError};
use tokio::sync::mpsc;

/// In-process transport: raw payloads over a bounded tokio channel.
///
/// The source reports closed once every sender is dropped.
pub struct ChannelTradeSource {
    rx: mpsc::Receiver<Vec<u8>>,
}

impl ChannelTradeSource {
    pub fn new(rx: mpsc::Receiver<Vec<u8>>) -> Self {
        Self { rx }
    }

    /// Connected sender and source
    pub fn pair(capacity: usize) -> (mpsc::Sender<Vec<u8>>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl TradeSource for ChannelTradeSource {
    async fn next(&mut self, deadline: &Deadline) -> Result<Option<Vec<u8>>, TransportError> {
        Ok(deadline.run(self.rx.recv()).await?)
    }

    fn name(&self) -> &str {
        "channel"
    }
}

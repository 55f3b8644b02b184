mod channel;
mod lines;

pub use channel::ChannelTradeSource;
pub use lines::LinesTradeSource;

use std::fmt;

/// Page size for trade history queries, always within `[MIN, MAX]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TradeLimit(u16);

impl TradeLimit {
    pub const MIN: u16 = 1;
    pub const MAX: u16 = 1000;
    pub const DEFAULT: u16 = 100;

    /// Clamp an arbitrary requested size into range
    pub fn new(requested: i64) -> Self {
        let clamped = requested.clamp(i64::from(Self::MIN), i64::from(Self::MAX));
        TradeLimit(clamped as u16)
    }

    /// Parse an optional query parameter.
    ///
    /// Missing, blank or non-numeric input falls back to the default;
    /// numeric input is clamped.
    pub fn parse(raw: Option<&str>) -> Self {
        raw.map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse::<i64>().ok())
            .map_or_else(Self::default, Self::new)
    }

    pub fn get(&self) -> usize {
        usize::from(self.0)
    }
}

impl Default for TradeLimit {
    fn default() -> Self {
        TradeLimit(Self::DEFAULT)
    }
}

impl fmt::Display for TradeLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

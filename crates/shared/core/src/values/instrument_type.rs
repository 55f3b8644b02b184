use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Instrument class of a traded symbol.
///
/// Variant order matches the lexical order of the wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentType {
    /// Digital asset
    Crypto,
    /// Equity
    Stock,
}

impl InstrumentType {
    pub const ALL: [InstrumentType; 2] = [InstrumentType::Crypto, InstrumentType::Stock];

    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentType::Crypto => "crypto",
            InstrumentType::Stock => "stock",
        }
    }
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstrumentType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stock" => Ok(InstrumentType::Stock),
            "crypto" => Ok(InstrumentType::Crypto),
            _ => Err(ValidationError::UnknownInstrumentType(s.trim().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("stock".parse(), Ok(InstrumentType::Stock));
        assert_eq!(" Crypto".parse(), Ok(InstrumentType::Crypto));
        assert!("bond".parse::<InstrumentType>().is_err());
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

const MAX_SYMBOL_LEN: usize = 20;

/// Ticker symbol, normalized to uppercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let raw: String = value.into();
        let s = raw.trim();
        let invalid = |reason| ValidationError::InvalidSymbol {
            symbol: raw.clone(),
            reason,
        };

        if s.is_empty() {
            return Err(invalid("symbol cannot be empty"));
        }
        if s.len() > MAX_SYMBOL_LEN {
            return Err(invalid("symbol too long (max 20 chars)"));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '/'))
        {
            return Err(invalid("symbol must be alphanumeric"));
        }
        Ok(Symbol(s.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Symbol {
    type Error = ValidationError;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Symbol::new(value)
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Symbol::new(value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

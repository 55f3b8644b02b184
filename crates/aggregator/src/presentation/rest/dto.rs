use holdings_core::Trade;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
}

/// Query parameters for GET /api/trades
///
/// Both are kept raw so that an unparseable limit falls back to the
/// default instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct TradesQuery {
    pub limit: Option<String>,
    pub entity: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TradesResponse {
    pub rows: Arc<[Trade]>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

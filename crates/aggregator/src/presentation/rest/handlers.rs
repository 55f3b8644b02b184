use axum::{
    Json,
    extract::{Path, Query, State},
};
use holdings_core::{EntityScope, Holding, TradeLimit};
use holdings_ports::{Clock, HoldingsStore};
use std::sync::Arc;

use crate::presentation::rest::{ApiError, dto::*};

use super::AppState;

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

/// GET /api/holdings
pub async fn all_holdings<S: HoldingsStore, C: Clock>(
    State(state): State<Arc<AppState<S, C>>>,
) -> Result<Json<Arc<[Holding]>>, ApiError> {
    let rows = state.service.get_all_holdings(&state.deadline()).await?;
    Ok(Json(rows))
}

/// GET /api/holdings/{entity}
pub async fn entity_holdings<S: HoldingsStore, C: Clock>(
    Path(entity): Path<String>,
    State(state): State<Arc<AppState<S, C>>>,
) -> Result<Json<Arc<[Holding]>>, ApiError> {
    let scope = parse_scope(&entity)?;
    let rows = state.service.get_holdings(scope, &state.deadline()).await?;
    Ok(Json(rows))
}

/// GET /api/trades?limit=&entity=
pub async fn trades<S: HoldingsStore, C: Clock>(
    Query(query): Query<TradesQuery>,
    State(state): State<Arc<AppState<S, C>>>,
) -> Result<Json<TradesResponse>, ApiError> {
    let limit = TradeLimit::parse(query.limit.as_deref());
    let scope = parse_scope(query.entity.as_deref().unwrap_or_default())?;

    let rows = state
        .service
        .get_trades(limit, scope, &state.deadline())
        .await?;
    Ok(Json(TradesResponse { rows }))
}

fn parse_scope(raw: &str) -> Result<EntityScope, ApiError> {
    EntityScope::parse(raw).map_err(|e| ApiError::bad_request(e.to_string()))
}

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::get,
};
use holdings_ports::{Clock, Deadline, HoldingsStore};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::application::AggregationService;

const CORS_MAX_AGE: Duration = Duration::from_secs(86_400);

/// Application state shared across handlers
pub struct AppState<S: HoldingsStore, C: Clock> {
    pub service: Arc<AggregationService<S, C>>,
    /// Cancelled on shutdown; in-flight queries answer 503
    pub shutdown: CancellationToken,
    pub store_timeout: Option<Duration>,
}

impl<S: HoldingsStore, C: Clock> AppState<S, C> {
    pub fn new(
        service: Arc<AggregationService<S, C>>,
        shutdown: CancellationToken,
        store_timeout: Option<Duration>,
    ) -> Self {
        AppState {
            service,
            shutdown,
            store_timeout,
        }
    }

    /// Deadline for one request's store work
    pub fn deadline(&self) -> Deadline {
        let deadline = Deadline::new(self.shutdown.child_token());
        match self.store_timeout {
            Some(timeout) => deadline.with_timeout(timeout),
            None => deadline,
        }
    }
}

/// CORS for the read API: GET/OPTIONS from `origin` (or anywhere for `*`)
pub fn cors_layer(origin: &str) -> CorsLayer {
    let allow_origin = if origin == "*" {
        AllowOrigin::from(Any)
    } else {
        match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => AllowOrigin::list(Vec::<HeaderValue>::new()),
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(CORS_MAX_AGE)
}

/// Create the REST API router
pub fn create_router<S, C>(state: Arc<AppState<S, C>>, cors_origin: &str) -> Router
where
    S: HoldingsStore + 'static,
    C: Clock + 'static,
{
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/holdings", get(handlers::all_holdings::<S, C>))
        .route("/api/holdings/{entity}", get(handlers::entity_holdings::<S, C>))
        .route("/api/trades", get(handlers::trades::<S, C>))
        // Middleware, innermost first
        .layer(cors_layer(cors_origin))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
        .with_state(state)
}

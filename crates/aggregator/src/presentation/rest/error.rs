use crate::application::AggregationError;
use crate::presentation::rest::dto::ErrorResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

/// API error type
#[derive(Debug)]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
    pub status: StatusCode,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError {
            code: "bad_request",
            message: message.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn internal() -> Self {
        ApiError {
            code: "internal_server_error",
            message: "internal server error".to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        ApiError {
            code: "unavailable",
            message: message.into(),
            status: StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<AggregationError> for ApiError {
    fn from(err: AggregationError) -> Self {
        match err {
            AggregationError::Validation(e) => ApiError::bad_request(e.to_string()),
            AggregationError::Interrupted(reason) => {
                ApiError::unavailable(format!("request {reason}"))
            }
            AggregationError::Store(e) => {
                // Details stay in the log
                error!(error = %e, "store query failed");
                ApiError::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse::new(self.code, self.message));
        (self.status, body).into_response()
    }
}

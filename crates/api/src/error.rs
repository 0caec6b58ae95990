//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use saga::SagaError;
use serde::Serialize;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request from the client.
    BadRequest(String),
    /// No authenticated user on a user-scoped route.
    Unauthorized(String),
    /// Saga execution error.
    Saga(SagaError),
}

/// Error body shared by every failure response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Saga(err) => saga_error_to_response(err),
        };

        (status, axum::Json(ErrorResponse { message })).into_response()
    }
}

fn saga_error_to_response(err: SagaError) -> (StatusCode, String) {
    match err {
        SagaError::Rejected(msg) => (StatusCode::BAD_REQUEST, msg),
        SagaError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        SagaError::Step { step, source } => {
            tracing::error!(step, error = %source, "internal server error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{step}: downstream service failure"),
            )
        }
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}

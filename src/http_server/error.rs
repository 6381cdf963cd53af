//! Defines the custom `ApiError` type for the HTTP server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::persistence::error::PersistenceError;

/// A custom error type for the API that can be converted into an HTTP
/// response.
///
/// A suppressed notification is deliberately NOT represented here: it is a
/// normal control-flow outcome, not an error, and the handler builds that
/// response directly.
#[derive(Debug)]
pub enum ApiError {
    /// The request body could not be decoded against the strict schema.
    BadRequest(String),

    /// The supplied token is not in the configured set.
    InvalidToken,

    /// Represents a generic internal server error.
    InternalServerError(String),
}

/// Converts a `PersistenceError` into an `ApiError`.
///
/// This allows for the convenient use of the `?` operator in handlers
/// on functions that return `Result<_, PersistenceError>`.
impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        ApiError::InternalServerError(err.to_string())
    }
}

/// Implements the conversion from `ApiError` into an `axum` response.
///
/// This is the central point for mapping internal application errors to
/// user-facing HTTP responses. Client errors carry plain-text bodies;
/// server errors carry a JSON body with the detail withheld.
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::BadRequest(message) =>
                (StatusCode::BAD_REQUEST, message).into_response(),
            ApiError::InvalidToken =>
                (StatusCode::FORBIDDEN, "Invalid token".to_string()).into_response(),
            ApiError::InternalServerError(err) => {
                tracing::error!("Internal server error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "An internal server error occurred" })),
                )
                    .into_response()
            }
        }
    }
}

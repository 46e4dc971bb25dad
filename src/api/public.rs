//! Public API types

use axum::response::{IntoResponse, Response};
use http::StatusCode;

// Errors

pub struct ApiError {
    status: StatusCode,
    error: anyhow::Error,
}

impl ApiError {
    pub fn new(status: StatusCode, error: anyhow::Error) -> Self {
        Self { status, error }
    }

    pub fn not_found(error: anyhow::Error) -> Self {
        Self::new(StatusCode::NOT_FOUND, error)
    }

    pub fn bad_request(error: anyhow::Error) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error)
    }
}

/// Convert `ApiError` into an Axum compatible response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("{}", self.error);
        } else {
            tracing::debug!("Rejected request ({}): {}", self.status, self.error);
        }

        (self.status, self.error.to_string()).into_response()
    }
}

// Re-export public types from each route

pub mod chat {
    pub use crate::api::routes::chat::public::*;
}

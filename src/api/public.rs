//! Public API types

use axum::response::{IntoResponse, Response};
use http::StatusCode;

// Errors

pub struct ApiError {
    status: StatusCode,
    error: anyhow::Error,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: anyhow::anyhow!(message.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

/// Convert `ApiError` into an Axum compatible response.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Client errors are echoed back as-is
        if self.status.is_client_error() {
            tracing::warn!("{}", self.error);
            return (self.status, self.error.to_string()).into_response();
        }

        // Always log the error
        tracing::error!("{}", self.error);

        // Respond with an error status
        (self.status, format!("Something went wrong: {}", self.error)).into_response()
    }
}

/// Enables using `?` on functions that return `Result<_,
/// anyhow::Error>` to turn them into `Result<_, ApiError>`
impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: err.into(),
        }
    }
}

// Re-export public types from each route

pub mod email {
    pub use crate::api::routes::email::public::*;
}

pub mod clio {
    pub use crate::api::routes::clio::public::*;
}

//! Maps [`Error`] onto HTTP responses with a JSON `{ "error": ... }` body.

use crate::errors::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

impl Error {
    /// HTTP status reported for this error
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidOutlet { .. } | Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::OrderClosed { .. } | Self::InvoiceExists { .. } => StatusCode::CONFLICT,
            Self::AllocationFailed { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::DuplicateNumber { .. }
            | Self::Database(_)
            | Self::Config { .. }
            | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

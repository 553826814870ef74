//! API error type with HTTP response mapping.

use crate::errors::{Error, ErrorKind};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Error returned by every handler.
#[derive(Debug)]
pub enum ApiError {
    /// The caller lacks the role the endpoint requires.
    Forbidden(String),
    /// Malformed request metadata (headers and the like).
    BadRequest(String),
    /// Anything raised by the workflow or the store.
    Core(Error),
}

fn kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::NotFound => "not_found",
        ErrorKind::InvalidState => "invalid_state",
        ErrorKind::InvalidTransition => "invalid_transition",
        ErrorKind::InsufficientStock => "insufficient_stock",
        ErrorKind::Conflict => "conflict",
        ErrorKind::InvalidInput => "invalid_input",
        ErrorKind::Technical => "technical",
    }
}

fn core_error_to_response(err: &Error) -> (StatusCode, &'static str) {
    if matches!(err, Error::Timeout) {
        return (StatusCode::SERVICE_UNAVAILABLE, "timeout");
    }

    let kind = err.kind();
    let status = match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::InvalidState
        | ErrorKind::InvalidTransition
        | ErrorKind::InsufficientStock
        | ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Technical => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, kind_label(kind))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::Core(err) => {
                let (status, kind) = core_error_to_response(&err);
                if status.is_server_error() {
                    tracing::error!(error = %err, "request failed");
                }
                (status, kind, err.to_string())
            }
        };

        let body = serde_json::json!({ "error": message, "kind": kind });
        (status, axum::Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Core(err)
    }
}

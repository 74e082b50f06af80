use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use event_store_core::store::StoreError;
use event_store_core::validation::RejectionReason;

/// Body for a rejected report. The reason itself is logged, never returned.
pub const VALIDATION_FAILED: &str = "Unable to validate JSON";
pub const READ_FAILED: &str = "Error reading request body";
pub const PARSE_FAILED: &str = "Error parsing JSON";
pub const METHOD_NOT_ALLOWED: &str = "Method not allowed";
pub const INTERNAL_ERROR: &str = "Internal server error";

/// Application-level error type for HTTP handlers.
///
/// Callers are untrusted browsers, so every variant renders as a status
/// code and a short fixed string. Details go to the log.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The report failed its rule set.
    #[error(transparent)]
    Validation(#[from] RejectionReason),

    /// The report store failed an insert.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Wrong HTTP method; carries the single allowed method.
    #[error("Method not allowed, expected {0}")]
    MethodNotAllowed(Method),

    /// A bad request with a fixed caller-facing message.
    #[error("Bad request: {0}")]
    BadRequest(&'static str),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::MethodNotAllowed(allowed) => (
                StatusCode::METHOD_NOT_ALLOWED,
                [(header::ALLOW, allowed.to_string())],
                METHOD_NOT_ALLOWED,
            )
                .into_response(),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, VALIDATION_FAILED).into_response(),
            AppError::Store(err) => {
                tracing::error!(error = %err, "Report store error");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR).into_response()
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR).into_response()
            }
        }
    }
}

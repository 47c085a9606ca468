use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use orderdesk_orders::OrderRepositoryError;

/// Translate a repository outcome into a transport status.
///
/// Not-found is part of normal operation and is not logged; everything that
/// reaches the 500 path is logged with full error context but reported to the
/// caller without detail.
pub fn repository_error_to_response(
    operation: &'static str,
    err: OrderRepositoryError,
) -> axum::response::Response {
    match err {
        OrderRepositoryError::OrderNotFound(_) => {
            json_error(StatusCode::NOT_FOUND, "not_found", "order not found")
        }
        OrderRepositoryError::OutOfRange(msg) => {
            tracing::warn!(operation, error = msg, "rejected out-of-range argument");
            json_error(StatusCode::BAD_REQUEST, "out_of_range", msg)
        }
        err @ OrderRepositoryError::Repository { .. } => {
            tracing::error!(
                operation,
                error = %err,
                source = ?std::error::Error::source(&err),
                "repository operation failed"
            );
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "unexpected server failure",
            )
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

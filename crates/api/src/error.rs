use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thermoscan_core::error::CoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `thermoscan_core`.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::SessionNotFound(id) => (
                    StatusCode::NOT_FOUND,
                    "SESSION_NOT_FOUND",
                    format!("Session {id} not found"),
                ),
                CoreError::ConfigurationInvalid(msg) => {
                    tracing::error!(error = %msg, "Analysis configuration invalid");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "CONFIGURATION_INVALID",
                        format!("Analysis configuration invalid: {msg}"),
                    )
                }
                // Phase-level errors are contained by the aggregator; reaching
                // here means something escaped containment.
                other => {
                    tracing::error!(error = %other, "Unhandled core error");
                    internal()
                }
            },
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

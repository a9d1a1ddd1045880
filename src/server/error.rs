use crate::utils::error::ToolError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Error type for HTTP handlers, rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request itself is unusable.
    #[error("{0}")]
    BadRequest(String),

    /// The request was refused with a specific status, e.g. 413 for an oversized upload.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    /// Something failed inside this process.
    #[error("{0}")]
    Internal(String),

    /// The inference backend failed or could not be reached.
    #[error(transparent)]
    Backend(#[from] ToolError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Rejected { status, message } => (*status, message.clone()),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            ApiError::Backend(err) => {
                tracing::error!(error = %err, "Backend call failed");
                let status = match err {
                    ToolError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, err.user_friendly_message())
            }
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

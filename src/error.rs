use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    InvalidRequest(String),
    UnknownForm(String),
    InvalidSignature(String),
    StaleTimestamp(String),
    Upstream(String),
    Internal(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::InvalidRequest(msg) => write!(f, "Invalid Request: {msg}"),
            AppError::UnknownForm(msg) => write!(f, "Unknown Form: {msg}"),
            AppError::InvalidSignature(msg) => write!(f, "Invalid Signature: {msg}"),
            AppError::StaleTimestamp(msg) => write!(f, "Stale Timestamp: {msg}"),
            AppError::Upstream(msg) => write!(f, "Upstream Error: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::PRECONDITION_FAILED,
            AppError::UnknownForm(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidSignature(_) => StatusCode::FORBIDDEN,
            AppError::StaleTimestamp(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Upstream(msg) => {
                tracing::error!("Slack delivery failed: {msg}");
                msg
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                "Internal server error".to_string()
            }
            AppError::InvalidRequest(msg)
            | AppError::UnknownForm(msg)
            | AppError::InvalidSignature(msg)
            | AppError::StaleTimestamp(msg) => {
                tracing::debug!("Rejected relay request ({status}): {msg}");
                msg
            }
        };

        let body = json!({ "result": "ERROR", "message": message });
        (status, axum::Json(body)).into_response()
    }
}

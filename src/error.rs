use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("text is {len} bytes, limit is {limit}")]
    TextTooLong { len: usize, limit: usize },
    #[error("invalid session id")]
    InvalidSession,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::TextTooLong { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::InvalidSession => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

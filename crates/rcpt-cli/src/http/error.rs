//! API error type with structured JSON responses.

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use rcpt_core::RcptError;

/// Error response body: `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// Errors a handler can return.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A lifecycle operation failed.
    #[error(transparent)]
    Lifecycle(#[from] RcptError),

    /// The request itself was malformed.
    #[error("invalid request: {0}")]
    BadRequest(String),

    /// A blocking lifecycle call panicked or was cancelled.
    #[error("request task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The multipart body could not be read, including oversized uploads.
    #[error("invalid upload: {}", .0.body_text())]
    Multipart(#[from] MultipartError),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Task(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
            ApiError::Multipart(err) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                (StatusCode::PAYLOAD_TOO_LARGE, "TOO_LARGE")
            }
            ApiError::Multipart(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Lifecycle(err) => match err {
                RcptError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                RcptError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
                RcptError::Precondition { .. } => (StatusCode::BAD_REQUEST, "PRECONDITION"),
                RcptError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE"),
                RcptError::Extraction(_) => (StatusCode::INTERNAL_SERVER_ERROR, "EXTRACTION"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, "{}", self);
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code,
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

//! HTTP front end for the document lifecycle.
//!
//! Routes:
//! - `GET /` service banner
//! - `POST /upload` multipart upload, field `file`
//! - `POST /validate`, `POST /process` form field `file_id`
//! - `GET /files`, `GET /files/:id`
//! - `GET /receipts?skip&limit`, `GET /receipts/:id`

mod error;
mod handlers;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};

use rcpt_core::Lifecycle;

/// Build the service router over a lifecycle.
///
/// Request bodies larger than `max_upload_bytes` are refused with 413.
pub fn router(lifecycle: Lifecycle, max_upload_bytes: usize) -> Router {
    // NOTE: path params use `:param` syntax (axum 0.7)
    Router::new()
        .route("/", get(handlers::index))
        .route("/upload", post(handlers::upload))
        .route("/validate", post(handlers::validate))
        .route("/process", post(handlers::process))
        .route("/files", get(handlers::list_files))
        .route("/files/:id", get(handlers::get_file))
        .route("/receipts", get(handlers::list_receipts))
        .route("/receipts/:id", get(handlers::get_receipt))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(lifecycle)
}

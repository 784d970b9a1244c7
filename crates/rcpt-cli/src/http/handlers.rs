//! Request handlers. Each maps onto one lifecycle operation.

use axum::Json;
use axum::extract::{Form, Multipart, Path, Query, State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use rcpt_core::{Document, DocumentId, Lifecycle, Receipt, ReceiptId, ReceiptPage};

use super::error::ApiError;

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Run a synchronous lifecycle call (SQLite, filesystem, PDF parsing) off
/// the async workers.
async fn blocking<T, F>(lifecycle: Lifecycle, op: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Lifecycle) -> rcpt_core::Result<T> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || op(&lifecycle)).await?;
    Ok(Json(result?))
}

#[derive(Debug, Deserialize)]
pub struct FileIdForm {
    pub file_id: DocumentId,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    100
}

pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "Receipt ingestion service",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn upload(
    State(lifecycle): State<Lifecycle>,
    mut multipart: Multipart,
) -> ApiResult<Document> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        debug!("Upload of {} ({} bytes)", name, bytes.len());

        return blocking(lifecycle, move |l| l.submit(&name, &bytes)).await;
    }

    Err(ApiError::BadRequest("missing multipart field 'file'".into()))
}

pub async fn validate(
    State(lifecycle): State<Lifecycle>,
    Form(form): Form<FileIdForm>,
) -> ApiResult<Document> {
    blocking(lifecycle, move |l| l.validate(form.file_id)).await
}

pub async fn process(
    State(lifecycle): State<Lifecycle>,
    Form(form): Form<FileIdForm>,
) -> ApiResult<Receipt> {
    Ok(Json(lifecycle.process(form.file_id).await?))
}

pub async fn list_files(State(lifecycle): State<Lifecycle>) -> ApiResult<Vec<Document>> {
    blocking(lifecycle, |l| l.list_documents()).await
}

pub async fn get_file(
    State(lifecycle): State<Lifecycle>,
    Path(id): Path<DocumentId>,
) -> ApiResult<Document> {
    blocking(lifecycle, move |l| l.get_document(id)).await
}

pub async fn list_receipts(
    State(lifecycle): State<Lifecycle>,
    Query(page): Query<Pagination>,
) -> ApiResult<ReceiptPage> {
    blocking(lifecycle, move |l| l.list_receipts(page.skip, page.limit)).await
}

pub async fn get_receipt(
    State(lifecycle): State<Lifecycle>,
    Path(id): Path<ReceiptId>,
) -> ApiResult<Receipt> {
    blocking(lifecycle, move |l| l.get_receipt(id)).await
}

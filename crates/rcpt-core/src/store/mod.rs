//! Persistent repositories for documents and receipts.
//!
//! Both repositories live in one SQLite database so that the
//! "document processed + receipt created" step can commit as a single
//! transaction. Every write is all-or-nothing and visible to any read issued
//! after it returns.

mod database;
mod documents;
mod receipts;

pub use database::Database;

use crate::error::Result;
use crate::models::document::{Document, DocumentId, DocumentState, NewDocument};
use crate::models::receipt::{Receipt, ReceiptFields, ReceiptId, ReceiptPage};

/// Repository of uploaded-document records.
pub trait DocumentStore: Send + Sync {
    /// Insert a new record in state `Uploaded`.
    fn create_document(&self, new: NewDocument) -> Result<Document>;

    /// Fetch a record; unknown ids fail with `NotFound`.
    fn get_document(&self, id: DocumentId) -> Result<Document>;

    /// Compare-and-swap the state of a record.
    ///
    /// The write happens only if the stored state still equals `from`.
    /// Otherwise fails with `NotFound` for an unknown id or `Precondition`
    /// naming the state actually stored. `invalid_reason` is kept only when
    /// moving to `Rejected`.
    fn transition(
        &self,
        id: DocumentId,
        from: DocumentState,
        to: DocumentState,
        invalid_reason: Option<&str>,
    ) -> Result<Document>;

    /// All records, newest first.
    fn list_documents(&self) -> Result<Vec<Document>>;
}

/// Repository of extracted-receipt records.
pub trait ReceiptStore: Send + Sync {
    /// Fetch a record; unknown ids fail with `NotFound`.
    fn get_receipt(&self, id: ReceiptId) -> Result<Receipt>;

    /// Records newest first, skipping `skip` and returning at most `limit`.
    fn list_receipts(&self, skip: u64, limit: u64) -> Result<ReceiptPage>;
}

/// Both repositories plus the cross-record commit used by processing.
pub trait LifecycleStore: DocumentStore + ReceiptStore {
    /// Move a document from `Validated` to `Processed` and create its receipt.
    ///
    /// Either both effects become visible or neither does. A document that is
    /// no longer `Validated` yields `Precondition` and no receipt.
    fn commit_processed(&self, document_id: DocumentId, fields: &ReceiptFields)
    -> Result<Receipt>;
}

/// Operation name reported when a transition into `to` is refused.
pub(crate) fn operation_for(to: DocumentState) -> &'static str {
    match to {
        DocumentState::Uploaded => "upload",
        DocumentState::Validated | DocumentState::Rejected => "validate",
        DocumentState::Processed => "process",
    }
}

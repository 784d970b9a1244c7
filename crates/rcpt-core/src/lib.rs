//! Core library for receipt document ingestion.
//!
//! This crate provides:
//! - The document lifecycle (upload, validation, processing) with atomic
//!   receipt commits
//! - SQLite-backed document and receipt stores
//! - Filesystem storage for submitted documents
//! - PDF text extraction and rule-based receipt field parsing

pub mod error;
pub mod extract;
pub mod lifecycle;
pub mod models;
pub mod pdf;
pub mod storage;
pub mod store;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{ExtractionError, PdfError, RcptError, Result, StorageError};
pub use extract::{Extractor, PdfReceiptExtractor, ReceiptParser};
pub use lifecycle::Lifecycle;
pub use models::config::RcptConfig;
pub use models::document::{Document, DocumentId, DocumentState};
pub use models::receipt::{Receipt, ReceiptFields, ReceiptId, ReceiptItem, ReceiptPage};
pub use pdf::{PdfContent, PdfProcessor, PdfType};
pub use storage::{BlobStorage, FsStorage};
pub use store::{Database, DocumentStore, LifecycleStore, ReceiptStore};
pub use validator::{ExistenceValidator, PdfValidator, Validator, Verdict};

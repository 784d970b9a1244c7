//! Error types for the rcpt-core library.

use thiserror::Error;

use crate::models::document::{DocumentId, DocumentState};

/// Main error type for the rcpt library.
///
/// Every lifecycle operation fails with exactly one of these kinds. The first
/// three are client faults; `Storage` and `Extraction` may be transient and
/// leave no partial state behind, so the whole operation can be retried.
#[derive(Error, Debug)]
pub enum RcptError {
    /// Malformed or unsupported submission.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Unknown record id.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Operation is not allowed in the document's current lifecycle state.
    #[error("cannot {operation} document {id} in state {state}")]
    Precondition {
        id: DocumentId,
        state: DocumentState,
        operation: &'static str,
    },

    /// Persistence or byte storage failure.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The extractor failed; the document stays validated.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),
}

impl RcptError {
    /// Whether retrying the same call may succeed without client changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RcptError::Storage(_) | RcptError::Extraction(_))
    }

    pub(crate) fn document_not_found(id: DocumentId) -> Self {
        RcptError::NotFound {
            entity: "document",
            id,
        }
    }

    pub(crate) fn receipt_not_found(id: i64) -> Self {
        RcptError::NotFound {
            entity: "receipt",
            id,
        }
    }
}

/// Errors raised by the record stores and the byte storage.
#[derive(Error, Debug)]
pub enum StorageError {
    /// SQLite failure.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A schema migration could not be applied.
    #[error("migration failed at version {version}: {reason}")]
    Migration { version: i64, reason: String },

    /// A persisted value could not be decoded.
    #[error("corrupt value for {field}: {value}")]
    Corrupt { field: &'static str, value: String },

    /// The connection lock was poisoned by a panicking writer.
    #[error("database lock poisoned")]
    LockPoisoned,
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors related to receipt field extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The document could not be read as a PDF.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// The document carries no usable text.
    #[error("no text could be extracted from the document")]
    NoText,

    /// The document is a scan without a text layer.
    #[error("document contains only images and no OCR backend is configured")]
    ImageOnly,

    /// Text was found but no receipt field could be recognized.
    #[error("no receipt data found")]
    NoData,

    /// The extractor did not answer in time.
    #[error("extractor timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The extractor task panicked or was cancelled.
    #[error("extractor aborted: {0}")]
    Aborted(String),

    /// Backend-specific failure.
    #[error("{0}")]
    Failed(String),
}

/// Result type for the rcpt library.
pub type Result<T> = std::result::Result<T, RcptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(RcptError::Extraction(ExtractionError::NoData).is_retryable());
        assert!(RcptError::Storage(StorageError::LockPoisoned).is_retryable());
        assert!(!RcptError::InvalidInput("x".into()).is_retryable());
        assert!(!RcptError::document_not_found(1).is_retryable());
    }

    #[test]
    fn test_precondition_message() {
        let err = RcptError::Precondition {
            id: 7,
            state: DocumentState::Processed,
            operation: "process",
        };
        assert_eq!(
            err.to_string(),
            "cannot process document 7 in state processed"
        );
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(RcptError::receipt_not_found(3).to_string(), "receipt 3 not found");
    }
}

//! Acceptance checks run before a document may be processed.

use lopdf::Document as PdfDocument;
use tracing::debug;

use crate::error::Result;
use crate::models::document::Document;
use crate::pdf::has_pdf_magic;
use crate::storage::BlobStorage;

/// Outcome of validating a stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    /// Rejected with a human-readable reason.
    Rejected(String),
}

impl Verdict {
    fn reject(reason: impl Into<String>) -> Self {
        Verdict::Rejected(reason.into())
    }
}

/// Decides whether a stored document is acceptable for extraction.
///
/// `Err` means the check itself could not run; the document then keeps its
/// current state.
pub trait Validator: Send + Sync {
    fn check(&self, document: &Document, blobs: &dyn BlobStorage) -> Result<Verdict>;
}

/// Accepts any document whose bytes are still retrievable.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExistenceValidator;

impl Validator for ExistenceValidator {
    fn check(&self, document: &Document, blobs: &dyn BlobStorage) -> Result<Verdict> {
        if blobs.exists(&document.location_ref) {
            Ok(Verdict::Accepted)
        } else {
            Ok(Verdict::reject("not found"))
        }
    }
}

/// Existence plus size cap, PDF signature and a structural parse.
#[derive(Debug, Clone, Copy)]
pub struct PdfValidator {
    max_bytes: u64,
}

impl PdfValidator {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }
}

impl Validator for PdfValidator {
    fn check(&self, document: &Document, blobs: &dyn BlobStorage) -> Result<Verdict> {
        if !blobs.exists(&document.location_ref) {
            return Ok(Verdict::reject("not found"));
        }

        let bytes = blobs.get(&document.location_ref)?;
        if bytes.len() as u64 > self.max_bytes {
            return Ok(Verdict::reject(format!("exceeds {} bytes", self.max_bytes)));
        }
        if !has_pdf_magic(&bytes) {
            return Ok(Verdict::reject("not a PDF document"));
        }
        if let Err(e) = PdfDocument::load_mem(&bytes) {
            return Ok(Verdict::reject(format!("unreadable PDF: {}", e)));
        }

        debug!("Document {} passed PDF checks ({} bytes)", document.id, bytes.len());
        Ok(Verdict::Accepted)
    }
}

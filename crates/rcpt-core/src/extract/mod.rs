//! Receipt field extraction.

mod parser;
mod pdf_receipt;
pub mod rules;

pub use parser::ReceiptParser;
pub use pdf_receipt::PdfReceiptExtractor;

use crate::error::ExtractionError;
use crate::models::receipt::ReceiptFields;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Turns raw document bytes into receipt fields.
///
/// Implementations are synchronous; the lifecycle runs them on a blocking
/// thread under a timeout.
pub trait Extractor: Send + Sync {
    /// Extract receipt fields from document bytes.
    fn extract(&self, bytes: &[u8]) -> Result<ReceiptFields>;
}

impl<F> Extractor for F
where
    F: Fn(&[u8]) -> Result<ReceiptFields> + Send + Sync,
{
    fn extract(&self, bytes: &[u8]) -> Result<ReceiptFields> {
        self(bytes)
    }
}

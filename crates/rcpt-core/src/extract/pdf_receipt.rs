//! Receipt extraction from text-layer PDFs.

use tracing::{debug, info};

use crate::error::ExtractionError;
use crate::models::receipt::ReceiptFields;
use crate::pdf::{PdfExtractor, PdfProcessor, PdfType};

use super::{Extractor, ReceiptParser, Result};

/// Reads the PDF text layer and parses it with [`ReceiptParser`].
///
/// No OCR engine is bundled, so scanned receipts fail with `ImageOnly`.
pub struct PdfReceiptExtractor {
    parser: ReceiptParser,
    min_text_length: usize,
}

impl PdfReceiptExtractor {
    pub fn new() -> Self {
        Self {
            parser: ReceiptParser::new(),
            min_text_length: 10,
        }
    }

    /// Set the minimum text length below which a PDF counts as textless.
    pub fn with_min_text_length(mut self, min_text_length: usize) -> Self {
        self.min_text_length = min_text_length;
        self
    }

    /// Use a custom parser.
    pub fn with_parser(mut self, parser: ReceiptParser) -> Self {
        self.parser = parser;
        self
    }

    /// Read the text layer without parsing it.
    pub fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        let mut pdf = PdfExtractor::new().with_min_text_length(self.min_text_length);
        pdf.load(bytes)?;
        let content = pdf.extract_all()?;

        debug!(
            "PDF has {} pages, classified as {:?}",
            content.page_count, content.pdf_type
        );

        match content.pdf_type {
            PdfType::Text | PdfType::Hybrid => Ok(content.text),
            PdfType::Image => Err(ExtractionError::ImageOnly),
            PdfType::Empty => Err(ExtractionError::NoText),
        }
    }
}

impl Default for PdfReceiptExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for PdfReceiptExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ReceiptFields> {
        let text = self.extract_text(bytes)?;
        let fields = self.parser.parse(&text);

        if fields.is_empty() {
            return Err(ExtractionError::NoData);
        }

        info!(
            "Extracted receipt fields from {} bytes of PDF ({} items)",
            bytes.len(),
            fields.items.len()
        );
        Ok(fields)
    }
}

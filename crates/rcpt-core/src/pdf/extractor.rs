//! PDF text extraction using lopdf and pdf-extract.

use lopdf::{Document, Object};
use tracing::{debug, trace};

use super::{PdfProcessor, PdfType, Result};
use crate::error::PdfError;

/// PDF content extractor using lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
    min_text_length: usize,
}

/// Extracted content from a PDF.
#[derive(Debug, Clone)]
pub struct PdfContent {
    /// Type of PDF content.
    pub pdf_type: PdfType,
    /// Extracted text (if any).
    pub text: String,
    /// Number of pages.
    pub page_count: u32,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
            min_text_length: 10,
        }
    }

    /// Set the minimum text length for a PDF to count as text-based.
    pub fn with_min_text_length(mut self, min_text_length: usize) -> Self {
        self.min_text_length = min_text_length;
        self
    }

    /// Extract text and classify the loaded document in one pass.
    pub fn extract_all(&self) -> Result<PdfContent> {
        if self.document.is_none() {
            return Err(PdfError::Parse("No document loaded".to_string()));
        }

        let images = self.count_images();
        let text = match self.extract_text() {
            Ok(text) => text,
            // Scans often carry no font resources at all
            Err(e) if images > 0 => {
                debug!("Text extraction failed on image PDF: {}", e);
                String::new()
            }
            Err(e) => return Err(e),
        };
        let pdf_type = self.classify(text.trim().len(), images);

        Ok(PdfContent {
            pdf_type,
            text,
            page_count: self.page_count(),
        })
    }

    fn classify(&self, text_len: usize, images: usize) -> PdfType {
        let has_text = text_len >= self.min_text_length;
        let pdf_type = match (has_text, images > 0) {
            (true, false) => PdfType::Text,
            (false, true) => PdfType::Image,
            (true, true) => PdfType::Hybrid,
            (false, false) => PdfType::Empty,
        };

        debug!(
            "PDF analysis: {} chars text, {} images -> {:?}",
            text_len, images, pdf_type
        );
        pdf_type
    }

    /// Count image XObjects anywhere in the document.
    fn count_images(&self) -> usize {
        let doc = match self.document.as_ref() {
            Some(d) => d,
            None => return 0,
        };

        doc.objects
            .values()
            .filter(|object| match object {
                Object::Stream(stream) => stream
                    .dict
                    .get(b"Subtype")
                    .and_then(|s| s.as_name())
                    .map(|name| name == b"Image")
                    .unwrap_or(false),
                _ => false,
            })
            .inspect(|_| trace!("Found image object"))
            .count()
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfProcessor for PdfExtractor {
    fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract needs the decrypted bytes
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    fn extract_text(&self) -> Result<String> {
        if self.raw_data.is_empty() {
            return Err(PdfError::Parse("No document loaded".to_string()));
        }
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{image_only_pdf, text_pdf};

    #[test]
    fn test_pdf_extractor_new() {
        let extractor = PdfExtractor::new();
        assert!(extractor.document.is_none());
        assert_eq!(extractor.page_count(), 0);
        assert!(extractor.extract_all().is_err());
    }

    #[test]
    fn test_load_rejects_garbage() {
        let mut extractor = PdfExtractor::new();
        let err = extractor.load(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, PdfError::Parse(_)));
    }

    #[test]
    fn test_text_pdf_is_classified_as_text() {
        let data = text_pdf(&["SAMPLE STORE", "TOTAL 25.99"]);
        let mut extractor = PdfExtractor::new();
        extractor.load(&data).unwrap();

        let content = extractor.extract_all().unwrap();
        assert_eq!(content.page_count, 1);
        assert_eq!(content.pdf_type, PdfType::Text);
        assert!(content.text.contains("SAMPLE STORE"));
    }

    #[test]
    fn test_image_only_pdf_is_classified_as_image() {
        let data = image_only_pdf();
        let mut extractor = PdfExtractor::new();
        extractor.load(&data).unwrap();

        let content = extractor.extract_all().unwrap();
        assert_eq!(content.pdf_type, PdfType::Image);
        assert!(content.text.trim().is_empty());
    }
}

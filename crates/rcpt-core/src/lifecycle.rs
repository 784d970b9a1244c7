//! Document lifecycle orchestration.
//!
//! A document moves `Uploaded -> Validated | Rejected` and then
//! `Validated -> Processed`. Every state change is a compare-and-swap in the
//! record store, so racing calls on one document cannot both succeed.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::{ExtractionError, RcptError, Result};
use crate::extract::{Extractor, PdfReceiptExtractor};
use crate::models::config::RcptConfig;
use crate::models::document::{Document, DocumentId, DocumentState, NewDocument};
use crate::models::receipt::{Receipt, ReceiptId, ReceiptPage};
use crate::storage::{BlobStorage, FsStorage};
use crate::store::{DocumentStore, LifecycleStore, ReceiptStore};
use crate::validator::{ExistenceValidator, PdfValidator, Validator, Verdict};

/// Default bound on a single extractor call.
pub const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Sequences validation and extraction over the record and byte stores.
#[derive(Clone)]
pub struct Lifecycle {
    records: Arc<dyn LifecycleStore>,
    blobs: Arc<dyn BlobStorage>,
    validator: Arc<dyn Validator>,
    extractor: Arc<dyn Extractor>,
    extraction_timeout: Duration,
}

impl Lifecycle {
    /// Create a lifecycle with the existence validator and the PDF extractor.
    pub fn new(records: Arc<dyn LifecycleStore>, blobs: Arc<dyn BlobStorage>) -> Self {
        Self {
            records,
            blobs,
            validator: Arc::new(ExistenceValidator),
            extractor: Arc::new(PdfReceiptExtractor::new()),
            extraction_timeout: DEFAULT_EXTRACTION_TIMEOUT,
        }
    }

    /// Wire the default collaborators from configuration.
    ///
    /// Documents are stored under `storage.upload_dir`; the record store is
    /// supplied by the caller so that it can be closed on shutdown.
    pub fn from_config(config: &RcptConfig, records: Arc<dyn LifecycleStore>) -> Result<Self> {
        let blobs = FsStorage::new(config.storage.upload_dir.clone())?;
        let extractor = PdfReceiptExtractor::new()
            .with_min_text_length(config.extraction.min_text_length);

        let lifecycle = Self::new(records, Arc::new(blobs))
            .with_extractor(extractor)
            .with_extraction_timeout(config.extraction.timeout());

        Ok(if config.validation.strict {
            lifecycle.with_validator(PdfValidator::new(config.validation.max_document_bytes))
        } else {
            lifecycle
        })
    }

    /// Replace the validator.
    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    /// Replace the extractor.
    pub fn with_extractor(mut self, extractor: impl Extractor + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    /// Bound each extractor call.
    pub fn with_extraction_timeout(mut self, timeout: Duration) -> Self {
        self.extraction_timeout = timeout;
        self
    }

    /// Store the document bytes and create its record in state `Uploaded`.
    pub fn submit(&self, name: &str, bytes: &[u8]) -> Result<Document> {
        let name = accepted_name(name)?;
        let location_ref = self.blobs.put(name, bytes)?;

        let created = self.records.create_document(NewDocument {
            name: name.to_string(),
            location_ref: location_ref.clone(),
        });

        match created {
            Ok(document) => {
                info!(
                    "Submitted document {} ({}, {} bytes)",
                    document.id,
                    document.name,
                    bytes.len()
                );
                Ok(document)
            }
            Err(e) => {
                if let Err(cleanup) = self.blobs.remove(&location_ref) {
                    warn!("Failed to remove orphaned upload {}: {}", location_ref, cleanup);
                }
                Err(e)
            }
        }
    }

    /// Run the validator on an `Uploaded` document.
    pub fn validate(&self, id: DocumentId) -> Result<Document> {
        let document = self.records.get_document(id)?;
        require_state(&document, DocumentState::Uploaded, "validate")?;

        match self.validator.check(&document, self.blobs.as_ref())? {
            Verdict::Accepted => {
                let document = self.records.transition(
                    id,
                    DocumentState::Uploaded,
                    DocumentState::Validated,
                    None,
                )?;
                info!("Document {} validated", id);
                Ok(document)
            }
            Verdict::Rejected(reason) => {
                let document = self.records.transition(
                    id,
                    DocumentState::Uploaded,
                    DocumentState::Rejected,
                    Some(&reason),
                )?;
                warn!("Document {} rejected: {}", id, reason);
                Ok(document)
            }
        }
    }

    /// Extract a `Validated` document and commit its receipt.
    ///
    /// The extractor runs on a blocking thread bounded by the extraction
    /// timeout. On any failure the document stays `Validated`.
    pub async fn process(&self, id: DocumentId) -> Result<Receipt> {
        let document = self.records.get_document(id)?;
        require_state(&document, DocumentState::Validated, "process")?;

        let bytes = self.blobs.get(&document.location_ref)?;
        let extractor = Arc::clone(&self.extractor);
        let task = tokio::task::spawn_blocking(move || extractor.extract(&bytes));

        let fields = match tokio::time::timeout(self.extraction_timeout, task).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join_error)) => {
                return Err(ExtractionError::Aborted(join_error.to_string()).into());
            }
            Err(_) => {
                // The blocking thread is abandoned; its result is dropped.
                return Err(ExtractionError::Timeout {
                    secs: self.extraction_timeout.as_secs(),
                }
                .into());
            }
        };

        for issue in fields.issues() {
            warn!("Document {}: {}", id, issue);
        }

        let receipt = self.records.commit_processed(id, &fields)?;
        info!("Document {} processed into receipt {}", id, receipt.id);
        Ok(receipt)
    }

    pub fn get_document(&self, id: DocumentId) -> Result<Document> {
        self.records.get_document(id)
    }

    pub fn get_receipt(&self, id: ReceiptId) -> Result<Receipt> {
        self.records.get_receipt(id)
    }

    /// All documents, newest first.
    pub fn list_documents(&self) -> Result<Vec<Document>> {
        self.records.list_documents()
    }

    /// A page of receipts, newest first, with the overall count.
    pub fn list_receipts(&self, skip: u64, limit: u64) -> Result<ReceiptPage> {
        self.records.list_receipts(skip, limit)
    }
}

/// Final path component of a PDF submission name.
fn accepted_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RcptError::InvalidInput("document name is empty".to_string()));
    }

    let file_name = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| RcptError::InvalidInput(format!("{} has no file name", name)))?;

    let is_pdf = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Err(RcptError::InvalidInput(format!(
            "{} is not a PDF; only PDF documents are accepted",
            file_name
        )));
    }

    Ok(file_name)
}

fn require_state(document: &Document, expected: DocumentState, operation: &'static str) -> Result<()> {
    if document.state == expected {
        Ok(())
    } else {
        Err(RcptError::Precondition {
            id: document.id,
            state: document.state,
            operation,
        })
    }
}

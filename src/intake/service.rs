use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info};

use super::annotation::AnnotationPlatform;
use super::metadata_store::{FileUploadRecord, MetadataStore};
use super::object_store::ObjectStore;
use super::IntakeError;
use crate::models::enums::DocumentType;
use crate::pipeline::extraction::clean_for_annotation;
use crate::pipeline::processor::DocumentProcessor;

/// What the caller gets back after a successful upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReceipt {
    pub db_id: i64,
    pub filename: String,
    pub message: String,
    pub object_key: String,
    pub etag: String,
    pub file_size: u64,
    pub total_pages: usize,
    pub uploaded_time: DateTime<Utc>,
    pub extracted_text: String,
    pub document_type: DocumentType,
    pub extracted_entities: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelTaskReceipt {
    pub message: String,
    pub pages: usize,
    pub filename: String,
    pub response: serde_json::Value,
}

/// Wires the core pipeline to storage, the upload log and the labeling
/// platform. Holds no per-request state.
pub struct IntakeService {
    processor: Arc<DocumentProcessor>,
    objects: Box<dyn ObjectStore + Send + Sync>,
    metadata: Box<dyn MetadataStore + Send + Sync>,
    annotation: Box<dyn AnnotationPlatform + Send + Sync>,
}

fn has_pdf_extension(filename: &str) -> bool {
    filename.to_lowercase().ends_with(".pdf")
}

impl IntakeService {
    pub fn new(
        processor: Arc<DocumentProcessor>,
        objects: Box<dyn ObjectStore + Send + Sync>,
        metadata: Box<dyn MetadataStore + Send + Sync>,
        annotation: Box<dyn AnnotationPlatform + Send + Sync>,
    ) -> Self {
        Self {
            processor,
            objects,
            metadata,
            annotation,
        }
    }

    /// Validate, process, store and log one PDF.
    ///
    /// The file is accepted when either its name ends in `.pdf` or the
    /// declared content type is `application/pdf`. Nothing is stored if
    /// processing fails.
    pub fn upload(
        &self,
        filename: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<UploadReceipt, IntakeError> {
        if !(has_pdf_extension(filename) || content_type == Some("application/pdf")) {
            return Err(IntakeError::InvalidFileType);
        }
        let uploaded_time = Utc::now();
        if bytes.is_empty() {
            return Err(IntakeError::EmptyFile);
        }

        let processed = self.processor.process(bytes).map_err(|e| {
            error!(filename, error = %e, "Text or entity extraction failed");
            IntakeError::Processing(e)
        })?;

        let file_size = bytes.len() as u64;
        let total_pages = processed.page_count();
        debug!(filename, file_size, total_pages, "Storing upload");

        let object_key = filename.to_string();
        let etag = self.objects.put(&object_key, bytes)?;

        let db_id = self.metadata.log_upload(&FileUploadRecord {
            filename: filename.to_string(),
            uploaded_time,
            file_size,
            total_pages,
        })?;

        info!(
            db_id,
            filename,
            document_type = %processed.document_type(),
            "Upload complete"
        );

        Ok(UploadReceipt {
            db_id,
            filename: filename.to_string(),
            message: "File uploaded, processed, and metadata logged successfully.".into(),
            object_key,
            etag,
            file_size,
            total_pages,
            uploaded_time,
            document_type: processed.document_type(),
            extracted_entities: processed.entities.to_map(),
            entities_error: processed.entities_error.clone(),
            extracted_text: processed.assembled.into_string(),
        })
    }

    /// Assemble the PDF's text, clean it for reviewers and open a labeling task.
    pub fn create_label_task(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<LabelTaskReceipt, IntakeError> {
        if !has_pdf_extension(filename) {
            return Err(IntakeError::InvalidFileType);
        }

        let assembled = self.processor.assemble(bytes)?;
        let cleaned = clean_for_annotation(assembled.as_str());
        let response = self.annotation.create_task(&cleaned)?;

        Ok(LabelTaskReceipt {
            message: "PDF extracted and task sent to Label Studio".into(),
            pages: assembled.page_count(),
            filename: filename.to_string(),
            response,
        })
    }
}

//! End-to-end document understanding.
//!
//! Single entry point that drives the core pipeline:
//! assemble text → classify → segment and filter → match entities.
//!
//! Engines are injected (page source, OCR, embedding model) so the
//! processor stays testable with mock implementations. It never touches
//! storage or the network; that belongs to the intake layer.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::models::enums::{ClassificationMethod, DocumentType};
use crate::pipeline::classification::{Classification, ClassificationError, DocumentClassifier};
use crate::pipeline::embedding::SharedEmbedder;
use crate::pipeline::entities::{clean_sentences, EntityMatcher, ExtractedEntities};
use crate::pipeline::extraction::{
    AssembledText, ExtractionError, HybridTextAssembler, OcrEngine, PdfPageSource,
};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Pipeline-level failure. Per-page OCR problems never show up here.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Classification failed: {0}")]
    Classification(#[from] ClassificationError),

    #[error("Processing task aborted: {0}")]
    TaskAborted(String),
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Everything the pipeline learned about one document.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedDocument {
    pub document_id: Uuid,
    pub assembled: AssembledText,
    pub classification: Classification,
    pub entities: ExtractedEntities,
    /// Why the entity stage produced nothing, when it failed. The text and
    /// classification above are still valid.
    pub entities_error: Option<String>,
    /// The document had zero pages.
    pub empty_document: bool,
}

impl ProcessedDocument {
    pub fn document_type(&self) -> DocumentType {
        self.classification.document_type
    }

    pub fn page_count(&self) -> usize {
        self.assembled.page_count()
    }
}

// ---------------------------------------------------------------------------
// Processor
// ---------------------------------------------------------------------------

/// Shared, read-only pipeline. Build once per process and reuse across
/// documents, including concurrently.
pub struct DocumentProcessor {
    assembler: HybridTextAssembler,
    classifier: DocumentClassifier,
    matcher: EntityMatcher,
}

impl DocumentProcessor {
    pub fn new(
        source: Box<dyn PdfPageSource + Send + Sync>,
        ocr: Box<dyn OcrEngine + Send + Sync>,
        embedder: SharedEmbedder,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            assembler: HybridTextAssembler::with_config(source, ocr, config),
            classifier: DocumentClassifier::new(embedder.clone()),
            matcher: EntityMatcher::with_threshold(embedder, config.entity_min_similarity),
        }
    }

    /// Recover the page-marked text only.
    pub fn assemble(&self, pdf_bytes: &[u8]) -> Result<AssembledText, ProcessingError> {
        Ok(self.assembler.assemble(pdf_bytes)?)
    }

    /// Run every stage, in order, exactly once.
    ///
    /// A zero-page document is not an error: it is labelled `unknown` with
    /// no entities and `empty_document` set. Blank pages are classified
    /// like any other text.
    ///
    /// An entity-stage failure is recorded in `entities_error` and leaves
    /// the rest of the result intact.
    pub fn process(&self, pdf_bytes: &[u8]) -> Result<ProcessedDocument, ProcessingError> {
        let document_id = Uuid::new_v4();
        let assembled = self.assembler.assemble(pdf_bytes)?;

        if assembled.is_empty() {
            info!(%document_id, "Document has no pages, skipping classification");
            return Ok(ProcessedDocument {
                document_id,
                assembled,
                classification: Classification {
                    document_type: DocumentType::Unknown,
                    method: ClassificationMethod::Skipped,
                    keyword_scores: Vec::new(),
                    semantic_scores: None,
                },
                entities: ExtractedEntities::default(),
                entities_error: None,
                empty_document: true,
            });
        }

        let classification = self.classifier.classify(assembled.as_str())?;
        let sentences = clean_sentences(assembled.as_str());
        let (entities, entities_error) =
            match self.matcher.extract(&sentences, classification.document_type) {
                Ok(entities) => (entities, None),
                Err(e) => {
                    warn!(
                        %document_id,
                        error = %e,
                        "Entity extraction failed, keeping classification"
                    );
                    (ExtractedEntities::default(), Some(e.to_string()))
                }
            };

        info!(
            %document_id,
            document_type = %classification.document_type,
            method = %classification.method,
            pages = assembled.page_count(),
            sentences = sentences.len(),
            filled_slots = entities.slots.iter().filter(|s| !s.value.is_empty()).count(),
            "Document processed"
        );

        Ok(ProcessedDocument {
            document_id,
            assembled,
            classification,
            entities,
            entities_error,
            empty_document: false,
        })
    }

    /// Run [`process`](Self::process) on the blocking pool so async callers
    /// are never stalled by OCR or inference.
    pub async fn process_async(
        self: Arc<Self>,
        pdf_bytes: Vec<u8>,
    ) -> Result<ProcessedDocument, ProcessingError> {
        tokio::task::spawn_blocking(move || self.process(&pdf_bytes))
            .await
            .map_err(|e| ProcessingError::TaskAborted(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::embedding::{EmbeddingError, EmbeddingModel, MockEmbedder};
    use crate::pipeline::extraction::{
        FailingOcrEngine, MockOcrEngine, PageLayout,
    };
    use crate::pipeline::extraction::pdfium::MockPageSource;

    fn text_page(n: usize, text: &str) -> PageLayout {
        PageLayout {
            page_number: n,
            native_text: text.to_string(),
            text_blocks: 1,
            image_count: 0,
        }
    }

    fn scanned_page(n: usize) -> PageLayout {
        PageLayout {
            page_number: n,
            image_count: 1,
            ..Default::default()
        }
    }

    fn processor(layouts: Vec<PageLayout>, ocr_text: &str) -> DocumentProcessor {
        DocumentProcessor::new(
            Box::new(MockPageSource::new(layouts)),
            Box::new(MockOcrEngine::new(ocr_text, 0.85)),
            Arc::new(MockEmbedder::new()),
            &PipelineConfig::default(),
        )
    }

    #[test]
    fn selectable_warranty_deed_end_to_end() {
        let p = processor(
            vec![text_page(
                1,
                "WARRANTY DEED. This deed is made by the grantor, Ann Lee, to the grantee, Bo Chan. The grantor conveys the land in fee simple.",
            )],
            "unused",
        );
        let doc = p.process(b"%PDF").unwrap();

        assert_eq!(doc.document_type(), DocumentType::Deed);
        assert_eq!(doc.classification.method, ClassificationMethod::Lexical);
        assert!(doc.assembled.as_str().starts_with("--- Page 1 (Text) ---"));
        assert!(!doc.empty_document);
        assert_eq!(doc.entities.slots.len(), 5);
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn scanned_mortgage_goes_through_ocr() {
        let p = processor(
            vec![scanned_page(1)],
            "MORTGAGE. The borrower grants the lender a lien on the property.",
        );
        let doc = p.process(b"%PDF").unwrap();

        assert!(doc.assembled.as_str().contains("--- Page 1 (OCR) ---"));
        assert_eq!(doc.document_type(), DocumentType::Mortgage);
        // mortgages have no slot schema
        assert!(doc.entities.is_empty());
    }

    #[test]
    fn keywordless_document_uses_semantic_fallback() {
        let p = processor(vec![text_page(1, "Lot 9, Block 4, Sunset Acres subdivision plat")], "");
        let doc = p.process(b"%PDF").unwrap();
        assert_eq!(doc.classification.method, ClassificationMethod::Semantic);
        assert!(doc.document_type().is_known());
    }

    #[test]
    fn zero_pages_is_an_empty_document_not_an_error() {
        let p = processor(Vec::new(), "");
        let doc = p.process(b"%PDF").unwrap();
        assert!(doc.empty_document);
        assert_eq!(doc.document_type(), DocumentType::Unknown);
        assert!(doc.entities.is_empty());
        assert_eq!(doc.assembled.as_str(), "");
    }

    #[test]
    fn zero_pages_are_not_attributed_to_a_classifier() {
        let doc = processor(Vec::new(), "").process(b"%PDF").unwrap();
        assert_eq!(doc.classification.method, ClassificationMethod::Skipped);
        assert!(doc.classification.keyword_scores.is_empty());
    }

    #[test]
    fn blank_page_is_classified_semantically() {
        let p = processor(vec![text_page(1, "   ")], "");
        let doc = p.process(b"%PDF").unwrap();
        assert_eq!(doc.assembled.as_str(), "--- Page 1 (Text) ---");
        assert!(!doc.empty_document);
        assert!(doc.document_type().is_known());
        assert_eq!(doc.classification.method, ClassificationMethod::Semantic);
        assert!(doc.classification.keyword_scores.iter().all(|(_, n)| *n == 0));
        assert!(doc.entities.is_empty());
    }

    #[test]
    fn blank_text_and_scanned_pages_still_classify() {
        let p = processor(vec![text_page(1, "   "), scanned_page(2)], "  \n ");
        let doc = p.process(b"%PDF").unwrap();
        assert!(!doc.empty_document);
        assert_eq!(doc.page_count(), 2);
        assert!(doc.document_type().is_known());
    }

    /// Embeds single texts and small batches, fails on any batch larger
    /// than `max_batch`.
    struct BatchLimitedEmbedder {
        inner: MockEmbedder,
        max_batch: usize,
    }

    impl EmbeddingModel for BatchLimitedEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.inner.embed(text)
        }
        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            if texts.len() > self.max_batch {
                return Err(EmbeddingError::Embedding("backend offline".into()));
            }
            self.inner.embed_batch(texts)
        }
        fn dimension(&self) -> usize {
            self.inner.dimension()
        }
    }

    #[test]
    fn entity_failure_keeps_lexical_classification() {
        let max_prompts = crate::pipeline::entities::DEED_SLOTS
            .iter()
            .map(|slot| slot.prompts.len())
            .max()
            .unwrap();
        let p = DocumentProcessor::new(
            Box::new(MockPageSource::new(vec![text_page(
                1,
                "WARRANTY DEED. The grantor conveys to the grantee in fee simple. \
                 Executed by the grantor. The grantee accepts. The land is described below. \
                 Consideration is ten dollars. Dated this first day of May.",
            )])),
            Box::new(MockOcrEngine::new("", 0.0)),
            Arc::new(BatchLimitedEmbedder {
                inner: MockEmbedder::new(),
                max_batch: max_prompts,
            }),
            &PipelineConfig::default(),
        );
        let doc = p.process(b"%PDF").unwrap();

        assert_eq!(doc.document_type(), DocumentType::Deed);
        assert_eq!(doc.classification.method, ClassificationMethod::Lexical);
        assert!(doc.entities.is_empty());
        assert!(doc
            .entities_error
            .as_deref()
            .is_some_and(|e| e.contains("backend offline")));
        assert!(doc.assembled.as_str().contains("WARRANTY DEED"));
    }

    #[test]
    fn processor_builds_without_a_working_model() {
        let p = DocumentProcessor::new(
            Box::new(MockPageSource::new(vec![text_page(1, "Release of mortgage, paid in full")])),
            Box::new(MockOcrEngine::new("", 0.0)),
            Arc::new(BatchLimitedEmbedder {
                inner: MockEmbedder::new(),
                max_batch: 0,
            }),
            &PipelineConfig::default(),
        );
        let doc = p.process(b"%PDF").unwrap();
        assert_eq!(doc.document_type(), DocumentType::Release);
        assert!(doc.entities_error.is_none());
    }

    #[test]
    fn undecodable_bytes_fail_the_document() {
        let p = DocumentProcessor::new(
            Box::new(MockPageSource::undecodable()),
            Box::new(MockOcrEngine::new("", 0.0)),
            Arc::new(MockEmbedder::new()),
            &PipelineConfig::default(),
        );
        let err = p.process(b"not a pdf").unwrap_err();
        assert!(matches!(err, ProcessingError::Extraction(ExtractionError::PdfDecode(_))));
        assert!(err.to_string().starts_with("Extraction failed"));
    }

    #[test]
    fn ocr_failure_does_not_abort_processing() {
        let p = DocumentProcessor::new(
            Box::new(MockPageSource::new(vec![
                text_page(1, "Final judgment for the plaintiff against the defendant."),
                scanned_page(2),
            ])),
            Box::new(FailingOcrEngine::new("tesseract missing")),
            Arc::new(MockEmbedder::new()),
            &PipelineConfig::default(),
        );
        let doc = p.process(b"%PDF").unwrap();
        assert_eq!(doc.document_type(), DocumentType::Judgment);
        assert_eq!(doc.assembled.failed_page_count(), 1);
        assert!(doc.assembled.as_str().contains("[Error: "));
    }

    #[test]
    fn each_document_gets_its_own_id() {
        let p = processor(vec![text_page(1, "Release of mortgage, paid in full")], "");
        let a = p.process(b"%PDF").unwrap();
        let b = p.process(b"%PDF").unwrap();
        assert_ne!(a.document_id, b.document_id);
        assert_eq!(a.assembled.as_str(), b.assembled.as_str());
    }

    #[tokio::test]
    async fn async_wrapper_runs_on_blocking_pool() {
        let p = Arc::new(processor(
            vec![text_page(1, "Satisfaction of mortgage; lien discharged and cancelled.")],
            "",
        ));
        let doc = p.process_async(b"%PDF".to_vec()).await.unwrap();
        assert_eq!(doc.document_type(), DocumentType::Release);
    }

    #[test]
    fn processor_is_shareable_across_threads() {
        let p = Arc::new(processor(
            vec![text_page(1, "Quit claim deed executed by the grantor")],
            "",
        ));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let p = Arc::clone(&p);
                std::thread::spawn(move || p.process(b"%PDF").unwrap().document_type())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), DocumentType::Deed);
        }
    }
}

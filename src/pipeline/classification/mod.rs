pub mod keywords;
pub mod lexical;
pub mod semantic;

pub use lexical::*;
pub use semantic::*;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::models::enums::{ClassificationMethod, DocumentType};
use crate::pipeline::embedding::{EmbeddingError, SharedEmbedder};

#[derive(Error, Debug)]
pub enum ClassificationError {
    #[error("Semantic classification unavailable: {0}")]
    Embedding(#[from] EmbeddingError),
}

/// Final document-type decision.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub document_type: DocumentType,
    pub method: ClassificationMethod,
    /// Keyword hit counts, always present.
    pub keyword_scores: Vec<(DocumentType, usize)>,
    /// Exemplar similarities, present only when the fallback ran.
    pub semantic_scores: Option<Vec<(DocumentType, f32)>>,
}

/// Keyword scoring first; the embedding fallback only when scoring is
/// inconclusive.
pub struct DocumentClassifier {
    semantic: SemanticClassifier,
}

impl DocumentClassifier {
    pub fn new(embedder: SharedEmbedder) -> Self {
        Self {
            semantic: SemanticClassifier::new(embedder),
        }
    }

    pub fn classify(&self, text: &str) -> Result<Classification, ClassificationError> {
        let lexical = score_keywords(text);

        if lexical.conclusive {
            info!(
                document_type = %lexical.best,
                score = lexical.score_of(lexical.best),
                method = "lexical",
                "Document classified"
            );
            return Ok(Classification {
                document_type: lexical.best,
                method: ClassificationMethod::Lexical,
                keyword_scores: lexical.scores,
                semantic_scores: None,
            });
        }

        let (document_type, similarities) = self.semantic.classify(text)?;
        info!(
            document_type = %document_type,
            method = "semantic",
            "Keyword scores inconclusive, classified by embedding similarity"
        );
        Ok(Classification {
            document_type,
            method: ClassificationMethod::Semantic,
            keyword_scores: lexical.scores,
            semantic_scores: Some(similarities),
        })
    }
}

use std::sync::OnceLock;

use tracing::debug;

use super::keywords::REFERENCE_TEXTS;
use super::ClassificationError;
use crate::models::enums::DocumentType;
use crate::pipeline::embedding::{cosine_similarity, SharedEmbedder};

/// Nearest-exemplar classifier over sentence embeddings.
///
/// Exemplar vectors are computed on the first fallback and reused for
/// every later document. A failed attempt is retried next time.
pub struct SemanticClassifier {
    embedder: SharedEmbedder,
    exemplars: OnceLock<Vec<(DocumentType, Vec<f32>)>>,
}

impl SemanticClassifier {
    pub fn new(embedder: SharedEmbedder) -> Self {
        Self {
            embedder,
            exemplars: OnceLock::new(),
        }
    }

    fn exemplars(&self) -> Result<&[(DocumentType, Vec<f32>)], ClassificationError> {
        if let Some(exemplars) = self.exemplars.get() {
            return Ok(exemplars);
        }
        let texts: Vec<&str> = REFERENCE_TEXTS.iter().map(|(_, text)| *text).collect();
        let vectors = self.embedder.embed_batch(&texts)?;
        let exemplars = REFERENCE_TEXTS
            .iter()
            .map(|(doc_type, _)| *doc_type)
            .zip(vectors)
            .collect();
        Ok(self.exemplars.get_or_init(|| exemplars))
    }

    /// Similarity of the text to each exemplar, in table order.
    pub fn similarities(
        &self,
        text: &str,
    ) -> Result<Vec<(DocumentType, f32)>, ClassificationError> {
        let exemplars = self.exemplars()?;
        let doc_vec = self.embedder.embed(text)?;
        Ok(exemplars
            .iter()
            .map(|(doc_type, exemplar)| (*doc_type, cosine_similarity(&doc_vec, exemplar)))
            .collect())
    }

    /// Pick the closest category. Always one of the five known types;
    /// no similarity floor is applied. Equal scores keep the earlier category.
    pub fn classify(
        &self,
        text: &str,
    ) -> Result<(DocumentType, Vec<(DocumentType, f32)>), ClassificationError> {
        let similarities = self.similarities(text)?;

        let mut winner = (DocumentType::CATEGORIES[0], f32::NEG_INFINITY);
        for &(doc_type, score) in &similarities {
            if score > winner.1 {
                winner = (doc_type, score);
            }
        }

        debug!(document_type = %winner.0, score = winner.1, "Semantic fallback decision");
        Ok((winner.0, similarities))
    }
}

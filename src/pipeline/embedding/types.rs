use super::EmbeddingError;

/// Sentence-embedding model abstraction.
///
/// Implementations are loaded once per process and shared read-only by
/// every in-flight document.
pub trait EmbeddingModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
    fn dimension(&self) -> usize;
}

/// Allow `Box<dyn EmbeddingModel + Send + Sync>` to be used as `&impl EmbeddingModel`.
impl EmbeddingModel for Box<dyn EmbeddingModel + Send + Sync> {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        (**self).embed(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        (**self).embed_batch(texts)
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }
}

/// Shared handle to the process-wide embedding model.
pub type SharedEmbedder = std::sync::Arc<dyn EmbeddingModel + Send + Sync>;

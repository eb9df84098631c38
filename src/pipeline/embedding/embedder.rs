use super::types::EmbeddingModel;
use super::EmbeddingError;

/// Standard embedding dimension for all-MiniLM-L6-v2
pub const EMBEDDING_DIM: usize = 384;

/// Longest token sequence fed to the model; longer inputs are truncated.
pub const MAX_SEQUENCE_TOKENS: usize = 256;

// ═══════════════════════════════════════════════════════════
// ONNX embedder, behind the `onnx-embeddings` feature
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx-embeddings")]
mod onnx {
    use super::{EmbeddingError, EmbeddingModel, EMBEDDING_DIM, MAX_SEQUENCE_TOKENS};
    use ort::session::Session;
    use std::path::Path;
    use std::sync::Mutex;

    /// all-MiniLM-L6-v2 inference through ONNX Runtime.
    ///
    /// Requires two files in the model directory:
    /// - `model.onnx`: the ONNX model weights
    /// - `tokenizer.json`: HuggingFace tokenizer definition
    ///
    /// `ort::Session::run` takes `&mut self`, hence the Mutex.
    pub struct OnnxEmbedder {
        session: Mutex<Session>,
        tokenizer: tokenizers::Tokenizer,
    }

    impl OnnxEmbedder {
        /// Load the ONNX embedding model from a directory.
        pub fn load(model_dir: &Path) -> Result<Self, EmbeddingError> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");

            if !model_path.exists() {
                return Err(EmbeddingError::ModelNotFound(model_path));
            }
            if !tokenizer_path.exists() {
                return Err(EmbeddingError::ModelNotFound(tokenizer_path));
            }

            let session = Session::builder()
                .map_err(|e: ort::Error| EmbeddingError::ModelInit(e.to_string()))?
                .with_intra_threads(2)
                .map_err(|e: ort::Error| EmbeddingError::ModelInit(e.to_string()))?
                .commit_from_file(&model_path)
                .map_err(|e: ort::Error| {
                    EmbeddingError::ModelInit(format!("ONNX load failed: {e}"))
                })?;

            let mut tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| EmbeddingError::ModelInit(format!("Tokenizer load failed: {e}")))?;

            // Whole-document inputs easily exceed the model's position table.
            tokenizer
                .with_truncation(Some(tokenizers::TruncationParams {
                    max_length: MAX_SEQUENCE_TOKENS,
                    ..Default::default()
                }))
                .map_err(|e| EmbeddingError::ModelInit(format!("Truncation setup: {e}")))?;

            tracing::info!(model_dir = %model_dir.display(), "ONNX embedder loaded");

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
            })
        }

        fn infer(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| EmbeddingError::Tokenization(e.to_string()))?;
            let widen = |values: &[u32]| -> Vec<i64> { values.iter().map(|&v| v as i64).collect() };
            let mask = widen(encoding.get_attention_mask());
            let seq_len = mask.len();

            let matrix = |values: Vec<i64>| {
                ndarray::Array2::from_shape_vec((1, seq_len), values)
                    .map_err(|e| EmbeddingError::Embedding(e.to_string()))
            };
            let ids = matrix(widen(encoding.get_ids()))?;
            let attention = matrix(mask.clone())?;
            let type_ids = matrix(widen(encoding.get_type_ids()))?;

            let ids = tensor(&ids)?;
            let attention = tensor(&attention)?;
            let type_ids = tensor(&type_ids)?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| EmbeddingError::Embedding("Session lock poisoned".to_string()))?;
            let outputs = session
                .run(ort::inputs![ids, attention, type_ids])
                .map_err(|e| EmbeddingError::Embedding(format!("ONNX inference failed: {e}")))?;

            let (shape, hidden) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| EmbeddingError::Embedding(format!("Output extraction: {e}")))?;
            if shape.len() != 3 || shape[2] as usize != EMBEDDING_DIM {
                return Err(EmbeddingError::Embedding(format!(
                    "Unexpected output shape: {shape:?}, expected [1, {seq_len}, {EMBEDDING_DIM}]"
                )));
            }

            let mut pooled = super::mean_pool(hidden, &mask, EMBEDDING_DIM);
            crate::pipeline::embedding::similarity::l2_normalize(&mut pooled);
            Ok(pooled)
        }
    }

    fn tensor(
        array: &ndarray::Array2<i64>,
    ) -> Result<ort::value::TensorRef<'_, i64>, EmbeddingError> {
        ort::value::TensorRef::from_array_view(array)
            .map_err(|e| EmbeddingError::Embedding(e.to_string()))
    }

    impl EmbeddingModel for OnnxEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.infer(text)
        }

        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            texts.iter().map(|t| self.infer(t)).collect()
        }

        fn dimension(&self) -> usize {
            EMBEDDING_DIM
        }
    }
}

#[cfg(feature = "onnx-embeddings")]
pub use onnx::OnnxEmbedder;

/// Average the token rows of `hidden` whose mask is set.
#[cfg_attr(not(feature = "onnx-embeddings"), allow(dead_code))]
fn mean_pool(hidden: &[f32], mask: &[i64], dim: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; dim];
    let mut kept = 0.0f32;
    for (row, _) in hidden.chunks_exact(dim).zip(mask).filter(|(_, &m)| m != 0) {
        kept += 1.0;
        for (p, v) in pooled.iter_mut().zip(row) {
            *p += v;
        }
    }
    if kept > 0.0 {
        pooled.iter_mut().for_each(|p| *p /= kept);
    }
    pooled
}

/// Mock embedding model for testing: hashed bag of words.
///
/// Texts that share words point in similar directions, so keyword-heavy
/// passages land near the matching reference text without a real model.
pub struct MockEmbedder {
    dimension: usize,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            dimension: EMBEDDING_DIM,
        }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingModel for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(hashed_bag_of_words(text, self.dimension))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|t| hashed_bag_of_words(t, self.dimension))
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// FNV-1a hash of each lowercased alphanumeric word into a bucket, L2 normalized.
fn hashed_bag_of_words(text: &str, dim: usize) -> Vec<f32> {
    let mut vec = vec![0.0f32; dim];

    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in word.to_lowercase().bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        vec[(hash % dim as u64) as usize] += 1.0;
    }

    super::similarity::l2_normalize(&mut vec);
    vec
}

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use serde::Serialize;
use tracing::debug;

use super::schema::{entity_schema, EntitySlot};
use super::segment::clean_sentences;
use super::EntityError;
use crate::models::enums::DocumentType;
use crate::pipeline::embedding::{best_match, mean_vector, SharedEmbedder};

/// Similarity the best sentence must exceed to fill a slot.
pub const DEFAULT_MIN_SIMILARITY: f32 = 0.5;

/// One filled (or rejected) slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySlotValue {
    pub name: String,
    /// Full text of the matched sentence, or empty when nothing cleared the threshold.
    pub value: String,
    /// Best similarity seen for this slot.
    pub score: f32,
}

/// Slot values for one document, in schema order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedEntities {
    pub slots: Vec<EntitySlotValue>,
}

impl ExtractedEntities {
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.slots
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.value.as_str())
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.slots
            .iter()
            .map(|s| (s.name.clone(), s.value.clone()))
            .collect()
    }
}

struct PromptVector {
    name: &'static str,
    vector: Vec<f32>,
}

/// Fills entity slots with the sentence closest to each slot's averaged
/// prompt embedding.
pub struct EntityMatcher {
    embedder: SharedEmbedder,
    min_similarity: f32,
    prompts: OnceLock<HashMap<DocumentType, Vec<PromptVector>>>,
}

impl EntityMatcher {
    pub fn new(embedder: SharedEmbedder) -> Self {
        Self::with_threshold(embedder, DEFAULT_MIN_SIMILARITY)
    }

    pub fn with_threshold(embedder: SharedEmbedder, min_similarity: f32) -> Self {
        Self {
            embedder,
            min_similarity,
            prompts: OnceLock::new(),
        }
    }

    /// Averaged prompt vectors for every schema, embedded on first use and
    /// kept for the matcher's lifetime. A failed attempt is retried next call.
    fn prompt_vectors(
        &self,
    ) -> Result<&HashMap<DocumentType, Vec<PromptVector>>, EntityError> {
        if let Some(prompts) = self.prompts.get() {
            return Ok(prompts);
        }
        let mut prompts = HashMap::new();
        for doc_type in DocumentType::CATEGORIES {
            if let Some(slots) = entity_schema(doc_type) {
                prompts.insert(doc_type, embed_slots(&self.embedder, slots)?);
            }
        }
        Ok(self.prompts.get_or_init(|| prompts))
    }

    /// Match slots against already-cleaned sentences.
    ///
    /// No sentences, or a type without a schema, yields an empty result
    /// without touching the model.
    pub fn extract(
        &self,
        sentences: &[String],
        doc_type: DocumentType,
    ) -> Result<ExtractedEntities, EntityError> {
        if entity_schema(doc_type).is_none() {
            debug!(document_type = %doc_type, "No entity schema");
            return Ok(ExtractedEntities::default());
        }
        if sentences.is_empty() {
            debug!(document_type = %doc_type, "No candidate sentences");
            return Ok(ExtractedEntities::default());
        }
        let Some(prompts) = self.prompt_vectors()?.get(&doc_type) else {
            return Ok(ExtractedEntities::default());
        };

        // One embedding pass per document; every slot compares against it.
        let refs: Vec<&str> = sentences.iter().map(String::as_str).collect();
        let sentence_vectors = self.embedder.embed_batch(&refs)?;

        let slots = prompts
            .iter()
            .map(|prompt| {
                let (index, score) =
                    best_match(&prompt.vector, &sentence_vectors).unwrap_or((0, 0.0));
                let value = if score > self.min_similarity {
                    sentences[index].clone()
                } else {
                    debug!(slot = prompt.name, score, "Best sentence below threshold");
                    String::new()
                };
                EntitySlotValue {
                    name: prompt.name.to_string(),
                    value,
                    score,
                }
            })
            .collect();

        Ok(ExtractedEntities { slots })
    }

    /// Segment, filter and match in one step.
    pub fn extract_from_text(
        &self,
        text: &str,
        doc_type: DocumentType,
    ) -> Result<ExtractedEntities, EntityError> {
        let sentences = clean_sentences(text);
        self.extract(&sentences, doc_type)
    }
}

fn embed_slots(
    embedder: &SharedEmbedder,
    slots: &[EntitySlot],
) -> Result<Vec<PromptVector>, EntityError> {
    slots
        .iter()
        .map(|slot| {
            let variants = embedder.embed_batch(slot.prompts)?;
            let vector = mean_vector(&variants).ok_or(EntityError::EmptyPromptSet(slot.name))?;
            Ok(PromptVector {
                name: slot.name,
                vector,
            })
        })
        .collect()
}

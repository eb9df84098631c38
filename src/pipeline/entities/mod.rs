pub mod schema;
pub mod segment;
pub mod matcher;

pub use schema::*;
pub use segment::*;
pub use matcher::*;

use thiserror::Error;

use crate::pipeline::embedding::EmbeddingError;

#[derive(Error, Debug)]
pub enum EntityError {
    #[error("Entity matching unavailable: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Slot {0} has no prompt variants")]
    EmptyPromptSet(&'static str),
}

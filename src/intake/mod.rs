//! Collaborators around the core pipeline and the two intake flows
//! (upload, labeling task) that drive it.

pub mod object_store;
pub mod metadata_store;
pub mod annotation;
pub mod service;

pub use object_store::*;
pub use metadata_store::*;
pub use annotation::*;
pub use service::*;

use thiserror::Error;

use crate::pipeline::processor::ProcessingError;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Invalid file type. Only PDF files are accepted.")]
    InvalidFileType,

    #[error("Uploaded file is empty.")]
    EmptyFile,

    #[error("Invalid object key: {0}")]
    InvalidObjectKey(String),

    #[error("Text or entity extraction failed: {0}")]
    Processing(#[from] ProcessingError),

    #[error("Object store error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Label Studio not reachable at {0}")]
    AnnotationConnection(String),

    #[error("Label Studio API error: {0}")]
    AnnotationHttp(String),

    #[error("Label Studio returned {status}: {body}")]
    AnnotationStatus { status: u16, body: String },
}

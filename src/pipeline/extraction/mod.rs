pub mod types;
pub mod analyzer;
pub mod preprocess;
pub mod ocr;
pub mod pdfium;
pub mod assembler;
pub mod sanitize;

pub use types::*;
pub use analyzer::*;
pub use ocr::*;
pub use assembler::*;
pub use sanitize::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Document could not be decoded as PDF: {0}")]
    PdfDecode(String),

    #[error("PDFium library unavailable: {0}")]
    PdfLibrary(String),

    #[error("Page {page} rendering failed: {reason}")]
    PdfRendering { page: usize, reason: String },

    #[error("Page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("Tesseract OCR initialization failed: {0}")]
    OcrInit(String),

    #[error("OCR processing failed: {0}")]
    OcrProcessing(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Tessdata not found at: {0}")]
    TessdataNotFound(PathBuf),
}

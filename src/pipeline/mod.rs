pub mod extraction; // Text-layer decision, OCR fallback, page assembly
pub mod embedding;
pub mod classification; // Keyword scoring with embedding fallback
pub mod entities; // Sentence segmentation and semantic slot matching
pub mod processor;

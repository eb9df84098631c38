use serde::{Deserialize, Serialize};

use super::ExtractionError;
use crate::models::enums::ExtractionMethod;

/// Structural facts about one PDF page, gathered when the document is decoded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    /// 1-based page number.
    pub page_number: usize,
    /// Text layer as reported by the PDF, possibly empty.
    pub native_text: String,
    /// Text objects carrying at least one visible character.
    pub text_blocks: usize,
    /// Embedded raster images drawn on the page.
    pub image_count: usize,
}

/// Outcome of the text-layer decision for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    NativeText,
    Scanned,
}

/// Where a page's contribution to the assembled text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum FragmentSource {
    Extracted { method: ExtractionMethod },
    Failed { reason: String },
}

/// One page's text, tagged with its number and extraction method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFragment {
    pub page_number: usize,
    pub source: FragmentSource,
    pub text: String,
}

impl PageFragment {
    pub fn native(page_number: usize, text: &str) -> Self {
        Self {
            page_number,
            source: FragmentSource::Extracted {
                method: ExtractionMethod::Text,
            },
            text: text.trim().to_string(),
        }
    }

    pub fn ocr(page_number: usize, text: &str) -> Self {
        Self {
            page_number,
            source: FragmentSource::Extracted {
                method: ExtractionMethod::Ocr,
            },
            text: text.trim().to_string(),
        }
    }

    /// A page whose recovery failed. The reason is embedded inline so
    /// downstream stages see a flagged fragment instead of a gap.
    pub fn failed(page_number: usize, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            page_number,
            text: format!("[Error: {reason}]"),
            source: FragmentSource::Failed { reason },
        }
    }

    pub fn method(&self) -> Option<ExtractionMethod> {
        match &self.source {
            FragmentSource::Extracted { method } => Some(*method),
            FragmentSource::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.source, FragmentSource::Failed { .. })
    }

    /// `--- Page <n> (Text|OCR) ---`, or `--- Page <n> ---` for failed pages.
    pub fn marker(&self) -> String {
        match self.method() {
            Some(method) => format!("--- Page {} ({}) ---", self.page_number, method.as_str()),
            None => format!("--- Page {} ---", self.page_number),
        }
    }
}

/// The ordered, page-marked reconstruction of a document.
///
/// Immutable once built; the marked string is the canonical input for
/// classification and entity extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssembledText {
    fragments: Vec<PageFragment>,
    text: String,
}

impl AssembledText {
    /// The result for a document without pages.
    pub fn empty() -> Self {
        Self {
            fragments: Vec::new(),
            text: String::new(),
        }
    }

    /// Build from fragments, ordering them by page number.
    pub fn from_fragments(mut fragments: Vec<PageFragment>) -> Self {
        fragments.sort_by_key(|f| f.page_number);

        let mut text = String::new();
        for fragment in &fragments {
            text.push_str(&fragment.marker());
            text.push('\n');
            text.push_str(&fragment.text);
            text.push_str("\n\n");
        }

        Self {
            text: text.trim().to_string(),
            fragments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn fragments(&self) -> &[PageFragment] {
        &self.fragments
    }

    pub fn page_count(&self) -> usize {
        self.fragments.len()
    }

    /// True only for a document with zero pages. Blank pages still carry
    /// their markers and count as content.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn ocr_page_count(&self) -> usize {
        self.fragments
            .iter()
            .filter(|f| f.method() == Some(ExtractionMethod::Ocr))
            .count()
    }

    pub fn failed_page_count(&self) -> usize {
        self.fragments.iter().filter(|f| f.is_failed()).count()
    }
}

/// Raw OCR result from the engine
#[derive(Debug, Clone)]
pub struct OcrPageResult {
    pub text: String,
    pub confidence: f32,
}

/// OCR engine abstraction (allows mocking for tests)
pub trait OcrEngine {
    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError>;

    fn ocr_image_with_lang(
        &self,
        image_bytes: &[u8],
        lang: &str,
    ) -> Result<OcrPageResult, ExtractionError>;
}

/// Per-page access to a PDF held in memory.
pub trait PdfPageSource {
    /// Decode the document and describe every page, in order.
    /// A document that cannot be decoded is an error for the whole document.
    fn analyze(&self, pdf_bytes: &[u8]) -> Result<Vec<PageLayout>, ExtractionError>;

    /// Rasterise one page (1-based) to PNG at the given resolution.
    fn render_page(
        &self,
        pdf_bytes: &[u8],
        page_number: usize,
        dpi: u32,
    ) -> Result<Vec<u8>, ExtractionError>;
}

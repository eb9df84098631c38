use super::preprocess::to_grayscale_png;
use super::types::{OcrEngine, OcrPageResult, PdfPageSource};
use super::ExtractionError;

/// Resolution used when rasterising scanned pages for OCR.
pub const OCR_RENDER_DPI: u32 = 300;

/// Default OCR language (English land records).
pub const DEFAULT_OCR_LANGUAGE: &str = "eng";

/// Bundled Tesseract OCR engine.
/// Only available when compiled with the `ocr` feature flag.
#[cfg(feature = "ocr")]
pub struct TesseractEngine {
    tessdata_dir: std::path::PathBuf,
    default_lang: String,
}

#[cfg(feature = "ocr")]
impl TesseractEngine {
    /// Initialize with a tessdata directory containing `eng.traineddata`.
    pub fn new(tessdata_dir: &std::path::Path) -> Result<Self, ExtractionError> {
        if !tessdata_dir.join("eng.traineddata").exists() {
            return Err(ExtractionError::TessdataNotFound(tessdata_dir.to_path_buf()));
        }

        tracing::info!(tessdata = %tessdata_dir.display(), "Tesseract engine ready");

        Ok(Self {
            tessdata_dir: tessdata_dir.to_path_buf(),
            default_lang: DEFAULT_OCR_LANGUAGE.to_string(),
        })
    }

    /// Set language(s) for OCR (e.g., "eng", "eng+spa")
    pub fn with_languages(mut self, langs: &str) -> Self {
        self.default_lang = langs.to_string();
        self
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for TesseractEngine {
    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        self.ocr_image_with_lang(image_bytes, &self.default_lang)
    }

    fn ocr_image_with_lang(
        &self,
        image_bytes: &[u8],
        lang: &str,
    ) -> Result<OcrPageResult, ExtractionError> {
        let tessdata_str = self
            .tessdata_dir
            .to_str()
            .ok_or_else(|| ExtractionError::OcrInit("Invalid tessdata path".into()))?;

        let mut tess = tesseract::Tesseract::new(Some(tessdata_str), Some(lang))
            .map_err(|e| ExtractionError::OcrInit(format!("{e:?}")))?
            .set_image_from_mem(image_bytes)
            .map_err(|e| ExtractionError::OcrProcessing(format!("{e:?}")))?;

        let text = tess
            .get_text()
            .map_err(|e| ExtractionError::OcrProcessing(format!("{e:?}")))?;

        let confidence = tess.mean_text_conf().max(0) as f32 / 100.0;

        Ok(OcrPageResult { text, confidence })
    }
}

/// Mock OCR engine for unit testing without Tesseract.
pub struct MockOcrEngine {
    pub text: String,
    pub confidence: f32,
}

impl MockOcrEngine {
    pub fn new(text: &str, confidence: f32) -> Self {
        Self {
            text: text.to_string(),
            confidence,
        }
    }
}

impl OcrEngine for MockOcrEngine {
    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        self.ocr_image_with_lang(image_bytes, DEFAULT_OCR_LANGUAGE)
    }

    fn ocr_image_with_lang(
        &self,
        _image_bytes: &[u8],
        _lang: &str,
    ) -> Result<OcrPageResult, ExtractionError> {
        Ok(OcrPageResult {
            text: self.text.clone(),
            confidence: self.confidence,
        })
    }
}

/// OCR engine that always fails; stands in for a missing or crashed backend.
pub struct FailingOcrEngine {
    reason: String,
}

impl FailingOcrEngine {
    pub fn new(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

impl OcrEngine for FailingOcrEngine {
    fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
        self.ocr_image_with_lang(image_bytes, DEFAULT_OCR_LANGUAGE)
    }

    fn ocr_image_with_lang(
        &self,
        _image_bytes: &[u8],
        _lang: &str,
    ) -> Result<OcrPageResult, ExtractionError> {
        Err(ExtractionError::OcrProcessing(self.reason.clone()))
    }
}

/// Recover the text of one scanned page: render at `dpi`, flatten to
/// grayscale, then hand the raster to the OCR backend in `lang`.
///
/// The rendered image lives only for the duration of this call.
pub fn ocr_page(
    source: &dyn PdfPageSource,
    engine: &dyn OcrEngine,
    pdf_bytes: &[u8],
    page_number: usize,
    dpi: u32,
    lang: &str,
) -> Result<OcrPageResult, ExtractionError> {
    let rendered = source.render_page(pdf_bytes, page_number, dpi)?;
    let gray = to_grayscale_png(&rendered)?;
    let result = engine.ocr_image_with_lang(&gray, lang)?;

    tracing::debug!(
        page = page_number,
        dpi,
        lang,
        confidence = result.confidence,
        chars = result.text.len(),
        "OCR page complete"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::pdfium::MockPageSource;
    use crate::pipeline::extraction::types::PageLayout;
    use std::sync::Mutex;

    /// Records the image bytes and language it was called with.
    struct RecordingOcrEngine {
        calls: Mutex<Vec<(Vec<u8>, String)>>,
    }

    impl OcrEngine for RecordingOcrEngine {
        fn ocr_image(&self, image_bytes: &[u8]) -> Result<OcrPageResult, ExtractionError> {
            self.ocr_image_with_lang(image_bytes, DEFAULT_OCR_LANGUAGE)
        }

        fn ocr_image_with_lang(
            &self,
            image_bytes: &[u8],
            lang: &str,
        ) -> Result<OcrPageResult, ExtractionError> {
            self.calls
                .lock()
                .unwrap()
                .push((image_bytes.to_vec(), lang.to_string()));
            Ok(OcrPageResult {
                text: "QUIT CLAIM DEED".into(),
                confidence: 0.8,
            })
        }
    }

    fn scanned_source(pages: usize) -> MockPageSource {
        MockPageSource::new(
            (1..=pages)
                .map(|n| PageLayout {
                    page_number: n,
                    image_count: 1,
                    ..Default::default()
                })
                .collect(),
        )
    }

    #[test]
    fn mock_ocr_returns_configured_text() {
        let engine = MockOcrEngine::new("Parcel ID 12-3456", 0.92);
        let result = engine.ocr_image(b"fake_image_bytes").unwrap();
        assert_eq!(result.text, "Parcel ID 12-3456");
        assert!((result.confidence - 0.92).abs() < f32::EPSILON);
    }

    #[test]
    fn failing_ocr_reports_reason() {
        let engine = FailingOcrEngine::new("tesseract exited");
        let err = engine.ocr_image(b"fake").unwrap_err();
        assert!(err.to_string().contains("tesseract exited"));
    }

    #[test]
    fn ocr_page_feeds_grayscale_png_in_requested_language() {
        let source = scanned_source(1);
        let engine = RecordingOcrEngine {
            calls: Mutex::new(Vec::new()),
        };

        let result = ocr_page(&source, &engine, b"%PDF", 1, OCR_RENDER_DPI, "eng").unwrap();
        assert_eq!(result.text, "QUIT CLAIM DEED");

        let calls = engine.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, "eng");
        let decoded = image::load_from_memory(&calls[0].0).unwrap();
        assert!(matches!(decoded, image::DynamicImage::ImageLuma8(_)));
    }

    #[test]
    fn ocr_page_propagates_render_failure() {
        let source = scanned_source(1);
        let engine = MockOcrEngine::new("unused", 0.0);
        let err = ocr_page(&source, &engine, b"%PDF", 4, OCR_RENDER_DPI, "eng").unwrap_err();
        assert!(matches!(err, ExtractionError::PageOutOfRange { page: 4, .. }));
    }

    #[cfg(feature = "ocr")]
    #[test]
    fn tesseract_rejects_missing_tessdata() {
        let dir = tempfile::tempdir().unwrap();
        let result = TesseractEngine::new(dir.path());
        assert!(matches!(result, Err(ExtractionError::TessdataNotFound(_))));
    }
}

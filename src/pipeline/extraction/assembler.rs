use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, info, warn};

use super::analyzer::classify_page;
use super::ocr::ocr_page;
use super::types::{AssembledText, OcrEngine, PageFragment, PageKind, PageLayout, PdfPageSource};
use super::ExtractionError;
use crate::config::PipelineConfig;

/// Drives the text-layer decision and OCR fallback across every page of a
/// document and stitches the results into one page-marked text.
pub struct HybridTextAssembler {
    source: Box<dyn PdfPageSource + Send + Sync>,
    ocr: Box<dyn OcrEngine + Send + Sync>,
    min_native_text_chars: usize,
    dpi: u32,
    language: String,
    max_workers: usize,
}

impl HybridTextAssembler {
    pub fn new(
        source: Box<dyn PdfPageSource + Send + Sync>,
        ocr: Box<dyn OcrEngine + Send + Sync>,
    ) -> Self {
        Self::with_config(source, ocr, &PipelineConfig::default())
    }

    pub fn with_config(
        source: Box<dyn PdfPageSource + Send + Sync>,
        ocr: Box<dyn OcrEngine + Send + Sync>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            source,
            ocr,
            min_native_text_chars: config.min_native_text_chars,
            dpi: config.ocr_dpi,
            language: config.ocr_language.clone(),
            max_workers: config.max_page_workers.max(1),
        }
    }

    /// Reconstruct the document text.
    ///
    /// A document that cannot be decoded fails as a whole. OCR failures on
    /// individual pages are recorded inline as `[Error: ...]` fragments.
    pub fn assemble(&self, pdf_bytes: &[u8]) -> Result<AssembledText, ExtractionError> {
        let layouts = self.source.analyze(pdf_bytes)?;
        if layouts.is_empty() {
            info!("Document has no pages");
            return Ok(AssembledText::empty());
        }

        let workers = self.max_workers.min(layouts.len());
        let fragments = if workers <= 1 {
            layouts
                .iter()
                .map(|layout| self.extract_page(pdf_bytes, layout))
                .collect()
        } else {
            self.extract_concurrently(pdf_bytes, &layouts, workers)
        };

        let assembled = AssembledText::from_fragments(fragments);
        info!(
            pages = assembled.page_count(),
            ocr_pages = assembled.ocr_page_count(),
            failed_pages = assembled.failed_page_count(),
            chars = assembled.as_str().len(),
            "Document text assembled"
        );
        Ok(assembled)
    }

    /// Fan pages out over scoped workers and merge the results back into
    /// page order. Workers claim page indices from a shared counter.
    fn extract_concurrently(
        &self,
        pdf_bytes: &[u8],
        layouts: &[PageLayout],
        workers: usize,
    ) -> Vec<PageFragment> {
        let next = AtomicUsize::new(0);
        let mut slots: Vec<Option<PageFragment>> = vec![None; layouts.len()];

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    scope.spawn(|| {
                        let mut done = Vec::new();
                        loop {
                            let index = next.fetch_add(1, Ordering::Relaxed);
                            let Some(layout) = layouts.get(index) else {
                                break;
                            };
                            done.push((index, self.extract_page(pdf_bytes, layout)));
                        }
                        done
                    })
                })
                .collect();

            for handle in handles {
                match handle.join() {
                    Ok(done) => {
                        for (index, fragment) in done {
                            slots[index] = Some(fragment);
                        }
                    }
                    Err(_) => warn!("Page worker panicked"),
                }
            }
        });

        slots
            .into_iter()
            .zip(layouts)
            .map(|(slot, layout)| {
                slot.unwrap_or_else(|| {
                    PageFragment::failed(layout.page_number, "page worker did not complete")
                })
            })
            .collect()
    }

    fn extract_page(&self, pdf_bytes: &[u8], layout: &PageLayout) -> PageFragment {
        let page = layout.page_number;
        match classify_page(layout, self.min_native_text_chars) {
            PageKind::NativeText => {
                debug!(page, method = "Text", "Using native text layer");
                PageFragment::native(page, &layout.native_text)
            }
            PageKind::Scanned => {
                debug!(page, method = "OCR", "No usable text layer, falling back to OCR");
                match ocr_page(
                    self.source.as_ref(),
                    self.ocr.as_ref(),
                    pdf_bytes,
                    page,
                    self.dpi,
                    &self.language,
                ) {
                    Ok(result) => PageFragment::ocr(page, &result.text),
                    Err(e) => {
                        warn!(page, error = %e, "OCR failed, recording inline error");
                        PageFragment::failed(page, e.to_string())
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::ExtractionMethod;
    use crate::pipeline::extraction::ocr::{FailingOcrEngine, MockOcrEngine};
    use crate::pipeline::extraction::pdfium::MockPageSource;

    fn text_page(n: usize, text: &str) -> PageLayout {
        PageLayout {
            page_number: n,
            native_text: text.to_string(),
            text_blocks: 1,
            image_count: 0,
        }
    }

    fn scanned_page(n: usize) -> PageLayout {
        PageLayout {
            page_number: n,
            native_text: String::new(),
            text_blocks: 0,
            image_count: 1,
        }
    }

    fn assembler(layouts: Vec<PageLayout>, ocr_text: &str, workers: usize) -> HybridTextAssembler {
        let config = PipelineConfig {
            max_page_workers: workers,
            ..PipelineConfig::default()
        };
        HybridTextAssembler::with_config(
            Box::new(MockPageSource::new(layouts)),
            Box::new(MockOcrEngine::new(ocr_text, 0.9)),
            &config,
        )
    }

    #[test]
    fn selectable_deed_uses_text_layer() {
        let a = assembler(
            vec![text_page(
                1,
                "WARRANTY DEED. The grantor conveys to the grantee in fee simple.",
            )],
            "should not be used",
            1,
        );
        let assembled = a.assemble(b"%PDF").unwrap();
        assert!(assembled.as_str().starts_with("--- Page 1 (Text) ---\nWARRANTY DEED"));
        assert_eq!(assembled.ocr_page_count(), 0);
        assert!(!assembled.as_str().contains("should not be used"));
    }

    #[test]
    fn photographed_page_goes_through_ocr() {
        let a = assembler(vec![scanned_page(1)], "MORTGAGE between borrower and lender", 1);
        let assembled = a.assemble(b"%PDF").unwrap();
        assert_eq!(
            assembled.as_str(),
            "--- Page 1 (OCR) ---\nMORTGAGE between borrower and lender"
        );
        assert_eq!(
            assembled.fragments()[0].method(),
            Some(ExtractionMethod::Ocr)
        );
    }

    #[test]
    fn markers_follow_page_order_with_many_workers() {
        let layouts: Vec<PageLayout> = (1..=24)
            .map(|n| {
                if n % 3 == 0 {
                    scanned_page(n)
                } else {
                    text_page(n, &format!("page {n} recorded text of the instrument"))
                }
            })
            .collect();
        let a = assembler(layouts, "scanned text", 6);
        let assembled = a.assemble(b"%PDF").unwrap();

        let numbers: Vec<usize> = assembled.fragments().iter().map(|f| f.page_number).collect();
        assert_eq!(numbers, (1..=24).collect::<Vec<_>>());

        let mut last = 0;
        for n in 1..=24 {
            let pos = assembled
                .as_str()
                .find(&format!("--- Page {n} ("))
                .unwrap_or_else(|| panic!("marker for page {n} missing"));
            assert!(pos >= last, "page {n} out of order");
            last = pos;
        }
        assert_eq!(assembled.ocr_page_count(), 8);
    }

    #[test]
    fn concurrent_and_sequential_output_identical() {
        let layouts: Vec<PageLayout> = (1..=10)
            .map(|n| {
                if n % 2 == 0 {
                    scanned_page(n)
                } else {
                    text_page(n, "Lis pendens notice filed")
                }
            })
            .collect();
        let sequential = assembler(layouts.clone(), "ocr", 1).assemble(b"%PDF").unwrap();
        let concurrent = assembler(layouts, "ocr", 4).assemble(b"%PDF").unwrap();
        assert_eq!(sequential.as_str(), concurrent.as_str());
    }

    #[test]
    fn repeated_runs_are_byte_identical() {
        let layouts = vec![text_page(1, "Satisfaction of mortgage, paid in full"), scanned_page(2)];
        let a = assembler(layouts, "Recorded by the clerk", 2);
        let first = a.assemble(b"%PDF").unwrap();
        let second = a.assemble(b"%PDF").unwrap();
        assert_eq!(first.as_str(), second.as_str());
    }

    #[test]
    fn ocr_failure_is_recorded_inline() {
        let a = HybridTextAssembler::new(
            Box::new(MockPageSource::new(vec![
                text_page(1, "Final judgment in favor of the plaintiff"),
                scanned_page(2),
            ])),
            Box::new(FailingOcrEngine::new("engine crashed")),
        );
        let assembled = a.assemble(b"%PDF").unwrap();
        assert!(assembled
            .as_str()
            .contains("--- Page 2 ---\n[Error: OCR processing failed: engine crashed]"));
        assert_eq!(assembled.failed_page_count(), 1);
        assert_eq!(assembled.page_count(), 2);
    }

    #[test]
    fn render_failure_only_affects_its_page() {
        let source =
            MockPageSource::new(vec![scanned_page(1), scanned_page(2)]).with_render_failure(1);
        let a = HybridTextAssembler::new(Box::new(source), Box::new(MockOcrEngine::new("ok", 0.8)));
        let assembled = a.assemble(b"%PDF").unwrap();
        assert!(assembled.fragments()[0].is_failed());
        assert_eq!(assembled.fragments()[1].text, "ok");
    }

    #[test]
    fn zero_pages_yield_empty_text() {
        let a = assembler(Vec::new(), "unused", 4);
        let assembled = a.assemble(b"%PDF").unwrap();
        assert!(assembled.is_empty());
        assert_eq!(assembled.page_count(), 0);
    }

    #[test]
    fn undecodable_document_is_fatal() {
        let a = HybridTextAssembler::new(
            Box::new(MockPageSource::undecodable()),
            Box::new(MockOcrEngine::new("unused", 0.0)),
        );
        assert!(matches!(
            a.assemble(b"garbage"),
            Err(ExtractionError::PdfDecode(_))
        ));
    }
}

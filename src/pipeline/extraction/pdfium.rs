//! PDF page access via Google PDFium.
//!
//! Supplies the text layer, object inventory and rasterised image of each
//! page. `PdfiumPageSource` is stateless (`Send + Sync`). Each operation
//! creates a fresh `Pdfium` instance because the upstream type is `!Send`.
//! The OS caches `dlopen`/`LoadLibrary` calls, so repeat loads are near-free.

use std::io::Cursor;

use image::ImageOutputFormat;
use pdfium_render::prelude::*;
use tracing::{debug, warn};

use super::types::{PageLayout, PdfPageSource};
use super::ExtractionError;

/// Maximum dimension (width or height) for rendered page images.
/// Prevents OOM on extremely large pages or absurd DPI settings.
const MAX_DIMENSION_PX: u32 = 4096;

/// PDF points per inch (standard PDF unit).
const POINTS_PER_INCH: f32 = 72.0;

/// Reads and renders PDF pages using Google PDFium.
pub struct PdfiumPageSource;

impl PdfiumPageSource {
    /// Create a new page source, verifying the PDFium library is loadable.
    pub fn new() -> Result<Self, ExtractionError> {
        let _ = load_pdfium()?;
        Ok(Self)
    }
}

/// Load the PDFium dynamic library.
///
/// Discovery order:
/// 1. `PDFIUM_DYNAMIC_LIB_PATH` env var (explicit path)
/// 2. Alongside the running executable, or in `<exe_dir>/lib`
/// 3. System library search paths
fn load_pdfium() -> Result<Pdfium, ExtractionError> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        debug!(path = %path, "Loading PDFium from env var");
        let bindings = Pdfium::bind_to_library(&path).map_err(|e| {
            ExtractionError::PdfLibrary(format!("Failed to load PDFium from {path}: {e}"))
        })?;
        return Ok(Pdfium::new(bindings));
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(exe_dir) = exe.parent() {
            for dir in [exe_dir.to_path_buf(), exe_dir.join("lib")] {
                let lib_path =
                    Pdfium::pdfium_platform_library_name_at_path(dir.to_string_lossy().as_ref());
                if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
                    debug!(dir = %dir.display(), "Loaded PDFium from candidate directory");
                    return Ok(Pdfium::new(bindings));
                }
            }
        }
    }

    let bindings = Pdfium::bind_to_system_library().map_err(|e| {
        ExtractionError::PdfLibrary(format!(
            "PDFium library not found. Set PDFIUM_DYNAMIC_LIB_PATH or install PDFium: {e}"
        ))
    })?;
    Ok(Pdfium::new(bindings))
}

/// Map PDF load errors; password-protected files get a readable reason.
fn map_load_error(e: PdfiumError) -> ExtractionError {
    let msg = format!("{e}");
    let lower = msg.to_lowercase();
    if lower.contains("password") || lower.contains("encrypt") {
        ExtractionError::PdfDecode("document is password protected".into())
    } else {
        ExtractionError::PdfDecode(msg)
    }
}

/// Compute pixel dimensions for rendering, applying the dimension guard.
///
/// Returns (width_px, height_px), both clamped to [1, MAX_DIMENSION_PX].
/// Preserves aspect ratio when capping.
fn compute_render_dimensions(width_points: f32, height_points: f32, dpi: u32) -> (u32, u32) {
    let scale = dpi as f32 / POINTS_PER_INCH;
    let raw_w = (width_points * scale).max(1.0);
    let raw_h = (height_points * scale).max(1.0);

    let max_dim = raw_w.max(raw_h);
    if max_dim > MAX_DIMENSION_PX as f32 {
        let ratio = MAX_DIMENSION_PX as f32 / max_dim;
        let w = ((raw_w * ratio).round() as u32).clamp(1, MAX_DIMENSION_PX);
        let h = ((raw_h * ratio).round() as u32).clamp(1, MAX_DIMENSION_PX);
        (w, h)
    } else {
        // 792pt at 300 DPI is 3299.9998 in f32
        (
            (raw_w.round() as u32).clamp(1, MAX_DIMENSION_PX),
            (raw_h.round() as u32).clamp(1, MAX_DIMENSION_PX),
        )
    }
}

/// Count visible text objects and image objects drawn directly on a page.
fn inventory_objects(page: &PdfPage) -> (usize, usize) {
    let mut text_blocks = 0;
    let mut image_count = 0;

    for object in page.objects().iter() {
        match object.object_type() {
            PdfPageObjectType::Text => {
                let visible = object
                    .as_text_object()
                    .map(|t| !t.text().trim().is_empty())
                    .unwrap_or(false);
                if visible {
                    text_blocks += 1;
                }
            }
            PdfPageObjectType::Image => image_count += 1,
            _ => {}
        }
    }

    (text_blocks, image_count)
}

impl PdfPageSource for PdfiumPageSource {
    fn analyze(&self, pdf_bytes: &[u8]) -> Result<Vec<PageLayout>, ExtractionError> {
        let pdfium = load_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf_bytes, None)
            .map_err(map_load_error)?;

        let mut layouts = Vec::new();
        for (index, page) in document.pages().iter().enumerate() {
            let page_number = index + 1;

            // An unreadable text layer sends the page to OCR instead of failing the document.
            let native_text = match page.text() {
                Ok(text) => text.all(),
                Err(e) => {
                    warn!(page = page_number, error = %e, "Text layer unreadable");
                    String::new()
                }
            };
            let (text_blocks, image_count) = inventory_objects(&page);

            layouts.push(PageLayout {
                page_number,
                native_text,
                text_blocks,
                image_count,
            });
        }

        debug!(pages = layouts.len(), "Analyzed PDF pages");
        Ok(layouts)
    }

    fn render_page(
        &self,
        pdf_bytes: &[u8],
        page_number: usize,
        dpi: u32,
    ) -> Result<Vec<u8>, ExtractionError> {
        let pdfium = load_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(pdf_bytes, None)
            .map_err(map_load_error)?;

        let pages = document.pages();
        let page_count = pages.len() as usize;

        let page_index = page_number
            .checked_sub(1)
            .and_then(|i| u16::try_from(i).ok())
            .filter(|&i| (i as usize) < page_count)
            .ok_or(ExtractionError::PageOutOfRange {
                page: page_number,
                page_count,
            })?;

        let page = pages
            .get(page_index)
            .map_err(|e| ExtractionError::PdfRendering {
                page: page_number,
                reason: format!("Page lookup failed: {e}"),
            })?;

        let width_points = page.width().value;
        let height_points = page.height().value;
        let (target_w, target_h) = compute_render_dimensions(width_points, height_points, dpi);

        let config = PdfRenderConfig::new()
            .set_target_width(target_w as i32)
            .set_maximum_height(target_h as i32);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| ExtractionError::PdfRendering {
                page: page_number,
                reason: format!("Rendering failed: {e}"),
            })?;

        let mut cursor = Cursor::new(Vec::new());
        bitmap
            .as_image()
            .write_to(&mut cursor, ImageOutputFormat::Png)
            .map_err(|e| ExtractionError::ImageProcessing(format!("PNG encoding failed: {e}")))?;

        let png_bytes = cursor.into_inner();

        debug!(
            page = page_number,
            width = target_w,
            height = target_h,
            png_size = png_bytes.len(),
            "Rendered PDF page to PNG"
        );

        Ok(png_bytes)
    }
}

// ── Mock for testing ──────────────────────────────────────

/// In-memory page source with fixed layouts.
///
/// Renders every valid page as a small gray PNG. Used by assembler and
/// processor tests that need a `PdfPageSource` without the PDFium binary.
pub struct MockPageSource {
    layouts: Vec<PageLayout>,
    undecodable: bool,
    failing_renders: Vec<usize>,
}

impl MockPageSource {
    pub fn new(layouts: Vec<PageLayout>) -> Self {
        Self {
            layouts,
            undecodable: false,
            failing_renders: Vec::new(),
        }
    }

    /// A source that rejects every document as corrupt.
    pub fn undecodable() -> Self {
        Self {
            layouts: Vec::new(),
            undecodable: true,
            failing_renders: Vec::new(),
        }
    }

    /// Make rendering of the given 1-based page fail.
    pub fn with_render_failure(mut self, page_number: usize) -> Self {
        self.failing_renders.push(page_number);
        self
    }
}

impl PdfPageSource for MockPageSource {
    fn analyze(&self, _pdf_bytes: &[u8]) -> Result<Vec<PageLayout>, ExtractionError> {
        if self.undecodable {
            return Err(ExtractionError::PdfDecode("mock: not a PDF".into()));
        }
        Ok(self.layouts.clone())
    }

    fn render_page(
        &self,
        _pdf_bytes: &[u8],
        page_number: usize,
        _dpi: u32,
    ) -> Result<Vec<u8>, ExtractionError> {
        if page_number == 0 || page_number > self.layouts.len() {
            return Err(ExtractionError::PageOutOfRange {
                page: page_number,
                page_count: self.layouts.len(),
            });
        }
        if self.failing_renders.contains(&page_number) {
            return Err(ExtractionError::PdfRendering {
                page: page_number,
                reason: "mock render failure".into(),
            });
        }

        let img = image::RgbImage::from_pixel(32, 32, image::Rgb([220u8, 220, 210]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageOutputFormat::Png)
            .map_err(|e| ExtractionError::ImageProcessing(e.to_string()))?;
        Ok(buf.into_inner())
    }
}

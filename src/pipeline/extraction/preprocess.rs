//! Raster preparation for OCR.
//!
//! Rendered pages arrive as RGB(A) PNG and are flattened to 8-bit
//! grayscale before recognition.

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageOutputFormat};
use tracing::debug;

use super::ExtractionError;

/// Maximum input image size (in bytes) before rejecting.
/// Prevents OOM on corrupt/adversarial files.
const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024; // 50 MB

/// Decode an image and re-encode it as an 8-bit grayscale PNG.
pub fn to_grayscale_png(image_bytes: &[u8]) -> Result<Vec<u8>, ExtractionError> {
    if image_bytes.is_empty() {
        return Err(ExtractionError::ImageProcessing("Empty image data".into()));
    }
    if image_bytes.len() > MAX_IMAGE_BYTES {
        return Err(ExtractionError::ImageProcessing(format!(
            "Image too large: {} bytes (max {MAX_IMAGE_BYTES})",
            image_bytes.len()
        )));
    }

    let img = image::load_from_memory(image_bytes)
        .map_err(|e| ExtractionError::ImageProcessing(format!("Decode failed: {e}")))?;

    let gray = DynamicImage::ImageLuma8(img.to_luma8());

    let mut cursor = Cursor::new(Vec::new());
    gray.write_to(&mut cursor, ImageOutputFormat::Png)
        .map_err(|e| ExtractionError::ImageProcessing(format!("PNG encoding failed: {e}")))?;

    let png = cursor.into_inner();
    debug!(
        width = gray.width(),
        height = gray.height(),
        png_size = png.len(),
        "Converted page raster to grayscale"
    );
    Ok(png)
}

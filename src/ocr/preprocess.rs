//! Capture preprocessing for the OCR request

use crate::error::OcrError;
use base64::Engine;
use image::imageops::FilterType;
use image::{load_from_memory_with_format, DynamicImage, ImageFormat};
use std::io::Cursor;

/// Scale a PNG capture to `target_height` (keeping aspect ratio), encode it
/// as JPEG and return the base64 text sent to the provider.
pub(crate) fn prepare_screenshot_for_ocr(
    bytes_png: &[u8],
    target_height: u32,
) -> Result<String, OcrError> {
    if target_height == 0 {
        return Err(OcrError::Image("target height must be positive".into()));
    }

    let image = load_from_memory_with_format(bytes_png, ImageFormat::Png)
        .map_err(|e| OcrError::Image(format!("Error reading image: {}", e)))?;
    let screenshot = DynamicImage::from(image.to_rgb8());

    if screenshot.width() == 0 || screenshot.height() == 0 {
        return Err(OcrError::Image("capture is empty".into()));
    }

    let scale = screenshot.height() as f32 / target_height as f32;
    let scaled_width = ((screenshot.width() as f32 / scale) as u32).max(1);
    let scaled_height = ((screenshot.height() as f32 / scale) as u32).max(1);

    let scaled = screenshot.resize_exact(scaled_width, scaled_height, FilterType::Gaussian);

    let mut bytes_jpeg: Vec<u8> = Vec::new();
    scaled
        .write_to(&mut Cursor::new(&mut bytes_jpeg), ImageFormat::Jpeg)
        .map_err(|e| OcrError::Image(format!("Error saving as JPEG: {}", e)))?;

    Ok(base64::engine::general_purpose::STANDARD.encode(bytes_jpeg))
}

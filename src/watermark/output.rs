//! Encoding finished images.
//!
//! Results are always written as PNG so hidden parity bits survive; any
//! lossy format would destroy them.

use super::{PixelBuffer, WatermarkError};
use base64::{engine::general_purpose::STANDARD, Engine};
use image::ImageFormat;
use std::io::Cursor;
use std::path::Path;

/// Encode `buffer` as PNG bytes.
pub fn to_png_bytes(buffer: &PixelBuffer) -> Result<Vec<u8>, WatermarkError> {
    let image = buffer.clone().into_rgba_image();
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| WatermarkError::EncodeFailed(format!("PNG encoding failed: {e}")))?;
    Ok(bytes)
}

/// Encode `buffer` as a `data:image/png;base64,` URL.
pub fn to_data_url(buffer: &PixelBuffer) -> Result<String, WatermarkError> {
    let bytes = to_png_bytes(buffer)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(bytes)))
}

/// Write `buffer` to `path` as PNG.
pub fn write_png<P: AsRef<Path>>(buffer: &PixelBuffer, path: P) -> Result<(), WatermarkError> {
    let path = path.as_ref();
    let bytes = to_png_bytes(buffer)?;
    std::fs::write(path, bytes).map_err(|e| {
        WatermarkError::EncodeFailed(format!("Failed to write {}: {e}", path.display()))
    })?;
    tracing::info!(path = %path.display(), "Image written");
    Ok(())
}

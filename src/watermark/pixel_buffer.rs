//! RGBA pixel buffer shared by every watermark stage.
//!
//! The byte layout is the only wire format of the crate: row-major,
//! top-left origin, 4 bytes per pixel in R, G, B, A order. It matches
//! `image::RgbaImage` exactly, so conversions in both directions are free
//! of any re-packing.

use super::WatermarkError;
use crate::constants::{MAX_SURFACE_DIMENSION, MAX_SURFACE_PIXELS};
use image::RgbaImage;

/// Bytes per pixel.
pub const CHANNELS: usize = 4;

/// A rectangular grid of RGBA pixels.
///
/// Invariant: `data.len() == width * height * 4`.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Check that a surface of the given size can be allocated.
pub(crate) fn check_surface(width: u32, height: u32) -> Result<usize, WatermarkError> {
    if width == 0 || height == 0 {
        return Err(WatermarkError::UnsupportedSurface(format!(
            "surface must have non-zero size, got {width}x{height}"
        )));
    }
    if width > MAX_SURFACE_DIMENSION || height > MAX_SURFACE_DIMENSION {
        return Err(WatermarkError::UnsupportedSurface(format!(
            "surface side exceeds {MAX_SURFACE_DIMENSION}px, got {width}x{height}"
        )));
    }
    let pixels = width as u64 * height as u64;
    if pixels > MAX_SURFACE_PIXELS {
        return Err(WatermarkError::UnsupportedSurface(format!(
            "surface has {pixels} pixels, limit is {MAX_SURFACE_PIXELS}"
        )));
    }
    Ok(pixels as usize * CHANNELS)
}

impl PixelBuffer {
    /// Create a fully transparent buffer (all bytes zero).
    pub fn new(width: u32, height: u32) -> Result<Self, WatermarkError> {
        let len = check_surface(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0; len],
        })
    }

    /// Create a buffer with every pixel set to `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, WatermarkError> {
        let len = check_surface(width, height)?;
        let data = rgba.iter().copied().cycle().take(len).collect();
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wrap raw RGBA bytes.
    ///
    /// # Errors
    ///
    /// `UnsupportedSurface` if the geometry is unusable or `data` does not
    /// hold exactly `width * height * 4` bytes.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, WatermarkError> {
        let len = check_surface(width, height)?;
        if data.len() != len {
            return Err(WatermarkError::UnsupportedSurface(format!(
                "{width}x{height} surface needs {len} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Raw bytes in R,G,B,A row-major order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Byte index of channel `c` of pixel `(x, y)`.
    #[inline]
    pub fn index(&self, x: u32, y: u32, c: usize) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS + c
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }

    /// Pixel at `(x, y)`. Panics when out of bounds, like slice indexing.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y, 0);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.index(x, y, 0);
        self.data[i..i + CHANNELS].copy_from_slice(&rgba);
    }

    /// Iterate over pixels as 4-byte slices in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(CHANNELS)
    }

    pub fn pixels_mut(&mut self) -> impl Iterator<Item = &mut [u8]> {
        self.data.chunks_exact_mut(CHANNELS)
    }

    /// Convert to an `image` crate buffer without copying pixel data.
    pub fn into_rgba_image(self) -> RgbaImage {
        let (width, height) = (self.width, self.height);
        // Length invariant guarantees from_raw succeeds.
        RgbaImage::from_raw(width, height, self.data)
            .unwrap_or_else(|| RgbaImage::new(width, height))
    }

    /// Build from an `image` crate buffer.
    pub fn from_rgba_image(image: RgbaImage) -> Result<Self, WatermarkError> {
        let (width, height) = image.dimensions();
        Self::from_raw(width, height, image.into_raw())
    }
}

//! Text rasterization for watermarks.
//!
//! Glyph rendering sits behind the [`GlyphRasterizer`] trait so layout code
//! only deals with coverage bitmaps and never with font internals.
//!
//! # Providers
//!
//! - [`FontRasterizer`]: TrueType/OpenType outlines through `ab_glyph`,
//!   loaded from a font file or bytes at runtime
//! - [`BlockRasterizer`]: font-free fixed-pitch blocks, one solid box per
//!   visible character. Deterministic, used when no font is configured
//!
//! # Example
//!
//! ```ignore
//! use paritymark::watermark::text_renderer::{FontRasterizer, GlyphRasterizer};
//!
//! let rasterizer = FontRasterizer::from_file("fonts/DejaVuSans.ttf")?;
//! let metrics = rasterizer.measure_text("Copyright 2025", 24.0)?;
//! let coverage = rasterizer.rasterize("Copyright 2025", 24.0)?;
//! ```

use super::compositor::blend_pixels;
use super::pixel_buffer::check_surface;
use super::position::{Point, TextAlign, TextBaseline, Transform};
use super::{PixelBuffer, WatermarkError};
use crate::constants::MAX_FONT_SIZE;
use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use std::path::Path;

/// Parsed RGB color from hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// White color.
    pub fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// Black color.
    pub fn black() -> Self {
        Self::new(0, 0, 0)
    }
}

/// Parse a hex color string into RGB components.
///
/// Supports both #RGB and #RRGGBB formats.
///
/// # Examples
///
/// ```ignore
/// let white = parse_hex_color("#FFF").unwrap();
/// assert_eq!(white, Color::new(255, 255, 255));
///
/// let red = parse_hex_color("#FF0000").unwrap();
/// assert_eq!(red, Color::new(255, 0, 0));
/// ```
pub fn parse_hex_color(hex: &str) -> Result<Color, WatermarkError> {
    let invalid = || WatermarkError::InvalidParameter(format!("Invalid hex color '{hex}'"));

    let digits = hex
        .strip_prefix('#')
        .ok_or_else(|| WatermarkError::InvalidParameter("Color must start with '#'".to_string()))?;

    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    match digits.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, slot) in rgb.iter_mut().enumerate() {
                // Double each component: 0xF -> 0xFF, 0xA -> 0xAA
                *slot = u8::from_str_radix(&digits[i..i + 1], 16).map_err(|_| invalid())? * 17;
            }
            Ok(Color::new(rgb[0], rgb[1], rgb[2]))
        }
        6 => {
            let mut rgb = [0u8; 3];
            for (i, slot) in rgb.iter_mut().enumerate() {
                *slot = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
            }
            Ok(Color::new(rgb[0], rgb[1], rgb[2]))
        }
        n => Err(WatermarkError::InvalidParameter(format!(
            "Color must be #RGB or #RRGGBB format, got {n} characters"
        ))),
    }
}

/// Size of a laid-out text run in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub width: f32,
    pub height: f32,
}

/// 8-bit coverage bitmap of a text run. The run's box starts at (0, 0).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphCoverage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl GlyphCoverage {
    /// Allocate an empty bitmap. Zero sides are widened to one pixel.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if the run is larger than any surface may be.
    pub fn new(width: u32, height: u32) -> Result<Self, WatermarkError> {
        let width = width.max(1);
        let height = height.max(1);
        check_surface(width, height).map_err(|_| {
            WatermarkError::InvalidParameter(format!(
                "text run of {width}x{height} pixels exceeds surface limits"
            ))
        })?;
        Ok(Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        })
    }

    /// Allocate a bitmap for a measured run, rounding its box up.
    pub fn for_metrics(metrics: &TextMetrics) -> Result<Self, WatermarkError> {
        // Float to int casts saturate, so oversized runs fail the check.
        Self::new(metrics.width.ceil() as u32, metrics.height.ceil() as u32)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Raise coverage at (x, y); overlapping glyph edges keep the maximum.
    pub fn accumulate(&mut self, x: u32, y: u32, value: u8) {
        if x < self.width && y < self.height {
            let i = y as usize * self.width as usize + x as usize;
            self.data[i] = self.data[i].max(value);
        }
    }

    pub fn has_ink(&self) -> bool {
        self.data.iter().any(|&c| c > 0)
    }
}

/// Fill style for drawn text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub color: Color,
    /// Opacity (0.0 to 1.0), multiplied with glyph coverage.
    pub opacity: f32,
}

/// Where and how a text run is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextPlacement {
    /// Anchor point in the local frame.
    pub point: Point,
    pub align: TextAlign,
    pub baseline: TextBaseline,
    /// Local frame to canvas mapping.
    pub transform: Transform,
}

/// Capability to measure and rasterize text.
///
/// `draw_text` has a default implementation built on `rasterize`, so a
/// provider only needs to produce coverage bitmaps.
pub trait GlyphRasterizer: Send + Sync {
    /// Measure `text` at `font_size` pixels.
    fn measure_text(&self, text: &str, font_size: f32) -> Result<TextMetrics, WatermarkError>;

    /// Rasterize `text` into a coverage bitmap whose box matches the
    /// measured metrics (rounded up).
    fn rasterize(&self, text: &str, font_size: f32) -> Result<GlyphCoverage, WatermarkError>;

    /// Draw `text` onto `target` once per placement, rasterizing a single
    /// time. Returns the number of pixels written.
    fn draw_text(
        &self,
        target: &mut PixelBuffer,
        text: &str,
        font_size: f32,
        style: &TextStyle,
        placements: &[TextPlacement],
    ) -> Result<usize, WatermarkError> {
        let coverage = self.rasterize(text, font_size)?;
        Ok(placements
            .iter()
            .map(|placement| stamp_coverage(target, &coverage, style, placement))
            .sum())
    }
}

/// Reject font sizes that are not finite, not positive, or above
/// [`MAX_FONT_SIZE`].
pub fn check_font_size(font_size: f32) -> Result<(), WatermarkError> {
    if !font_size.is_finite() || font_size <= 0.0 || font_size > MAX_FONT_SIZE {
        return Err(WatermarkError::InvalidParameter(format!(
            "font size must be in (0, {MAX_FONT_SIZE}], got {font_size}"
        )));
    }
    Ok(())
}

/// Composite a coverage bitmap onto `target` in the given color.
///
/// Each canvas pixel inside the transformed run box is mapped back into the
/// local frame and samples the nearest coverage texel, so rotated runs have
/// no holes. Returns the number of pixels written.
pub fn stamp_coverage(
    target: &mut PixelBuffer,
    coverage: &GlyphCoverage,
    style: &TextStyle,
    placement: &TextPlacement,
) -> usize {
    let box_w = coverage.width() as f32;
    let box_h = coverage.height() as f32;
    let left = placement.point.x + placement.align.offset(box_w);
    let top = placement.point.y + placement.baseline.offset(box_h);

    // Canvas bounding box of the run.
    let corners = [
        Point::new(left, top),
        Point::new(left + box_w, top),
        Point::new(left, top + box_h),
        Point::new(left + box_w, top + box_h),
    ]
    .map(|p| placement.transform.apply(p));

    let min_x = corners.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
    let max_x = corners.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
    let min_y = corners.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
    let max_y = corners.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);

    let x0 = min_x.floor().max(0.0) as i64;
    let y0 = min_y.floor().max(0.0) as i64;
    let x1 = (max_x.ceil() as i64).min(target.width() as i64);
    let y1 = (max_y.ceil() as i64).min(target.height() as i64);

    let alpha = style.opacity.clamp(0.0, 1.0);
    let mut written = 0;

    for py in y0..y1 {
        for px in x0..x1 {
            let local = placement
                .transform
                .invert(Point::new(px as f32 + 0.5, py as f32 + 0.5));
            let cx = (local.x - left).floor();
            let cy = (local.y - top).floor();
            if cx < 0.0 || cy < 0.0 || cx >= box_w || cy >= box_h {
                continue;
            }
            let value = coverage.get(cx as u32, cy as u32);
            if value == 0 {
                continue;
            }

            let ink = [style.color.r, style.color.g, style.color.b, value];
            let (x, y) = (px as u32, py as u32);
            let blended = blend_pixels(target.pixel(x, y), ink, alpha);
            target.set_pixel(x, y, blended);
            written += 1;
        }
    }

    written
}

/// Glyph rasterizer backed by an outline font.
pub struct FontRasterizer {
    font: FontVec,
}

impl std::fmt::Debug for FontRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRasterizer")
            .field("glyphs", &self.font.glyph_count())
            .finish()
    }
}

impl FontRasterizer {
    /// Load a font from raw TrueType/OpenType bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, WatermarkError> {
        let font = FontVec::try_from_vec(data)
            .map_err(|e| WatermarkError::ResourceNotFound(format!("invalid font data: {e}")))?;
        Ok(Self { font })
    }

    /// Load a font file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WatermarkError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            WatermarkError::ResourceNotFound(format!(
                "failed to read font {}: {e}",
                path.display()
            ))
        })?;
        Self::from_bytes(data)
    }
}

impl GlyphRasterizer for FontRasterizer {
    fn measure_text(&self, text: &str, font_size: f32) -> Result<TextMetrics, WatermarkError> {
        check_font_size(font_size)?;
        let scaled_font = self.font.as_scaled(PxScale::from(font_size));

        let mut width = 0.0f32;
        let mut prev_glyph: Option<ab_glyph::GlyphId> = None;

        for c in text.chars() {
            let glyph_id = scaled_font.glyph_id(c);

            // Add kerning if there's a previous glyph
            if let Some(prev) = prev_glyph {
                width += scaled_font.kern(prev, glyph_id);
            }

            width += scaled_font.h_advance(glyph_id);
            prev_glyph = Some(glyph_id);
        }

        Ok(TextMetrics {
            width,
            height: scaled_font.height(),
        })
    }

    fn rasterize(&self, text: &str, font_size: f32) -> Result<GlyphCoverage, WatermarkError> {
        let metrics = self.measure_text(text, font_size)?;
        let scale = PxScale::from(font_size);
        let scaled_font = self.font.as_scaled(scale);

        let mut coverage = GlyphCoverage::for_metrics(&metrics)?;

        let baseline_y = scaled_font.ascent();
        let mut cursor_x = 0.0f32;
        let mut prev_glyph: Option<ab_glyph::GlyphId> = None;

        for c in text.chars() {
            let glyph_id = scaled_font.glyph_id(c);

            if let Some(prev) = prev_glyph {
                cursor_x += scaled_font.kern(prev, glyph_id);
            }

            let glyph =
                glyph_id.with_scale_and_position(scale, ab_glyph::point(cursor_x, baseline_y));

            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();

                outlined.draw(|px, py, cov| {
                    let x = px as i32 + bounds.min.x as i32;
                    let y = py as i32 + bounds.min.y as i32;
                    if x >= 0 && y >= 0 {
                        coverage.accumulate(x as u32, y as u32, (cov * 255.0).round() as u8);
                    }
                });
            }

            cursor_x += scaled_font.h_advance(glyph_id);
            prev_glyph = Some(glyph_id);
        }

        Ok(coverage)
    }
}

/// Font-free rasterizer drawing one solid block per visible character.
///
/// Each character advances `font_size * advance_ratio` pixels; whitespace
/// advances without ink. Runs are `font_size` pixels tall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockRasterizer {
    advance_ratio: f32,
}

impl Default for BlockRasterizer {
    fn default() -> Self {
        Self { advance_ratio: 0.6 }
    }
}

impl BlockRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_advance_ratio(advance_ratio: f32) -> Self {
        Self { advance_ratio }
    }

    fn advance(&self, font_size: f32) -> f32 {
        font_size * self.advance_ratio
    }
}

impl GlyphRasterizer for BlockRasterizer {
    fn measure_text(&self, text: &str, font_size: f32) -> Result<TextMetrics, WatermarkError> {
        check_font_size(font_size)?;
        Ok(TextMetrics {
            width: text.chars().count() as f32 * self.advance(font_size),
            height: font_size,
        })
    }

    fn rasterize(&self, text: &str, font_size: f32) -> Result<GlyphCoverage, WatermarkError> {
        let metrics = self.measure_text(text, font_size)?;
        let mut coverage = GlyphCoverage::for_metrics(&metrics)?;

        let advance = self.advance(font_size);
        let inset = advance * 0.1;
        let top = (font_size * 0.15).floor() as u32;
        let bottom = ((font_size * 0.85).ceil() as u32)
            .max(top + 1)
            .min(coverage.height());

        for (i, c) in text.chars().enumerate() {
            if c.is_whitespace() {
                continue;
            }
            let start = i as f32 * advance;
            let left = (start + inset).floor() as u32;
            let right = ((start + advance - inset).ceil() as u32)
                .max(left + 1)
                .min(coverage.width());
            for y in top..bottom {
                for x in left..right {
                    coverage.accumulate(x, y, 255);
                }
            }
        }

        Ok(coverage)
    }
}

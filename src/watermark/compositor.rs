//! Watermark compositor.
//!
//! Ties the pieces together for the three ways a marker can be applied:
//!
//! - **Covert text**: render a mask, hide it with the parity codec
//! - **Visible text**: draw the marker straight onto the target
//! - **Visible image**: alpha-blend a secondary image at a corner, the
//!   center, or repeated across the canvas
//!
//! # Example
//!
//! ```ignore
//! use paritymark::watermark::compositor::embed_text;
//!
//! let stats = embed_text(&mut target, &spec, &rasterizer, &ParityCodec::default())?;
//! ```

use super::mask::{MaskRenderer, MaskSpec};
use super::parity::{EncodeStats, ParityCodec};
use super::position::{
    calculate_image_positions, is_visible, ImageDimensions, PlacementPosition,
    WatermarkDimensions,
};
use super::text_renderer::GlyphRasterizer;
use super::{ImagePosition, PixelBuffer, WatermarkError};

/// Blend `watermark` onto the target with its top-left at `position`,
/// clipped to the target bounds.
fn blend_image_at(
    target: &mut PixelBuffer,
    watermark: &PixelBuffer,
    position: PlacementPosition,
    opacity: f32,
) {
    let target_width = target.width() as i32;
    let target_height = target.height() as i32;

    let wm_width = watermark.width() as i32;
    let wm_height = watermark.height() as i32;

    let x_start = position.x.max(0);
    let y_start = position.y.max(0);
    let x_end = (position.x + wm_width).min(target_width);
    let y_end = (position.y + wm_height).min(target_height);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let wx = (tx - position.x) as u32;
            let wy = (ty - position.y) as u32;

            let wm_pixel = watermark.pixel(wx, wy);
            let target_pixel = target.pixel(tx as u32, ty as u32);

            let blended = blend_pixels(target_pixel, wm_pixel, opacity);
            target.set_pixel(tx as u32, ty as u32, blended);
        }
    }
}

/// Blend two pixels using alpha compositing with additional opacity.
///
/// Uses the "over" operator: result = foreground + background * (1 - foreground.alpha)
pub(crate) fn blend_pixels(background: [u8; 4], foreground: [u8; 4], opacity: f32) -> [u8; 4] {
    let fg_alpha = (foreground[3] as f32 / 255.0) * opacity.clamp(0.0, 1.0);
    let bg_alpha = background[3] as f32 / 255.0;

    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return [0, 0, 0, 0];
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    [
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8,
    ]
}

/// Alpha-blend a secondary image onto `target`. Returns the number of
/// placements drawn.
///
/// Every placement reads from the same `watermark` buffer; tiled positions
/// are consumed as they are generated.
pub fn overlay_image(
    target: &mut PixelBuffer,
    watermark: &PixelBuffer,
    position: ImagePosition,
    opacity: f32,
) -> usize {
    let image_dims = ImageDimensions {
        width: target.width(),
        height: target.height(),
    };
    let wm_dims = WatermarkDimensions {
        width: watermark.width(),
        height: watermark.height(),
    };

    let mut placements = 0;
    for pos in calculate_image_positions(position, &image_dims, &wm_dims)
        .filter(|pos| is_visible(pos, &image_dims, &wm_dims))
    {
        blend_image_at(target, watermark, pos, opacity);
        placements += 1;
    }

    tracing::debug!(
        position = ?position,
        placements,
        "Image watermark applied"
    );

    placements
}

/// Draw visible marker text onto `target`.
pub fn overlay_text(
    target: &mut PixelBuffer,
    spec: &MaskSpec,
    opacity: f32,
    rasterizer: &dyn GlyphRasterizer,
) -> Result<(), WatermarkError> {
    check_opacity(opacity)?;
    let written = MaskRenderer::new(rasterizer).render_onto(target, spec, opacity)?;
    tracing::debug!(pixels = written, "Text watermark applied");
    Ok(())
}

/// Hide marker text in `target` with the parity codec.
///
/// The mask is rendered at the target's size and encoded in one pass. The
/// target is only modified once rendering has succeeded.
pub fn embed_text(
    target: &mut PixelBuffer,
    spec: &MaskSpec,
    rasterizer: &dyn GlyphRasterizer,
    codec: &ParityCodec,
) -> Result<EncodeStats, WatermarkError> {
    let (width, height) = target.dimensions();
    let mask = MaskRenderer::new(rasterizer).render(spec, width, height)?;
    codec.encode_with_stats(target, &mask)
}

/// Recover the hidden marker from a covertly watermarked image.
pub fn reveal(source: &PixelBuffer, codec: &ParityCodec) -> PixelBuffer {
    codec.decode(source)
}

pub(crate) fn check_opacity(opacity: f32) -> Result<(), WatermarkError> {
    if !opacity.is_finite() || !(0.0..=1.0).contains(&opacity) {
        return Err(WatermarkError::InvalidParameter(format!(
            "opacity must be a finite value between 0.0 and 1.0, got {opacity}"
        )));
    }
    Ok(())
}

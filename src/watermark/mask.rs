//! Marker mask rendering.
//!
//! A mask is a [`PixelBuffer`] the size of the target image whose pixels are
//! zero where there is no marker ink and carry the glyph color with non-zero
//! alpha where there is. The same renderer also draws visible text straight
//! onto a target image.

use super::position::{
    anchor_placement, center_placement, diagonal_tile_origins, diagonal_transform, Corner,
    Spacing, TextAlign, TextBaseline, Transform,
};
use super::text_renderer::{check_font_size, GlyphRasterizer, TextPlacement, TextStyle};
use super::{Color, PixelBuffer, WatermarkError};

/// Layout policy for marker placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaskLayout {
    /// Single run pinned to a corner with the given margins.
    Anchored { corner: Corner, margin: Spacing },
    /// Single run centered on the canvas.
    Centered,
    /// Rotated grid of runs covering the whole canvas.
    DiagonalTiled { angle_degrees: f32, spacing: Spacing },
}

/// Everything needed to render a text marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskSpec {
    pub text: String,
    pub font_size: f32,
    /// Glyph color. Only presence matters to the parity codec.
    pub color: Color,
    pub layout: MaskLayout,
}

impl MaskSpec {
    pub fn new(text: impl Into<String>, font_size: f32, layout: MaskLayout) -> Self {
        Self {
            text: text.into(),
            font_size,
            color: Color::black(),
            layout,
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn validate(&self) -> Result<(), WatermarkError> {
        if self.text.is_empty() {
            return Err(WatermarkError::InvalidParameter(
                "marker text cannot be empty".to_string(),
            ));
        }
        check_font_size(self.font_size)?;
        match self.layout {
            MaskLayout::Anchored { margin, .. } => margin.validate(),
            MaskLayout::Centered => Ok(()),
            MaskLayout::DiagonalTiled {
                angle_degrees,
                spacing,
            } => {
                if !angle_degrees.is_finite() {
                    return Err(WatermarkError::InvalidParameter(format!(
                        "angle must be finite, got {angle_degrees}"
                    )));
                }
                spacing.validate()
            }
        }
    }
}

/// Renders [`MaskSpec`]s with any glyph provider.
pub struct MaskRenderer<'a> {
    rasterizer: &'a dyn GlyphRasterizer,
}

impl<'a> MaskRenderer<'a> {
    pub fn new(rasterizer: &'a dyn GlyphRasterizer) -> Self {
        Self { rasterizer }
    }

    /// Render a mask of `width` x `height` pixels.
    pub fn render(
        &self,
        spec: &MaskSpec,
        width: u32,
        height: u32,
    ) -> Result<PixelBuffer, WatermarkError> {
        spec.validate()?;
        let mut mask = PixelBuffer::new(width, height)?;
        let written = self.render_onto(&mut mask, spec, 1.0)?;
        if written == 0 {
            tracing::warn!(
                text = %spec.text,
                width,
                height,
                "Marker mask has no ink"
            );
        }
        Ok(mask)
    }

    /// Draw the marker onto an existing buffer with `opacity`, blending over
    /// what is there. Returns the number of pixels written.
    pub fn render_onto(
        &self,
        target: &mut PixelBuffer,
        spec: &MaskSpec,
        opacity: f32,
    ) -> Result<usize, WatermarkError> {
        spec.validate()?;
        let (width, height) = target.dimensions();
        let style = TextStyle {
            color: spec.color,
            opacity,
        };

        let placements = match spec.layout {
            MaskLayout::Anchored { corner, margin } => {
                let anchor = anchor_placement(corner, width, height, margin);
                vec![TextPlacement {
                    point: anchor.point,
                    align: anchor.align,
                    baseline: anchor.baseline,
                    transform: Transform::identity(),
                }]
            }
            MaskLayout::Centered => {
                let anchor = center_placement(width, height);
                vec![TextPlacement {
                    point: anchor.point,
                    align: anchor.align,
                    baseline: anchor.baseline,
                    transform: Transform::identity(),
                }]
            }
            MaskLayout::DiagonalTiled {
                angle_degrees,
                spacing,
            } => {
                let metrics = self.rasterizer.measure_text(&spec.text, spec.font_size)?;
                let origins = diagonal_tile_origins(width, height, metrics.width, spacing)?;
                let transform = diagonal_transform(width, height, angle_degrees);

                tracing::debug!(
                    tiles = origins.len(),
                    text_width = metrics.width,
                    angle_degrees,
                    "Rendering diagonal marker tiles"
                );

                origins
                    .into_iter()
                    .map(|point| TextPlacement {
                        point,
                        align: TextAlign::Center,
                        baseline: TextBaseline::Middle,
                        transform,
                    })
                    .collect()
            }
        };

        self.rasterizer
            .draw_text(target, &spec.text, spec.font_size, &style, &placements)
    }
}

//! Watermark processor for applying watermark definitions to images.
//!
//! This module provides the high-level async API used by the CLI: load a
//! target, apply one [`WatermarkDefinition`], write the result, or reveal a
//! hidden marker.
//!
//! # Example
//!
//! ```ignore
//! use paritymark::watermark::processor::WatermarkProcessor;
//!
//! let processor = WatermarkProcessor::new(fetcher);
//! let job = WatermarkJob::from_file("job.yaml")?;
//! processor.run(&job).await?;
//! ```

use super::compositor::{embed_text, overlay_image, overlay_text, reveal};
use super::output::write_png;
use super::parity::{Channel, ParityCodec};
use super::pixel_buffer::check_surface;
use super::text_renderer::{BlockRasterizer, FontRasterizer, GlyphRasterizer};
use super::{
    ImageFetcher, ImageWatermarkConfig, PixelBuffer, TextWatermarkConfig, WatermarkDefinition,
    WatermarkError, WatermarkJob,
};
use image::DynamicImage;
use std::sync::Arc;

/// What applying a definition did to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Marker hidden with the parity codec.
    Embedded { ink_pixels: usize, changed_pixels: usize },
    /// Visible text drawn.
    TextDrawn,
    /// Secondary image drawn at this many placements.
    ImageDrawn { placements: usize },
}

/// Watermark processor for applying watermarks to images.
#[derive(Clone)]
pub struct WatermarkProcessor {
    /// Image fetcher for targets and watermark images.
    fetcher: ImageFetcher,
    /// Glyph provider used when a text config names no font.
    rasterizer: Arc<dyn GlyphRasterizer>,
}

impl WatermarkProcessor {
    /// Create a new processor using the font-free block rasterizer.
    pub fn new(fetcher: ImageFetcher) -> Self {
        Self {
            fetcher,
            rasterizer: Arc::new(BlockRasterizer::new()),
        }
    }

    /// Replace the default glyph provider.
    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn GlyphRasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    /// Load and decode an image from a file path or https URL.
    pub async fn load(&self, source: &str) -> Result<PixelBuffer, WatermarkError> {
        let cached = self.fetcher.fetch(source).await?;
        Ok(cached.image.as_ref().clone())
    }

    /// Apply one watermark definition to `target` in place.
    pub async fn apply(
        &self,
        target: &mut PixelBuffer,
        definition: &WatermarkDefinition,
    ) -> Result<ApplyOutcome, WatermarkError> {
        definition.validate()?;
        match definition {
            WatermarkDefinition::Text(config) => self.apply_text_watermark(target, config),
            WatermarkDefinition::Image(config) => {
                self.apply_image_watermark(target, config).await
            }
        }
    }

    /// Apply a text watermark, hidden or visible.
    fn apply_text_watermark(
        &self,
        target: &mut PixelBuffer,
        config: &TextWatermarkConfig,
    ) -> Result<ApplyOutcome, WatermarkError> {
        let spec = config.to_mask_spec()?;

        let font_rasterizer;
        let rasterizer: &dyn GlyphRasterizer = match &config.font {
            Some(path) => {
                font_rasterizer = FontRasterizer::from_file(path)?;
                &font_rasterizer
            }
            None => self.rasterizer.as_ref(),
        };

        if config.secret {
            let codec = ParityCodec::for_channel(config.channel);
            let stats = embed_text(target, &spec, rasterizer, &codec)?;
            Ok(ApplyOutcome::Embedded {
                ink_pixels: stats.ink_pixels,
                changed_pixels: stats.changed_pixels,
            })
        } else {
            overlay_text(target, &spec, config.opacity, rasterizer)?;
            Ok(ApplyOutcome::TextDrawn)
        }
    }

    /// Apply an image watermark to the image.
    async fn apply_image_watermark(
        &self,
        target: &mut PixelBuffer,
        config: &ImageWatermarkConfig,
    ) -> Result<ApplyOutcome, WatermarkError> {
        let cached = self.fetcher.fetch(&config.source).await?;

        let placements = if config.width.is_some() || config.height.is_some() {
            let resized = resize_watermark_image(&cached.image, config.width, config.height)?;
            overlay_image(target, &resized, config.position, config.opacity)
        } else {
            overlay_image(target, &cached.image, config.position, config.opacity)
        };

        Ok(ApplyOutcome::ImageDrawn { placements })
    }

    /// Run a complete job: load the target, apply the watermark and write
    /// the PNG result.
    pub async fn run(&self, job: &WatermarkJob) -> Result<ApplyOutcome, WatermarkError> {
        job.validate()?;
        let mut target = self.load(&job.target).await?;
        let outcome = self.apply(&mut target, &job.watermark).await?;
        write_png(&target, &job.output)?;

        tracing::info!(
            target = %job.target,
            output = %job.output.display(),
            outcome = ?outcome,
            "Watermark job complete"
        );

        Ok(outcome)
    }

    /// Load `source` and recover the marker hidden in `channel`.
    pub async fn reveal(
        &self,
        source: &str,
        channel: Channel,
    ) -> Result<PixelBuffer, WatermarkError> {
        let image = self.load(source).await?;
        Ok(reveal(&image, &ParityCodec::for_channel(channel)))
    }
}

/// Resize a watermark image while preserving aspect ratio.
fn resize_watermark_image(
    image: &PixelBuffer,
    width: Option<u32>,
    height: Option<u32>,
) -> Result<PixelBuffer, WatermarkError> {
    let src_w = image.width();
    let src_h = image.height();

    let (target_w, target_h) = match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => {
            // Calculate height to preserve aspect ratio
            let h = (w as f32 / src_w as f32 * src_h as f32) as u32;
            (w, h.max(1))
        }
        (None, Some(h)) => {
            // Calculate width to preserve aspect ratio
            let w = (h as f32 / src_h as f32 * src_w as f32) as u32;
            (w.max(1), h)
        }
        (None, None) => return Ok(image.clone()),
    };
    // A derived side can still blow past the surface limits.
    check_surface(target_w, target_h)?;

    let source = DynamicImage::ImageRgba8(image.clone().into_rgba_image());
    let resized = source.resize_exact(target_w, target_h, image::imageops::FilterType::Lanczos3);
    PixelBuffer::from_rgba_image(resized.to_rgba8())
}

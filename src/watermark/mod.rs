//! Watermark module for hiding and drawing markers on images.
//!
//! The core is a parity codec: marker text is rendered into a mask the size
//! of the target, then the least significant bit of one color channel is set
//! so that it is odd exactly where the mask has ink. The change is at most
//! one level per pixel and invisible to the eye; [`ParityCodec::decode`]
//! turns it back into a black and white picture of the marker.
//!
//! # Features
//!
//! - **Covert text** hidden in the R, G or B channel
//! - **Visible text** at a corner, the center, or tiled diagonally
//! - **Image watermarks** from files or HTTPS URLs (with caching)
//! - **Reveal** of hidden markers
//!
//! # Configuration Example
//!
//! ```yaml
//! target: "photo.png"
//! output: "photo.marked.png"
//! watermark:
//!   type: text
//!   text: "owner:42"
//!   position: diagonal
//!   angle: -30
//!   secret: true
//! ```

pub mod compositor;
pub mod config;
pub mod error;
pub mod image_fetcher;
pub mod mask;
pub mod output;
pub mod parity;
pub mod pixel_buffer;
pub mod position;
pub mod processor;
pub mod text_renderer;

// Re-export main types for convenience
pub use compositor::{embed_text, overlay_image, overlay_text, reveal};
pub use config::{
    ImagePosition, ImageWatermarkConfig, TextPosition, TextWatermarkConfig, WatermarkDefinition,
    WatermarkJob,
};
pub use error::WatermarkError;
pub use image_fetcher::{CachedImage, ImageFetcher, ImageFetcherConfig, ImageSource};
pub use mask::{MaskLayout, MaskRenderer, MaskSpec};
pub use output::{to_data_url, to_png_bytes, write_png};
pub use parity::{Channel, EncodeStats, EncodedChannel, ParityCodec};
pub use pixel_buffer::PixelBuffer;
pub use position::{
    calculate_image_positions, calculate_tiled_positions, diagonal_cell, diagonal_tile_origins,
    is_visible, Corner, ImageDimensions, PlacementPosition, Point, Spacing, Transform,
    WatermarkDimensions,
};
pub use processor::{ApplyOutcome, WatermarkProcessor};
pub use text_renderer::{
    parse_hex_color, BlockRasterizer, Color, FontRasterizer, GlyphCoverage, GlyphRasterizer,
    TextMetrics,
};

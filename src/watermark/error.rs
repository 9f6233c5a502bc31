//! Watermark error types.
//!
//! Every fallible watermark operation reports one of these variants
//! synchronously. Nothing is retried and nothing is partially written.

use thiserror::Error;

/// Errors that can occur while rendering, encoding or decoding watermarks.
#[derive(Error, Debug)]
pub enum WatermarkError {
    /// No pixel surface can be provided for the requested geometry.
    #[error("Unsupported drawing surface: {0}")]
    UnsupportedSurface(String),

    /// An image or font resource failed to load.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Mask and target buffers have different dimensions.
    #[error(
        "Dimension mismatch: target is {}x{}, mask is {}x{}",
        .target.0,
        .target.1,
        .mask.0,
        .mask.1
    )]
    DimensionMismatch { target: (u32, u32), mask: (u32, u32) },

    /// Malformed layout spec or configuration value.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The final buffer could not be serialized.
    #[error("Failed to encode output image: {0}")]
    EncodeFailed(String),
}

impl WatermarkError {
    /// Stable numeric code for the error category.
    pub fn code(&self) -> u16 {
        match self {
            Self::UnsupportedSurface(_) => 1002,
            Self::EncodeFailed(_) => 1003,
            Self::ResourceNotFound(_) => 2001,
            Self::InvalidParameter(_) => 3001,
            Self::DimensionMismatch { .. } => 3002,
        }
    }
}

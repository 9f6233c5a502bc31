//! Watermark configuration types.
//!
//! A [`WatermarkJob`] describes one run: the image to mark, where to write
//! the result, and a single text or image watermark definition.
//!
//! ```yaml
//! target: "photos/original.png"
//! output: "photos/marked.png"
//! watermark:
//!   type: text
//!   text: "(c) ${AUTHOR}"
//!   position: diagonal
//!   secret: true
//!   channel: r
//! ```
//!
//! `${VAR}` references are replaced with environment variables before
//! parsing.

use super::mask::{MaskLayout, MaskSpec};
use super::parity::Channel;
use super::position::{Corner, Spacing};
use super::text_renderer::parse_hex_color;
use super::WatermarkError;
use crate::constants::{
    DEFAULT_ANGLE_DEGREES, DEFAULT_COLOR, DEFAULT_FONT_SIZE, DEFAULT_H_SPACE, DEFAULT_OPACITY,
    DEFAULT_V_SPACE, MAX_SURFACE_DIMENSION, MAX_SURFACE_PIXELS,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Default values
fn default_font_size() -> f32 {
    DEFAULT_FONT_SIZE
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_opacity() -> f32 {
    DEFAULT_OPACITY
}

fn default_c_space() -> f32 {
    DEFAULT_H_SPACE
}

fn default_v_space() -> f32 {
    DEFAULT_V_SPACE
}

fn default_angle() -> f32 {
    DEFAULT_ANGLE_DEGREES
}

fn default_text_position() -> TextPosition {
    TextPosition::Diagonal
}

fn default_image_position() -> ImagePosition {
    ImagePosition::BottomRight
}

/// Text watermark position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
    /// Rotated tiles covering the whole image
    Diagonal,
}

impl std::str::FromStr for TextPosition {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_yaml::from_str(s).map_err(|_| {
            WatermarkError::InvalidParameter(format!("unknown text position '{s}'"))
        })
    }
}

/// Image watermark position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImagePosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
    /// Tile the image row by row from the top-left corner
    Repeat,
}

impl std::str::FromStr for ImagePosition {
    type Err = WatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_yaml::from_str(s).map_err(|_| {
            WatermarkError::InvalidParameter(format!("unknown image position '{s}'"))
        })
    }
}

/// Watermark definition - either text or image.
///
/// ```yaml
/// - type: text
///   text: "Copyright 2025"
///   position: bottom-right
/// - type: image
///   source: "https://cdn.example.com/logo.png"
///   position: repeat
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WatermarkDefinition {
    Text(TextWatermarkConfig),
    Image(ImageWatermarkConfig),
}

/// Text watermark configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextWatermarkConfig {
    /// Marker text
    pub text: String,

    /// Font size in pixels (default: 24)
    #[serde(default = "default_font_size")]
    pub font_size: f32,

    /// Text color as hex string (default: "#000000")
    #[serde(default = "default_color")]
    pub color: String,

    /// Opacity for visible text (default: 1.0)
    #[serde(default = "default_opacity")]
    pub opacity: f32,

    /// Position on the image (default: diagonal)
    #[serde(default = "default_text_position")]
    pub position: TextPosition,

    /// Horizontal margin for corners, horizontal gap for diagonal tiles
    #[serde(default = "default_c_space")]
    pub c_space: f32,

    /// Vertical margin for corners, vertical gap for diagonal tiles
    #[serde(default = "default_v_space")]
    pub v_space: f32,

    /// Rotation of the diagonal pattern in degrees
    #[serde(default = "default_angle")]
    pub angle: f32,

    /// Hide the text with parity encoding instead of drawing it
    #[serde(default)]
    pub secret: bool,

    /// Channel carrying the hidden bits (secret mode only)
    #[serde(default)]
    pub channel: Channel,

    /// Font file; a font-free block rasterizer is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<PathBuf>,
}

/// Image watermark configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageWatermarkConfig {
    /// File path or https URL
    pub source: String,

    /// Resize width in pixels (keeps aspect ratio if height not set)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    /// Resize height in pixels (keeps aspect ratio if width not set)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// Opacity from 0.0 (transparent) to 1.0 (opaque) (default: 1.0)
    #[serde(default = "default_opacity")]
    pub opacity: f32,

    /// Position on the image (default: bottom-right)
    #[serde(default = "default_image_position")]
    pub position: ImagePosition,
}

/// One watermarking run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkJob {
    /// Image to mark: file path or https URL
    pub target: String,

    /// Where to write the PNG result
    pub output: PathBuf,

    pub watermark: WatermarkDefinition,
}

fn check_opacity(kind: &str, opacity: f32) -> Result<(), WatermarkError> {
    // Check for NaN/Infinity and valid range
    if !opacity.is_finite() || !(0.0..=1.0).contains(&opacity) {
        return Err(WatermarkError::InvalidParameter(format!(
            "{kind} watermark opacity must be a finite value between 0.0 and 1.0, got {opacity}"
        )));
    }
    Ok(())
}

impl TextWatermarkConfig {
    /// Config with defaults for everything but the text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: default_font_size(),
            color: default_color(),
            opacity: default_opacity(),
            position: default_text_position(),
            c_space: default_c_space(),
            v_space: default_v_space(),
            angle: default_angle(),
            secret: false,
            channel: Channel::default(),
            font: None,
        }
    }

    /// Validate the text watermark configuration.
    pub fn validate(&self) -> Result<(), WatermarkError> {
        check_opacity("Text", self.opacity)?;
        self.to_mask_spec()?.validate()
    }

    /// Layout described by this config.
    pub fn layout(&self) -> MaskLayout {
        let spacing = Spacing::new(self.c_space, self.v_space);
        let anchored = |corner| MaskLayout::Anchored {
            corner,
            margin: spacing,
        };
        match self.position {
            TextPosition::TopLeft => anchored(Corner::TopLeft),
            TextPosition::TopRight => anchored(Corner::TopRight),
            TextPosition::BottomLeft => anchored(Corner::BottomLeft),
            TextPosition::BottomRight => anchored(Corner::BottomRight),
            TextPosition::Center => MaskLayout::Centered,
            TextPosition::Diagonal => MaskLayout::DiagonalTiled {
                angle_degrees: self.angle,
                spacing,
            },
        }
    }

    /// Build the mask spec, parsing the color.
    pub fn to_mask_spec(&self) -> Result<MaskSpec, WatermarkError> {
        let color = parse_hex_color(&self.color)?;
        Ok(MaskSpec::new(self.text.clone(), self.font_size, self.layout()).with_color(color))
    }
}

impl ImageWatermarkConfig {
    /// Validate the image watermark configuration.
    pub fn validate(&self) -> Result<(), WatermarkError> {
        if self.source.is_empty() {
            return Err(WatermarkError::InvalidParameter(
                "Image watermark 'source' field cannot be empty".to_string(),
            ));
        }
        if self.width == Some(0) || self.height == Some(0) {
            return Err(WatermarkError::InvalidParameter(
                "Image watermark resize dimensions must be non-zero".to_string(),
            ));
        }
        for side in [self.width, self.height].into_iter().flatten() {
            if side > MAX_SURFACE_DIMENSION {
                return Err(WatermarkError::InvalidParameter(format!(
                    "Image watermark resize side {side} exceeds {MAX_SURFACE_DIMENSION}px"
                )));
            }
        }
        if let (Some(w), Some(h)) = (self.width, self.height) {
            if w as u64 * h as u64 > MAX_SURFACE_PIXELS {
                return Err(WatermarkError::InvalidParameter(format!(
                    "Image watermark resize to {w}x{h} exceeds {MAX_SURFACE_PIXELS} pixels"
                )));
            }
        }
        check_opacity("Image", self.opacity)
    }
}

impl WatermarkDefinition {
    /// Validate the watermark definition.
    pub fn validate(&self) -> Result<(), WatermarkError> {
        match self {
            Self::Text(config) => config.validate(),
            Self::Image(config) => config.validate(),
        }
    }
}

impl WatermarkJob {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, WatermarkError> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| WatermarkError::InvalidParameter(e.to_string()))?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                WatermarkError::InvalidParameter(format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                ))
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        serde_yaml::from_str(&substituted)
            .map_err(|e| WatermarkError::InvalidParameter(format!("Invalid job config: {e}")))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WatermarkError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            WatermarkError::ResourceNotFound(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), WatermarkError> {
        if self.target.is_empty() {
            return Err(WatermarkError::InvalidParameter(
                "Job 'target' field cannot be empty".to_string(),
            ));
        }
        if self.output.as_os_str().is_empty() {
            return Err(WatermarkError::InvalidParameter(
                "Job 'output' field cannot be empty".to_string(),
            ));
        }
        self.watermark.validate()
    }
}

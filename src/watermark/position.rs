//! Layout math for watermark placement.
//!
//! This module decides where marker content lands on a canvas. It never
//! touches pixels: callers receive anchor points, text alignment, a
//! rotation transform and lists of tile origins.
//!
//! # Layouts
//!
//! - **Anchored**: text pinned to a corner with a horizontal and vertical
//!   margin, aligned so its outer edge faces the corner
//! - **Centered**: text centered on the canvas
//! - **Diagonal tiled**: origin moved to the canvas center, frame rotated,
//!   then a grid of text instances laid over a square whose side is the
//!   canvas diagonal, so every corner is covered after rotation
//! - **Image placement**: four corners, center, or row-major repeat
//!
//! # Example
//!
//! ```ignore
//! use paritymark::watermark::position::{anchor_placement, Corner, Spacing};
//!
//! let margin = Spacing::new(10.0, 5.0);
//! let anchor = anchor_placement(Corner::BottomRight, 800, 600, margin);
//! assert_eq!((anchor.point.x, anchor.point.y), (790.0, 595.0));
//! ```

use super::config::ImagePosition;
use super::WatermarkError;
use crate::constants::{MAX_DIAGONAL_TILES, MAX_SURFACE_DIMENSION, MIN_TILE_CELL};
use serde::{Deserialize, Serialize};

/// Dimensions of the target image.
#[derive(Debug, Clone, Copy)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Dimensions of the watermark to be placed.
#[derive(Debug, Clone, Copy)]
pub struct WatermarkDimensions {
    pub width: u32,
    pub height: u32,
}

/// Integer top-left position of a placed watermark image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A point in canvas or local (rotated) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Canvas corner used by the anchored layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Horizontal alignment of a text run relative to its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Vertical alignment of a text run relative to its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextBaseline {
    Top,
    Middle,
    Bottom,
}

impl TextAlign {
    /// Offset from the anchor to the left edge of a run `width` wide.
    pub fn offset(self, width: f32) -> f32 {
        match self {
            Self::Left => 0.0,
            Self::Center => -width / 2.0,
            Self::Right => -width,
        }
    }
}

impl TextBaseline {
    /// Offset from the anchor to the top edge of a run `height` tall.
    pub fn offset(self, height: f32) -> f32 {
        match self {
            Self::Top => 0.0,
            Self::Middle => -height / 2.0,
            Self::Bottom => -height,
        }
    }
}

/// Horizontal and vertical spacing in pixels.
///
/// Used as the corner margin for anchored text and as the gap between
/// tiles for the diagonal layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spacing {
    pub horizontal: f32,
    pub vertical: f32,
}

impl Spacing {
    pub fn new(horizontal: f32, vertical: f32) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }

    /// Reject negative or non-finite spacing.
    pub fn validate(&self) -> Result<(), WatermarkError> {
        for (name, value) in [("horizontal", self.horizontal), ("vertical", self.vertical)] {
            if !value.is_finite() || value < 0.0 {
                return Err(WatermarkError::InvalidParameter(format!(
                    "{name} spacing must be a finite non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Translation followed by rotation, mapping local coordinates to canvas
/// coordinates: `canvas = origin + R(angle) * local`.
///
/// Positive angles rotate clockwise on screen (y axis points down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub origin: Point,
    cos: f32,
    sin: f32,
}

impl Transform {
    pub fn identity() -> Self {
        Self::new(Point::new(0.0, 0.0), 0.0)
    }

    pub fn new(origin: Point, angle_degrees: f32) -> Self {
        let radians = angle_degrees.to_radians();
        Self {
            origin,
            cos: radians.cos(),
            sin: radians.sin(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.origin.x == 0.0 && self.origin.y == 0.0 && self.sin == 0.0 && self.cos == 1.0
    }

    /// Local to canvas.
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.origin.x + p.x * self.cos - p.y * self.sin,
            self.origin.y + p.x * self.sin + p.y * self.cos,
        )
    }

    /// Canvas to local.
    pub fn invert(&self, p: Point) -> Point {
        let dx = p.x - self.origin.x;
        let dy = p.y - self.origin.y;
        Point::new(dx * self.cos + dy * self.sin, -dx * self.sin + dy * self.cos)
    }
}

/// Anchor point plus alignment for a single text run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextAnchor {
    pub point: Point,
    pub align: TextAlign,
    pub baseline: TextBaseline,
}

/// Anchor for text pinned to `corner` with the given margins.
///
/// The alignment is chosen so the text's outer edges face the corner, e.g.
/// bottom-right text is right aligned with a bottom baseline at
/// `(width - margin.horizontal, height - margin.vertical)`.
pub fn anchor_placement(corner: Corner, width: u32, height: u32, margin: Spacing) -> TextAnchor {
    let w = width as f32;
    let h = height as f32;
    let (x, align) = match corner {
        Corner::TopLeft | Corner::BottomLeft => (margin.horizontal, TextAlign::Left),
        Corner::TopRight | Corner::BottomRight => (w - margin.horizontal, TextAlign::Right),
    };
    let (y, baseline) = match corner {
        Corner::TopLeft | Corner::TopRight => (margin.vertical, TextBaseline::Top),
        Corner::BottomLeft | Corner::BottomRight => (h - margin.vertical, TextBaseline::Bottom),
    };
    TextAnchor {
        point: Point::new(x, y),
        align,
        baseline,
    }
}

/// Anchor for text centered on the canvas.
pub fn center_placement(width: u32, height: u32) -> TextAnchor {
    TextAnchor {
        point: Point::new(width as f32 / 2.0, height as f32 / 2.0),
        align: TextAlign::Center,
        baseline: TextBaseline::Middle,
    }
}

/// Length of the canvas diagonal.
pub fn canvas_diagonal(width: u32, height: u32) -> f32 {
    (width as f32).hypot(height as f32)
}

/// Frame used by the diagonal layout: origin at the canvas center, rotated
/// by `angle_degrees`.
pub fn diagonal_transform(width: u32, height: u32, angle_degrees: f32) -> Transform {
    Transform::new(
        Point::new(width as f32 / 2.0, height as f32 / 2.0),
        angle_degrees,
    )
}

/// Size of one diagonal tile cell.
///
/// Both dimensions grow from the text width: the cell is
/// `(text_width + h, text_width + v)`. The text height does not take part.
pub fn diagonal_cell(text_width: f32, spacing: Spacing) -> (f32, f32) {
    (
        text_width + spacing.horizontal,
        text_width + spacing.vertical,
    )
}

/// Tile origins for the diagonal layout, in the rotated local frame.
///
/// Origins start at `(-d/2, -d/2)` where `d` is the canvas diagonal and step
/// by the cell size on both axes while below `d/2`. The covered square
/// contains the circle that bounds the canvas, so rotation by any angle
/// leaves no corner uncovered.
pub fn diagonal_tile_origins(
    width: u32,
    height: u32,
    text_width: f32,
    spacing: Spacing,
) -> Result<Vec<Point>, WatermarkError> {
    spacing.validate()?;
    let (cell_w, cell_h) = diagonal_cell(text_width, spacing);
    if !(cell_w >= MIN_TILE_CELL && cell_h >= MIN_TILE_CELL) {
        return Err(WatermarkError::InvalidParameter(format!(
            "diagonal tile cell must be at least {MIN_TILE_CELL}px, got {cell_w}x{cell_h}"
        )));
    }

    let diagonal = canvas_diagonal(width, height);
    let half = diagonal / 2.0;

    // At most one tile per canvas pixel, and never more than the hard cap.
    let cols = (diagonal as f64 / cell_w as f64).ceil();
    let rows = (diagonal as f64 / cell_h as f64).ceil();
    let limit = (width as u64 * height as u64).min(MAX_DIAGONAL_TILES);
    if cols * rows > limit as f64 {
        return Err(WatermarkError::InvalidParameter(format!(
            "diagonal tiling needs {cols}x{rows} tiles on a {width}x{height} canvas, limit is {limit}"
        )));
    }

    let mut origins = Vec::with_capacity((cols * rows) as usize);

    // Step by index to avoid accumulating float error.
    let mut row = 0u32;
    loop {
        let y = -half + row as f32 * cell_h;
        if y >= half {
            break;
        }
        let mut col = 0u32;
        loop {
            let x = -half + col as f32 * cell_w;
            if x >= half {
                break;
            }
            origins.push(Point::new(x, y));
            col += 1;
        }
        row += 1;
    }

    Ok(origins)
}

/// Row-major tile positions covering the whole canvas, starting at (0, 0).
///
/// Positions are yielded lazily, so a tiny tile on a large canvas never
/// materializes the whole grid. Edge tiles extend past the canvas and are
/// clipped when drawn.
pub fn calculate_tiled_positions(
    image: &ImageDimensions,
    watermark: &WatermarkDimensions,
) -> impl Iterator<Item = PlacementPosition> {
    // Dimensions come from PixelBuffers, which cap each side well inside i32.
    debug_assert!(image.width <= MAX_SURFACE_DIMENSION && image.height <= MAX_SURFACE_DIMENSION);
    debug_assert!(
        watermark.width <= MAX_SURFACE_DIMENSION && watermark.height <= MAX_SURFACE_DIMENSION
    );

    let (cols, rows) = if watermark.width == 0 || watermark.height == 0 {
        (0, 0)
    } else {
        (image.width, image.height)
    };
    let step_x = watermark.width.max(1) as usize;
    let step_y = watermark.height.max(1) as usize;

    (0..rows).step_by(step_y).flat_map(move |y| {
        (0..cols)
            .step_by(step_x)
            .map(move |x| PlacementPosition::new(x as i32, y as i32))
    })
}

/// Positions for a secondary image.
///
/// Corner placements are flush with the canvas edges; `Repeat` tiles the
/// canvas. Coordinates may be negative if the watermark is larger than the
/// image.
pub fn calculate_image_positions(
    position: ImagePosition,
    image: &ImageDimensions,
    watermark: &WatermarkDimensions,
) -> impl Iterator<Item = PlacementPosition> {
    let img_w = image.width as i32;
    let img_h = image.height as i32;
    let wm_w = watermark.width as i32;
    let wm_h = watermark.height as i32;

    let single = match position {
        ImagePosition::TopLeft => Some(PlacementPosition::new(0, 0)),
        ImagePosition::TopRight => Some(PlacementPosition::new(img_w - wm_w, 0)),
        ImagePosition::BottomLeft => Some(PlacementPosition::new(0, img_h - wm_h)),
        ImagePosition::BottomRight => Some(PlacementPosition::new(img_w - wm_w, img_h - wm_h)),
        ImagePosition::Center => Some(PlacementPosition::new(
            (img_w - wm_w) / 2,
            (img_h - wm_h) / 2,
        )),
        ImagePosition::Repeat => None,
    };
    let tiled = (position == ImagePosition::Repeat)
        .then(|| calculate_tiled_positions(image, watermark));

    single.into_iter().chain(tiled.into_iter().flatten())
}

/// Check if a position is at least partially visible within the image.
pub fn is_visible(
    pos: &PlacementPosition,
    image: &ImageDimensions,
    watermark: &WatermarkDimensions,
) -> bool {
    let wm_right = pos.x + watermark.width as i32;
    let wm_bottom = pos.y + watermark.height as i32;

    pos.x < image.width as i32 && pos.y < image.height as i32 && wm_right > 0 && wm_bottom > 0
}

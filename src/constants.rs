// Constants module - centralized default values for configuration
//
// This module defines all default values used throughout the codebase.
// Using constants instead of magic numbers improves maintainability
// and makes it easier to understand and modify defaults.

// =============================================================================
// Text watermark defaults
// =============================================================================

/// Default font size in pixels
pub const DEFAULT_FONT_SIZE: f32 = 24.0;

/// Default text color
pub const DEFAULT_COLOR: &str = "#000000";

/// Default opacity for visible watermarks
pub const DEFAULT_OPACITY: f32 = 1.0;

/// Default horizontal spacing (corner margin, or gap between diagonal tiles)
pub const DEFAULT_H_SPACE: f32 = 20.0;

/// Default vertical spacing (corner margin, or gap between diagonal tiles)
pub const DEFAULT_V_SPACE: f32 = 20.0;

/// Default rotation of the diagonal tile pattern in degrees
pub const DEFAULT_ANGLE_DEGREES: f32 = -30.0;

/// Largest accepted font size in pixels
pub const MAX_FONT_SIZE: f32 = 4096.0;

/// Smallest diagonal tile cell side in pixels
pub const MIN_TILE_CELL: f32 = 1.0;

/// Most diagonal tiles rendered for one mask
pub const MAX_DIAGONAL_TILES: u64 = 4_194_304;

// =============================================================================
// Surface limits
// =============================================================================

/// Largest width or height a pixel surface may have
pub const MAX_SURFACE_DIMENSION: u32 = 32_767;

/// Largest pixel count a pixel surface may have (16384 x 16384)
pub const MAX_SURFACE_PIXELS: u64 = 268_435_456;

// =============================================================================
// Image fetcher defaults
// =============================================================================

/// Default fetch timeout in seconds for https sources
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Default maximum number of cached source images
pub const DEFAULT_CACHE_MAX_ENTRIES: u64 = 100;

/// Default cache TTL in seconds
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

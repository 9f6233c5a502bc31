// Paritymark Library
// Covert parity watermarks and visible overlays for raster images

pub mod constants;
pub mod logging;
pub mod watermark;

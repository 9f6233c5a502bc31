//! Image fetcher with caching.
//!
//! Loads target images and secondary watermark images from the local
//! filesystem or HTTPS URLs, decodes them to RGBA and keeps the decoded
//! buffers in memory for reuse.
//!
//! # Supported Sources
//!
//! - `path/to/image.png` or `file:///abs/path.png` - Local file
//! - `https://example.com/image.png` - Fetch from HTTPS URL
//!
//! # Caching
//!
//! Fetched images are cached as pre-decoded [`PixelBuffer`]s. The cache
//! uses LRU eviction with configurable TTL.
//!
//! # Example
//!
//! ```ignore
//! use paritymark::watermark::image_fetcher::{ImageFetcher, ImageFetcherConfig};
//!
//! let fetcher = ImageFetcher::new(ImageFetcherConfig::default())?;
//! let logo = fetcher.fetch("https://cdn.example.com/logo.png").await?;
//! ```

use super::{PixelBuffer, WatermarkError};
use crate::constants::{
    DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CACHE_TTL_SECS, DEFAULT_FETCH_TIMEOUT_SECS,
};
use image::ImageFormat;
use moka::future::Cache;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the image fetcher.
#[derive(Debug, Clone)]
pub struct ImageFetcherConfig {
    /// Maximum number of cached images.
    pub max_cache_entries: u64,
    /// Time-to-live for cached images.
    pub cache_ttl: Duration,
    /// Timeout for HTTPS requests.
    pub request_timeout: Duration,
}

impl Default for ImageFetcherConfig {
    fn default() -> Self {
        Self {
            max_cache_entries: DEFAULT_CACHE_MAX_ENTRIES,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }
}

/// Parsed source location for images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Local file path.
    File(PathBuf),
    /// HTTPS URL source.
    Https(String),
}

impl ImageSource {
    /// Parse a source string into an ImageSource.
    ///
    /// Plain strings are treated as file paths. `http://` and other URL
    /// schemes are rejected.
    pub fn parse(source: &str) -> Result<Self, WatermarkError> {
        if source.is_empty() {
            return Err(WatermarkError::InvalidParameter(
                "Image source cannot be empty".to_string(),
            ));
        }

        if let Some(path) = source.strip_prefix("file://") {
            if path.is_empty() {
                return Err(WatermarkError::InvalidParameter(format!(
                    "Invalid file source: {source}"
                )));
            }
            Ok(ImageSource::File(PathBuf::from(path)))
        } else if source.starts_with("https://") {
            Ok(ImageSource::Https(source.to_string()))
        } else if source.contains("://") {
            Err(WatermarkError::InvalidParameter(format!(
                "Unsupported source protocol: {source}. Use a file path or https://"
            )))
        } else {
            Ok(ImageSource::File(PathBuf::from(source)))
        }
    }

    /// Get a cache key for this source.
    pub fn cache_key(&self) -> String {
        match self {
            ImageSource::File(path) => format!("file://{}", path.display()),
            ImageSource::Https(url) => url.clone(),
        }
    }
}

/// Cached decoded image.
#[derive(Clone)]
pub struct CachedImage {
    /// The decoded RGBA pixels.
    pub image: Arc<PixelBuffer>,
}

impl std::fmt::Debug for CachedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedImage")
            .field("dimensions", &self.image.dimensions())
            .finish()
    }
}

impl CachedImage {
    /// Create a new cached image.
    pub fn new(image: PixelBuffer) -> Self {
        Self {
            image: Arc::new(image),
        }
    }
}

/// Fetcher for images with built-in caching.
#[derive(Clone)]
pub struct ImageFetcher {
    cache: Cache<String, CachedImage>,
    http_client: reqwest::Client,
}

impl ImageFetcher {
    /// Create a new image fetcher with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `WatermarkError::InvalidParameter` if the HTTP client cannot
    /// be created (e.g., TLS configuration issues).
    pub fn new(config: ImageFetcherConfig) -> Result<Self, WatermarkError> {
        let cache = Cache::builder()
            .max_capacity(config.max_cache_entries)
            .time_to_live(config.cache_ttl)
            .build();

        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                WatermarkError::InvalidParameter(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { cache, http_client })
    }

    /// Fetch an image from the given source.
    ///
    /// Images are cached after first fetch. Subsequent calls with the same
    /// source will return the cached image until TTL expires.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for a malformed source and
    /// `ResourceNotFound` when the bytes cannot be read or decoded.
    pub async fn fetch(&self, source: &str) -> Result<CachedImage, WatermarkError> {
        let parsed = ImageSource::parse(source)?;
        let cache_key = parsed.cache_key();

        // Check cache first
        if let Some(cached) = self.cache.get(&cache_key).await {
            tracing::debug!(source = %cache_key, "Image cache hit");
            return Ok(cached);
        }

        let image = match &parsed {
            ImageSource::File(path) => self.fetch_from_file(path).await?,
            ImageSource::Https(url) => self.fetch_from_https(url).await?,
        };

        tracing::info!(
            source = %cache_key,
            width = image.width(),
            height = image.height(),
            "Image loaded"
        );

        let cached = CachedImage::new(image);
        self.cache.insert(cache_key, cached.clone()).await;

        Ok(cached)
    }

    /// Read and decode a local file.
    async fn fetch_from_file(&self, path: &Path) -> Result<PixelBuffer, WatermarkError> {
        let data = tokio::fs::read(path).await.map_err(|e| {
            WatermarkError::ResourceNotFound(format!("Failed to read {}: {e}", path.display()))
        })?;

        decode_image(&data, &path.to_string_lossy())
    }

    /// Fetch image from HTTPS URL.
    async fn fetch_from_https(&self, url: &str) -> Result<PixelBuffer, WatermarkError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| WatermarkError::ResourceNotFound(format!("HTTP fetch failed: {e}")))?;

        if !response.status().is_success() {
            return Err(WatermarkError::ResourceNotFound(format!(
                "HTTP request failed with status: {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await.map_err(|e| {
            WatermarkError::ResourceNotFound(format!("Failed to read HTTP body: {e}"))
        })?;

        decode_image(&bytes, url)
    }

    /// Get the number of cached images.
    pub fn cache_size(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Clear all cached images.
    pub async fn clear_cache(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    /// Check if an image is cached.
    pub async fn is_cached(&self, source: &str) -> bool {
        if let Ok(parsed) = ImageSource::parse(source) {
            self.cache.get(&parsed.cache_key()).await.is_some()
        } else {
            false
        }
    }
}

/// Decode encoded image bytes into an RGBA buffer.
pub fn decode_image(data: &[u8], path: &str) -> Result<PixelBuffer, WatermarkError> {
    let format = detect_image_format(data, path)?;

    let decoded = image::load(Cursor::new(data), format)
        .map_err(|e| WatermarkError::ResourceNotFound(format!("Failed to decode image: {e}")))?;

    PixelBuffer::from_rgba_image(decoded.to_rgba8())
}

/// Detect image format from bytes or filename extension.
fn detect_image_format(data: &[u8], path: &str) -> Result<ImageFormat, WatermarkError> {
    // Try to detect from magic bytes first
    if let Ok(format) = image::guess_format(data) {
        return Ok(format);
    }

    // Fall back to extension
    let ext = path
        .rsplit('.')
        .next()
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => Ok(ImageFormat::Png),
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        "gif" => Ok(ImageFormat::Gif),
        "webp" => Ok(ImageFormat::WebP),
        _ => Err(WatermarkError::ResourceNotFound(format!(
            "Unsupported image format: {ext}"
        ))),
    }
}

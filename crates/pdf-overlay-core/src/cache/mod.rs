//! Decoded page rasters, keyed by a digest of their base64 payload.
//!
//! Redraws stay total; the cache only skips repeated base64 and WebP
//! decoding of the same page image.

use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use moka::sync::Cache;
use tracing::debug;

use crate::error::Result;
use crate::pdf::decode_page_image;

/// Default cache budget in megabytes
pub const DEFAULT_RASTER_CACHE_MB: u64 = 256;

/// In-memory cache of decoded page images with byte-size-based eviction.
#[derive(Clone)]
pub struct RasterCache {
    cache: Cache<String, Arc<RgbaImage>>,
}

impl Default for RasterCache {
    fn default() -> Self {
        Self::new(DEFAULT_RASTER_CACHE_MB, 0)
    }
}

impl RasterCache {
    pub fn new(max_mb: u64, ttl_seconds: u64) -> Self {
        let max_bytes = max_mb.saturating_mul(1024 * 1024);

        let mut builder = Cache::builder()
            .max_capacity(max_bytes)
            .weigher(|_key: &String, value: &Arc<RgbaImage>| -> u32 {
                // Weight is the pixel buffer size, capped at u32::MAX
                value.as_raw().len().try_into().unwrap_or(u32::MAX)
            });

        if ttl_seconds > 0 {
            builder = builder.time_to_live(Duration::from_secs(ttl_seconds));
        }

        Self {
            cache: builder.build(),
        }
    }

    fn key(image_data: &str) -> String {
        format!("{:x}", md5::compute(image_data.as_bytes()))
    }

    /// Decoded image for a stored page raster; `None` when the page has none.
    pub fn get_or_decode(&self, image_data: &str) -> Result<Option<Arc<RgbaImage>>> {
        if image_data.is_empty() {
            return Ok(None);
        }

        let key = Self::key(image_data);
        if let Some(image) = self.cache.get(&key) {
            return Ok(Some(image));
        }

        let Some(image) = decode_page_image(image_data)? else {
            return Ok(None);
        };
        debug!("Decoded page raster {}x{}", image.width(), image.height());

        let image = Arc::new(image);
        self.cache.insert(key, Arc::clone(&image));
        Ok(Some(image))
    }

    pub fn contains(&self, image_data: &str) -> bool {
        self.cache.contains_key(&Self::key(image_data))
    }

    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}

impl std::fmt::Debug for RasterCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

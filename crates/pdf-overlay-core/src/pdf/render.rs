use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::RgbaImage;
use mupdf::{Colorspace, Matrix};
use tracing::{debug, warn};
use webp::Encoder as WebpEncoder;

use crate::config::RenderConfig;
use crate::error::{Error, Result};
use super::document::PdfDocument;

/// Default oversampling factor; stored rasters are re-encoded later, so
/// they are captured well above display resolution.
pub const DEFAULT_RENDER_SCALE: f32 = 3.0;

/// Default lossy quality for stored rasters
pub const DEFAULT_RENDER_QUALITY: f32 = 85.0;

/// Page renderer for PDF documents
pub struct PageRenderer<'a> {
    pub doc: &'a PdfDocument,
    pub scale: f32,
    pub quality: f32,
}

impl<'a> PageRenderer<'a> {
    pub const fn new(doc: &'a PdfDocument) -> Self {
        Self {
            doc,
            scale: DEFAULT_RENDER_SCALE,
            quality: DEFAULT_RENDER_QUALITY,
        }
    }

    pub const fn with_config(doc: &'a PdfDocument, config: &RenderConfig) -> Self {
        Self {
            doc,
            scale: config.scale,
            quality: config.quality,
        }
    }

    /// Render a 1-based page to an RGBA image buffer
    pub fn render_page(&self, page_number: u32) -> Result<RgbaImage> {
        let render_error = |reason: String| Error::PdfRender {
            page: page_number,
            reason,
        };

        let (_doc, page) = self.doc.load_page(page_number)?;

        let matrix = Matrix::new_scale(self.scale, self.scale);

        let pixmap = page
            .to_pixmap(&matrix, &Colorspace::device_rgb(), 1.0, true)
            .map_err(|e| render_error(format!("Failed to render: {e}")))?;

        let pixels = pixmap.samples();
        let img_width = pixmap.width();
        let img_height = pixmap.height();

        let n = pixmap.n() as usize;
        let mut rgba_pixels = Vec::with_capacity((img_width * img_height * 4) as usize);

        for chunk in pixels.chunks(n) {
            match n {
                3 => {
                    rgba_pixels.extend_from_slice(chunk);
                    rgba_pixels.push(255);
                }
                4 => rgba_pixels.extend_from_slice(chunk),
                1 => rgba_pixels.extend_from_slice(&[chunk[0], chunk[0], chunk[0], 255]),
                _ => {
                    return Err(render_error(format!(
                        "Unexpected pixel format with {n} components"
                    )));
                }
            }
        }

        RgbaImage::from_raw(img_width, img_height, rgba_pixels)
            .ok_or_else(|| render_error("Failed to create image buffer".to_string()))
    }

    /// Render a page to lossy WebP bytes at the configured quality
    pub fn render_page_webp(&self, page_number: u32) -> Result<Vec<u8>> {
        let img = self.render_page(page_number)?;
        encode_webp(&img, self.quality)
    }

    /// Render a page and return it as a base64 WebP string for storage.
    ///
    /// An empty string means no raster could be produced for this page;
    /// callers treat the page as unavailable rather than failing.
    pub fn rasterize_base64(&self, page_number: u32) -> Result<String> {
        let img = self.render_page(page_number)?;

        if img.width() == 0 || img.height() == 0 {
            warn!("Page {} rendered to an empty pixmap", page_number);
            return Ok(String::new());
        }

        let bytes = encode_webp(&img, self.quality)?;
        debug!(
            "Rasterized page {} at {}x{} ({} bytes)",
            page_number,
            img.width(),
            img.height(),
            bytes.len()
        );

        Ok(BASE64.encode(bytes))
    }
}

/// Lossy WebP encoding of an RGBA buffer
pub fn encode_webp(img: &RgbaImage, quality: f32) -> Result<Vec<u8>> {
    if img.width() == 0 || img.height() == 0 {
        return Err(Error::ImageEncode("cannot encode an empty image".to_string()));
    }
    let encoder = WebpEncoder::from_rgba(img.as_raw(), img.width(), img.height());
    Ok(encoder.encode(quality).to_vec())
}

/// Decode a stored base64 raster.
///
/// Returns `Ok(None)` for the empty "unavailable" marker.
pub fn decode_page_image(image_data: &str) -> Result<Option<RgbaImage>> {
    if image_data.is_empty() {
        return Ok(None);
    }

    let bytes = BASE64
        .decode(image_data.trim())
        .map_err(|e| Error::ImageDecode(format!("invalid base64: {e}")))?;

    let img = image::load_from_memory(&bytes)
        .map_err(|e| Error::ImageDecode(e.to_string()))?
        .to_rgba8();

    Ok(Some(img))
}

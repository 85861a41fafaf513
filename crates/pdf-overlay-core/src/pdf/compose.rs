//! Multi-page PDF composition from raster frames.
//!
//! Each output page holds exactly one JPEG image XObject stretched over
//! the whole MediaBox. Page size in points follows the pixel size at
//! 96 dpi, so a 1200 px wide frame becomes a 900 pt wide page.

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use lopdf::{Dictionary, Document, Object, Stream};

use crate::error::{Error, Result};

/// Points per pixel at 96 dpi
const POINTS_PER_PIXEL: f32 = 0.75;

/// One encoded output page
#[derive(Debug, Clone)]
pub struct PageImage {
    /// Baseline JPEG bytes
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl PageImage {
    /// JPEG-encode an RGBA frame (alpha is dropped).
    pub fn from_rgba(img: &RgbaImage, quality: f32) -> Result<Self> {
        let rgb = image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let quality = quality.clamp(1.0, 100.0) as u8;

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, quality)
            .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
            .map_err(|e| Error::ImageEncode(format!("Failed to encode JPEG: {e}")))?;

        Ok(Self {
            jpeg,
            width: img.width(),
            height: img.height(),
        })
    }
}

/// Compose a PDF with one page per image, in order.
pub fn compose_image_pdf(pages: &[PageImage]) -> Result<Vec<u8>> {
    if pages.is_empty() {
        return Err(Error::Export("No pages to compose".to_string()));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(pages.len());

    for page in pages {
        let width_pt = page.width as f32 * POINTS_PER_PIXEL;
        let height_pt = page.height as f32 * POINTS_PER_PIXEL;

        let image_dict = Dictionary::from_iter([
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
            ("Width", Object::Integer(i64::from(page.width))),
            ("Height", Object::Integer(i64::from(page.height))),
            ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
            ("BitsPerComponent", Object::Integer(8)),
            ("Filter", Object::Name(b"DCTDecode".to_vec())),
        ]);
        let image_id = doc.add_object(Object::Stream(
            Stream::new(image_dict, page.jpeg.clone()).with_compression(false),
        ));

        let content = format!("q\n{width_pt} 0 0 {height_pt} 0 0 cm\n/Im0 Do\nQ\n");
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let resources = Dictionary::from_iter([(
            "XObject",
            Object::Dictionary(Dictionary::from_iter([("Im0", Object::Reference(image_id))])),
        )]);

        let page_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Dictionary(resources)),
            (
                "MediaBox",
                Object::Array(vec![
                    0.into(),
                    0.into(),
                    Object::Real(width_pt),
                    Object::Real(height_pt),
                ]),
            ),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let count = i64::try_from(kids.len()).unwrap_or(i64::MAX);
    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ])),
    );

    let catalog_id = doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| Error::Lopdf(format!("Failed to save composed PDF: {e}")))?;

    Ok(output)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn frame(width: u32, height: u32) -> PageImage {
        let img = RgbaImage::from_pixel(width, height, image::Rgba([255, 255, 255, 255]));
        PageImage::from_rgba(&img, 85.0).unwrap()
    }

    #[test]
    fn test_compose_empty_fails() {
        assert!(matches!(compose_image_pdf(&[]), Err(Error::Export(_))));
    }

    #[test]
    fn test_compose_one_page_per_image() {
        let bytes = compose_image_pdf(&[frame(40, 60), frame(40, 60), frame(80, 20)]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_jpeg_keeps_dimensions() {
        let page = frame(32, 12);
        assert_eq!((page.width, page.height), (32, 12));
        assert!(page.jpeg.starts_with(&[0xFF, 0xD8]));
    }
}

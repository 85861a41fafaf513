//! Drawing-context seam for the overlay renderer.

use image::{RgbaImage, imageops::FilterType};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::error::{Error, Result};
use crate::geometry::PixelRect;
use super::font::OverlayFont;

/// Straight-alpha RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[must_use]
    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

/// The operations the overlay renderer needs from a 2D drawing context.
///
/// Implementations must tolerate degenerate input (zero or negative
/// sizes) by drawing nothing.
pub trait Canvas {
    /// Resize and clear the drawing surface.
    fn resize(&mut self, width: u32, height: u32);
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Draw `image` stretched over the whole canvas.
    fn draw_image(&mut self, image: &RgbaImage);
    fn fill_rect(&mut self, rect: PixelRect, color: Color);
    fn stroke_rect(&mut self, rect: PixelRect, color: Color, line_width: f32);
    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color);
    /// Rendered width of `text` on one line at `font_size`.
    fn measure_text(&self, text: &str, font_size: f32) -> f32;
    /// Draw `text` with its baseline starting at `(x, baseline)`.
    fn fill_text(&mut self, text: &str, x: f32, baseline: f32, font_size: f32, color: Color);
}

/// Canvas backed by a tiny-skia pixmap
pub struct RasterCanvas {
    pixmap: Pixmap,
    font: OverlayFont,
}

impl RasterCanvas {
    pub fn new(font: OverlayFont) -> Result<Self> {
        let pixmap = Pixmap::new(1, 1)
            .ok_or_else(|| Error::ImageEncode("failed to allocate pixmap".to_string()))?;
        Ok(Self { pixmap, font })
    }

    /// Snapshot of the canvas as straight-alpha RGBA.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let data = self
            .pixmap
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        RgbaImage::from_raw(self.pixmap.width(), self.pixmap.height(), data)
            .unwrap_or_else(|| RgbaImage::new(0, 0))
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| Error::ImageEncode(format!("Failed to encode PNG: {e}")))
    }

    fn paint(color: Color) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(color.r, color.g, color.b, color.a);
        paint.anti_alias = true;
        paint
    }
}

fn skia_rect(rect: PixelRect) -> Option<Rect> {
    Rect::from_xywh(rect.x, rect.y, rect.width, rect.height)
}

impl Canvas for RasterCanvas {
    fn resize(&mut self, width: u32, height: u32) {
        if let Some(pixmap) = Pixmap::new(width.max(1), height.max(1)) {
            self.pixmap = pixmap;
        }
    }

    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn draw_image(&mut self, image: &RgbaImage) {
        let (width, height) = (self.pixmap.width(), self.pixmap.height());
        let scaled = if image.dimensions() == (width, height) {
            image.clone()
        } else {
            image::imageops::resize(image, width, height, FilterType::Triangle)
        };

        // tiny-skia stores premultiplied alpha
        for (dst, src) in self.pixmap.data_mut().chunks_exact_mut(4).zip(scaled.pixels()) {
            let [r, g, b, a] = src.0;
            let premultiply = |c: u8| ((u16::from(c) * u16::from(a) + 127) / 255) as u8;
            dst.copy_from_slice(&[premultiply(r), premultiply(g), premultiply(b), a]);
        }
    }

    fn fill_rect(&mut self, rect: PixelRect, color: Color) {
        if let Some(rect) = skia_rect(rect) {
            self.pixmap
                .fill_rect(rect, &Self::paint(color), Transform::identity(), None);
        }
    }

    fn stroke_rect(&mut self, rect: PixelRect, color: Color, line_width: f32) {
        let Some(rect) = skia_rect(rect) else {
            return;
        };
        let path = PathBuilder::from_rect(rect);
        let stroke = Stroke {
            width: line_width,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &Self::paint(color), &stroke, Transform::identity(), None);
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color) {
        if let Some(path) = PathBuilder::from_circle(cx, cy, radius) {
            self.pixmap.fill_path(
                &path,
                &Self::paint(color),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    fn measure_text(&self, text: &str, font_size: f32) -> f32 {
        self.font.text_width(text, font_size)
    }

    fn fill_text(&mut self, text: &str, x: f32, baseline: f32, font_size: f32, color: Color) {
        if font_size <= 0.0 || text.is_empty() {
            return;
        }
        let mut builder = PathBuilder::new();
        self.font.outline_text(text, x, baseline, font_size, &mut builder);
        if let Some(path) = builder.finish() {
            self.pixmap.fill_path(
                &path,
                &Self::paint(color),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }
}

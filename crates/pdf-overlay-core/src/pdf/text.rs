//! Positioned text extraction.
//!
//! Extraction happens in two steps. The mupdf adapter turns every text
//! line of a page into a [`TextItem`] shaped like a PDF text-show
//! operation: the string, a 6-element text matrix in bottom-left-origin
//! page space, and the advance width. [`extract_segments`] then converts
//! those items into viewport ratios.

use mupdf::{Point, Quad, TextPageOptions};
use tracing::debug;

use crate::error::{Error, Result};
use crate::segment::TextSegment;
use super::document::PdfDocument;

/// Page dimensions the ratios are computed against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

/// One positioned run of text as reported by the PDF library
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    /// `[a, b, c, d, tx, ty]` with a bottom-left origin
    pub transform: [f32; 6],
    /// Advance width in viewport units
    pub width: f32,
}

/// Convert positioned text items into resolution-independent segments.
///
/// Items whose trimmed text is empty are dropped; everything else keeps
/// document order.
pub fn extract_segments(items: &[TextItem], viewport: Viewport) -> Vec<TextSegment> {
    items
        .iter()
        .filter(|item| !item.text.trim().is_empty())
        .map(|item| {
            let [a, b, _, _, tx, ty] = item.transform;
            let font_size = a.hypot(b);

            TextSegment::new(
                item.text.clone(),
                tx / viewport.width,
                (viewport.height - ty) / viewport.height,
                item.width / viewport.width,
                font_size / viewport.height,
                font_size,
                viewport.width,
                viewport.height,
            )
        })
        .collect()
}

/// Text extraction from PDF pages
pub struct TextExtractor<'a> {
    pub doc: &'a PdfDocument,
}

impl<'a> TextExtractor<'a> {
    pub const fn new(doc: &'a PdfDocument) -> Self {
        Self { doc }
    }

    /// Extract the segments of a 1-based page along with the viewport used.
    pub fn extract_page(&self, page_number: u32) -> Result<(Viewport, Vec<TextSegment>)> {
        let (viewport, items) = self.page_text_items(page_number)?;
        let segments = extract_segments(&items, viewport);

        debug!(
            "Page {}: {} text items, {} segments",
            page_number,
            items.len(),
            segments.len()
        );

        Ok((viewport, segments))
    }

    /// Read the page's text lines as [`TextItem`]s at scale 1.
    pub fn page_text_items(&self, page_number: u32) -> Result<(Viewport, Vec<TextItem>)> {
        let extraction_error = |reason: String| Error::PdfTextExtraction {
            page: page_number,
            reason,
        };

        let (_doc, page) = self.doc.load_page(page_number)?;

        let bounds = page
            .bounds()
            .map_err(|e| extraction_error(format!("Failed to get bounds: {e}")))?;
        let viewport = Viewport {
            width: bounds.x1 - bounds.x0,
            height: bounds.y1 - bounds.y0,
        };

        let text_page = page
            .to_text_page(TextPageOptions::empty())
            .map_err(|e| extraction_error(format!("Failed to get text page: {e}")))?;

        let mut items = Vec::new();

        for block in text_page.blocks() {
            for line in block.lines() {
                let mut text = String::new();
                let mut first: Option<(Point, Quad, f32)> = None;
                let mut last_quad: Option<Quad> = None;

                for text_char in line.chars() {
                    if let Some(c) = text_char.char() {
                        text.push(c);
                    }
                    let quad = text_char.quad();
                    if first.is_none() {
                        first = Some((text_char.origin(), quad, text_char.size()));
                    }
                    last_quad = Some(quad);
                }

                let (Some((origin, first_quad, size)), Some(last_quad)) = (first, last_quad) else {
                    continue;
                };

                items.push(line_item(
                    text,
                    origin,
                    &first_quad,
                    &last_quad,
                    size,
                    (bounds.x0, bounds.y0),
                    viewport,
                ));
            }
        }

        Ok((viewport, items))
    }
}

/// Rebuild a bottom-origin text matrix for one mupdf line.
///
/// mupdf reports glyph quads and baseline origins in top-left page space.
/// The baseline direction comes from the first glyph's bottom edge, so
/// rotated lines keep their rotation in `a`/`b`.
fn line_item(
    text: String,
    origin: Point,
    first: &Quad,
    last: &Quad,
    size: f32,
    page_origin: (f32, f32),
    viewport: Viewport,
) -> TextItem {
    let (dx, dy) = (first.lr.x - first.ll.x, first.lr.y - first.ll.y);
    let len = dx.hypot(dy);
    let (cos, sin) = if len > f32::EPSILON {
        (dx / len, -dy / len)
    } else {
        (1.0, 0.0)
    };

    // Advance from the first glyph's start to the last glyph's end,
    // measured along the baseline.
    let span_x = last.lr.x - first.ll.x;
    let span_y = -(last.lr.y - first.ll.y);
    let width = (span_x * cos + span_y * sin).max(0.0);

    let tx = origin.x - page_origin.0;
    let ty = viewport.height - (origin.y - page_origin.1);

    TextItem {
        text,
        transform: [size * cos, size * sin, -size * sin, size * cos, tx, ty],
        width,
    }
}

//! Frame rendering: source raster, masks, re-typeset text, edit feedback.
//!
//! [`OverlayRenderer::render`] is total. Every call resizes the canvas
//! and repaints it from the inputs alone, so callers can redraw on any
//! state change and the latest call always wins.

use std::collections::BTreeSet;

use image::RgbaImage;

use crate::config::{OverlayConfig, TextColor};
use crate::geometry::PixelRect;
use crate::segment::TextSegment;
use crate::selection::GesturePreview;
use super::canvas::{Canvas, Color};

/// Page aspect (height / width) used when no raster is available
const FALLBACK_ASPECT: f32 = 1.414;

const HIGHLIGHT: Color = Color::rgb(0, 120, 255);
const UNSELECTED_OUTLINE_ALPHA: u8 = 90;
const SELECTED_FILL_ALPHA: u8 = 50;
const GESTURE_FILL_ALPHA: u8 = 35;
const UNSELECTED_LINE_WIDTH: f32 = 1.0;
const SELECTED_LINE_WIDTH: f32 = 2.5;
const ANCHOR_RADIUS: f32 = 5.0;

/// Everything a frame depends on.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    /// Decoded page raster; `None` draws a blank page
    pub image: Option<&'a RgbaImage>,
    pub segments: &'a [TextSegment],
    /// Skip masking and re-typesetting, showing the source raster as is
    pub show_original: bool,
    /// Draw selection outlines and gesture feedback
    pub edit_mode: bool,
    pub selected: &'a BTreeSet<usize>,
    pub gesture: Option<GesturePreview>,
}

/// Where one segment ended up on the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentLayout {
    pub index: usize,
    /// Opaque rectangle covering the original glyphs
    pub mask: PixelRect,
    /// Text box: `x`/`width` bound the text, `y + height` is the baseline
    pub text_box: PixelRect,
    /// Font size before shrink-to-fit
    pub nominal_font_size: f32,
    /// Font size actually drawn
    pub font_size: f32,
}

impl SegmentLayout {
    pub fn baseline(&self) -> f32 {
        self.text_box.y + self.text_box.height
    }
}

/// Geometry of a rendered frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameLayout {
    pub width: u32,
    pub height: u32,
    /// Empty when `show_original` was set
    pub segments: Vec<SegmentLayout>,
}

/// Shrink `nominal` so `text` fits `box_width` on a single line.
///
/// Text that already fits keeps the nominal size; there is no wrapping.
/// An empty box yields size 0.
pub fn fit_font_size(
    text: &str,
    nominal: f32,
    box_width: f32,
    measure: impl Fn(&str, f32) -> f32,
) -> f32 {
    if nominal <= 0.0 || box_width <= 0.0 {
        return 0.0;
    }
    let measured = measure(text, nominal);
    if measured <= box_width {
        return nominal;
    }
    (nominal * box_width / measured).max(0.0)
}

/// Draws translated overlays onto a canvas
#[derive(Debug, Clone)]
pub struct OverlayRenderer {
    pub display_width: u32,
    pub mask_padding: f32,
    pub mask_ascent: f32,
    pub mask_descent: f32,
    pub text_color: Color,
    pub mask_color: Color,
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new(&OverlayConfig::default(), TextColor::default())
    }
}

impl OverlayRenderer {
    pub fn new(config: &OverlayConfig, text_color: TextColor) -> Self {
        let (r, g, b) = text_color.to_rgb_bytes();
        Self {
            display_width: config.display_width,
            mask_padding: config.mask_padding,
            mask_ascent: config.mask_ascent,
            mask_descent: config.mask_descent,
            text_color: Color::rgb(r, g, b),
            mask_color: Color::WHITE,
        }
    }

    /// Same renderer, drawing at another canvas width.
    #[must_use]
    pub fn with_width(&self, display_width: u32) -> Self {
        Self {
            display_width,
            ..self.clone()
        }
    }

    /// Canvas size for a source raster, preserving its aspect ratio.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn canvas_size(&self, image: Option<&RgbaImage>) -> (u32, u32) {
        let width = self.display_width.max(1);
        let aspect = match image {
            Some(img) if img.width() > 0 => img.height() as f32 / img.width() as f32,
            _ => FALLBACK_ASPECT,
        };
        let height = (width as f32 * aspect).round().max(1.0) as u32;
        (width, height)
    }

    /// Repaint the whole frame.
    #[allow(clippy::cast_precision_loss)]
    pub fn render<C: Canvas>(&self, canvas: &mut C, input: &FrameInput<'_>) -> FrameLayout {
        let (width, height) = self.canvas_size(input.image);
        canvas.resize(width, height);

        match input.image {
            Some(img) => canvas.draw_image(img),
            None => canvas.fill_rect(
                PixelRect::new(0.0, 0.0, width as f32, height as f32),
                Color::WHITE,
            ),
        }

        // Current canvas size is the only basis for projecting ratios.
        let (w, h) = (canvas.width() as f32, canvas.height() as f32);

        let mut layout = FrameLayout {
            width: canvas.width(),
            height: canvas.height(),
            segments: Vec::new(),
        };

        if !input.show_original {
            layout.segments = input
                .segments
                .iter()
                .enumerate()
                .map(|(index, segment)| self.layout_segment(canvas, index, segment, w, h))
                .collect();

            // All masks first so a neighbour's mask never clips earlier text.
            for seg in &layout.segments {
                canvas.fill_rect(seg.mask, self.mask_color);
            }
            for (seg, segment) in layout.segments.iter().zip(input.segments) {
                canvas.fill_text(
                    &segment.text,
                    seg.text_box.x,
                    seg.baseline(),
                    seg.font_size,
                    self.text_color,
                );
            }
        }

        if input.edit_mode {
            Self::draw_selection(canvas, input, w, h);
        }

        layout
    }

    fn layout_segment<C: Canvas>(
        &self,
        canvas: &C,
        index: usize,
        segment: &TextSegment,
        w: f32,
        h: f32,
    ) -> SegmentLayout {
        let x = segment.x_ratio * w;
        let baseline = segment.y_ratio * h;
        let box_width = segment.width_ratio * w;
        let box_height = segment.height_ratio * h;

        let mask = PixelRect::new(
            x - self.mask_padding,
            baseline - box_height * self.mask_ascent,
            box_width + self.mask_padding * 2.0,
            box_height * (self.mask_ascent + self.mask_descent),
        );

        let nominal = if segment.viewport_width > 0.0 {
            segment.font_size * w / segment.viewport_width
        } else {
            0.0
        };
        let font_size = fit_font_size(&segment.text, nominal, box_width, |text, size| {
            canvas.measure_text(text, size)
        });

        SegmentLayout {
            index,
            mask,
            text_box: PixelRect::new(x, baseline - box_height, box_width, box_height),
            nominal_font_size: nominal,
            font_size,
        }
    }

    fn draw_selection<C: Canvas>(canvas: &mut C, input: &FrameInput<'_>, w: f32, h: f32) {
        for (index, segment) in input.segments.iter().enumerate() {
            let rect = segment.bounds().to_pixels(w, h);
            if input.selected.contains(&index) {
                canvas.fill_rect(rect, HIGHLIGHT.with_alpha(SELECTED_FILL_ALPHA));
                canvas.stroke_rect(rect, HIGHLIGHT, SELECTED_LINE_WIDTH);
            } else {
                canvas.stroke_rect(
                    rect,
                    HIGHLIGHT.with_alpha(UNSELECTED_OUTLINE_ALPHA),
                    UNSELECTED_LINE_WIDTH,
                );
            }
        }

        match input.gesture {
            Some(GesturePreview::Marquee(rect)) => {
                let rect = rect.to_pixels(w, h);
                canvas.fill_rect(rect, HIGHLIGHT.with_alpha(GESTURE_FILL_ALPHA));
                canvas.stroke_rect(rect, HIGHLIGHT, UNSELECTED_LINE_WIDTH);
            }
            Some(GesturePreview::Anchor(point)) => {
                canvas.fill_circle(point.x * w, point.y * h, ANCHOR_RADIUS, HIGHLIGHT);
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{NormPoint, NormRect};

    /// Records draw calls; every glyph is `0.5 * font_size` wide.
    #[derive(Default)]
    struct RecordingCanvas {
        width: u32,
        height: u32,
        ops: Vec<Op>,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Image,
        Fill(PixelRect, Color),
        Stroke(PixelRect, f32),
        Circle(f32, f32),
        Text(String, f32, f32, f32),
    }

    impl Canvas for RecordingCanvas {
        fn resize(&mut self, width: u32, height: u32) {
            self.width = width;
            self.height = height;
            self.ops.clear();
        }
        fn width(&self) -> u32 {
            self.width
        }
        fn height(&self) -> u32 {
            self.height
        }
        fn draw_image(&mut self, _image: &RgbaImage) {
            self.ops.push(Op::Image);
        }
        fn fill_rect(&mut self, rect: PixelRect, color: Color) {
            self.ops.push(Op::Fill(rect, color));
        }
        fn stroke_rect(&mut self, rect: PixelRect, _color: Color, line_width: f32) {
            self.ops.push(Op::Stroke(rect, line_width));
        }
        fn fill_circle(&mut self, cx: f32, cy: f32, _radius: f32, _color: Color) {
            self.ops.push(Op::Circle(cx, cy));
        }
        #[allow(clippy::cast_precision_loss)]
        fn measure_text(&self, text: &str, font_size: f32) -> f32 {
            text.chars().count() as f32 * font_size * 0.5
        }
        fn fill_text(&mut self, text: &str, x: f32, baseline: f32, font_size: f32, _color: Color) {
            self.ops.push(Op::Text(text.to_string(), x, baseline, font_size));
        }
    }

    fn page_image() -> RgbaImage {
        // 3x oversampled US Letter
        RgbaImage::new(1836, 2376)
    }

    fn segment(text: &str) -> TextSegment {
        TextSegment::new("orig", 0.2, 0.3, 0.1, 0.05, 12.0, 612.0, 792.0).with_text(text)
    }

    fn input<'a>(
        image: &'a RgbaImage,
        segments: &'a [TextSegment],
        selected: &'a BTreeSet<usize>,
    ) -> FrameInput<'a> {
        FrameInput {
            image: Some(image),
            segments,
            show_original: false,
            edit_mode: false,
            selected,
            gesture: None,
        }
    }

    #[test]
    fn test_canvas_keeps_source_aspect() {
        let renderer = OverlayRenderer::default();
        let img = page_image();
        assert_eq!(renderer.canvas_size(Some(&img)), (1200, 1553));
    }

    #[test]
    fn test_positions_scale_with_canvas_width() {
        let img = page_image();
        let segments = vec![segment("Hi")];
        let selected = BTreeSet::new();

        for width in [600_u32, 1200, 2400] {
            let renderer = OverlayRenderer::default().with_width(width);
            let mut canvas = RecordingCanvas::default();
            let layout = renderer.render(&mut canvas, &input(&img, &segments, &selected));

            let (w, h) = (layout.width as f32, layout.height as f32);
            let seg = layout.segments[0];
            assert!((seg.text_box.x - 0.2 * w).abs() < 1e-3);
            assert!((seg.baseline() - 0.3 * h).abs() < 1e-3);
            assert!((seg.text_box.width - 0.1 * w).abs() < 1e-3);
            assert!((seg.nominal_font_size - 12.0 * w / 612.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_short_text_keeps_nominal_size() {
        let img = page_image();
        let segments = vec![segment("Hi")];
        let selected = BTreeSet::new();
        let mut canvas = RecordingCanvas::default();

        let layout = OverlayRenderer::default().render(&mut canvas, &input(&img, &segments, &selected));
        let seg = layout.segments[0];
        assert!((seg.font_size - seg.nominal_font_size).abs() < f32::EPSILON);
    }

    #[test]
    fn test_long_text_shrinks_to_box() {
        let img = page_image();
        let segments = vec![segment("A considerably longer translated sentence")];
        let selected = BTreeSet::new();
        let mut canvas = RecordingCanvas::default();

        let layout = OverlayRenderer::default().render(&mut canvas, &input(&img, &segments, &selected));
        let seg = layout.segments[0];
        assert!(seg.font_size < seg.nominal_font_size);
        let drawn = canvas.measure_text(&segments[0].text, seg.font_size);
        assert!(drawn <= seg.text_box.width + 1e-3);
    }

    #[test]
    fn test_fit_font_size_never_overflows() {
        let measure = |t: &str, s: f32| t.len() as f32 * s * 0.6;
        for (text, box_width) in [("x", 1.0), ("hello world", 37.0), ("abc", 0.5), ("", 10.0)] {
            let size = fit_font_size(text, 20.0, box_width, measure);
            assert!(measure(text, size) <= box_width + 1e-4, "{text} overflowed {box_width}");
        }
    }

    #[test]
    fn test_fit_font_size_zero_box() {
        assert!(fit_font_size("abc", 12.0, 0.0, |t, s| t.len() as f32 * s).abs() < f32::EPSILON);
    }

    #[test]
    fn test_masks_drawn_before_text() {
        let img = page_image();
        let segments = vec![segment("one"), segment("two")];
        let selected = BTreeSet::new();
        let mut canvas = RecordingCanvas::default();

        OverlayRenderer::default().render(&mut canvas, &input(&img, &segments, &selected));

        let kinds: Vec<_> = canvas
            .ops
            .iter()
            .map(|op| match op {
                Op::Image => 'i',
                Op::Fill(..) => 'f',
                Op::Text(..) => 't',
                _ => '?',
            })
            .collect();
        assert_eq!(kinds, vec!['i', 'f', 'f', 't', 't']);
    }

    #[test]
    fn test_mask_covers_text_box() {
        let img = page_image();
        let segments = vec![segment("x")];
        let selected = BTreeSet::new();
        let mut canvas = RecordingCanvas::default();

        let layout = OverlayRenderer::default().render(&mut canvas, &input(&img, &segments, &selected));
        let seg = layout.segments[0];
        assert!(seg.mask.x < seg.text_box.x);
        assert!(seg.mask.y < seg.text_box.y);
        assert!(seg.mask.y + seg.mask.height > seg.baseline());
        assert!(seg.mask.x + seg.mask.width > seg.text_box.x + seg.text_box.width);
    }

    #[test]
    fn test_show_original_skips_overlay() {
        let img = page_image();
        let segments = vec![segment("Hello")];
        let selected = BTreeSet::new();
        let mut canvas = RecordingCanvas::default();
        let mut frame = input(&img, &segments, &selected);
        frame.show_original = true;

        let layout = OverlayRenderer::default().render(&mut canvas, &frame);
        assert!(layout.segments.is_empty());
        assert_eq!(canvas.ops, vec![Op::Image]);
    }

    #[test]
    fn test_edit_mode_outlines_and_feedback() {
        let img = page_image();
        let segments = vec![segment("a"), segment("b")];
        let selected = BTreeSet::from([1]);
        let mut canvas = RecordingCanvas::default();
        let mut frame = input(&img, &segments, &selected);
        frame.show_original = true;
        frame.edit_mode = true;
        frame.gesture = Some(GesturePreview::Anchor(NormPoint::new(0.5, 0.5)));

        OverlayRenderer::default().render(&mut canvas, &frame);

        let strokes: Vec<f32> = canvas
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Stroke(_, width) => Some(*width),
                _ => None,
            })
            .collect();
        assert_eq!(strokes, vec![UNSELECTED_LINE_WIDTH, SELECTED_LINE_WIDTH]);
        assert!(canvas.ops.contains(&Op::Circle(600.0, 0.5 * 1553.0)));
    }

    #[test]
    fn test_marquee_feedback() {
        let img = page_image();
        let selected = BTreeSet::new();
        let mut canvas = RecordingCanvas::default();
        let mut frame = input(&img, &[], &selected);
        frame.edit_mode = true;
        frame.gesture = Some(GesturePreview::Marquee(NormRect::new(0.0, 0.0, 0.5, 0.5)));

        OverlayRenderer::default().render(&mut canvas, &frame);
        assert!(canvas
            .ops
            .iter()
            .any(|op| matches!(op, Op::Stroke(r, _) if (r.width - 600.0).abs() < 1e-3)));
    }

    #[test]
    fn test_missing_image_draws_blank_page() {
        let segments = vec![segment("x")];
        let selected = BTreeSet::new();
        let mut canvas = RecordingCanvas::default();
        let frame = FrameInput {
            image: None,
            segments: &segments,
            show_original: false,
            edit_mode: false,
            selected: &selected,
            gesture: None,
        };

        let layout = OverlayRenderer::default().render(&mut canvas, &frame);
        assert_eq!(layout.width, 1200);
        assert!(matches!(canvas.ops[0], Op::Fill(_, Color::WHITE)));
    }

    #[test]
    fn test_degenerate_segment_does_not_panic() {
        let img = page_image();
        let segments = vec![TextSegment::new("x", 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0)];
        let selected = BTreeSet::from([0, 7]);
        let mut canvas = RecordingCanvas::default();
        let mut frame = input(&img, &segments, &selected);
        frame.edit_mode = true;

        let layout = OverlayRenderer::default().render(&mut canvas, &frame);
        assert!(layout.segments[0].font_size.abs() < f32::EPSILON);
    }
}

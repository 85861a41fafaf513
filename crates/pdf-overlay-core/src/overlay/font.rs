//! TrueType/OpenType font used to typeset overlay text.
//!
//! The face is re-parsed from the shared bytes on each use; `ttf_parser`
//! parsing is lazy, so this only touches the table directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;
use ttf_parser::{Face, GlyphId, OutlineBuilder};

use crate::error::{Error, Result};

/// Fonts probed when no font path is configured
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Parsed font bytes plus the metrics the renderer needs
#[derive(Clone)]
pub struct OverlayFont {
    data: Arc<Vec<u8>>,
    units_per_em: u16,
}

impl OverlayFont {
    /// Parse a font from raw bytes (first face of a collection).
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let face = Face::parse(&data, 0)
            .map_err(|e| Error::FontUnavailable(format!("Failed to parse font: {e}")))?;
        let units_per_em = face.units_per_em();

        Ok(Self {
            data: Arc::new(data),
            units_per_em,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            Error::FontUnavailable(format!("Failed to read font {}: {e}", path.display()))
        })?;
        Self::from_bytes(data)
    }

    /// Load the configured font, or the first usable system font.
    pub fn load(configured: Option<&Path>) -> Result<Self> {
        if let Some(path) = configured {
            return Self::from_file(path);
        }

        for candidate in SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from) {
            if !candidate.exists() {
                continue;
            }
            match Self::from_file(&candidate) {
                Ok(font) => {
                    debug!("Using overlay font {}", candidate.display());
                    return Ok(font);
                }
                Err(e) => debug!("Skipping {}: {}", candidate.display(), e),
            }
        }

        Err(Error::FontUnavailable(
            "no font configured and no system font found; set overlay.font_path".to_string(),
        ))
    }

    fn face(&self) -> Option<Face<'_>> {
        Face::parse(&self.data, 0).ok()
    }

    /// Advance width of `text` in pixels at the given size.
    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        let Some(face) = self.face() else {
            return 0.0;
        };
        let total: u32 = text
            .chars()
            .map(|c| glyph_advance(&face, c))
            .map(u32::from)
            .sum();
        #[allow(clippy::cast_precision_loss)]
        let total = total as f32;
        total * font_size / f32::from(self.units_per_em.max(1))
    }

    /// Emit glyph outlines for `text` with the pen starting at `(x, baseline)`.
    pub fn outline_text<B: PathSink>(&self, text: &str, x: f32, baseline: f32, font_size: f32, sink: &mut B) {
        let Some(face) = self.face() else {
            return;
        };
        let scale = font_size / f32::from(self.units_per_em.max(1));
        let mut pen_x = x;

        for c in text.chars() {
            let glyph = face.glyph_index(c).unwrap_or(GlyphId(0));
            let mut builder = GlyphPlacer {
                sink: &mut *sink,
                origin_x: pen_x,
                baseline,
                scale,
            };
            face.outline_glyph(glyph, &mut builder);
            pen_x += f32::from(glyph_advance(&face, c)) * scale;
        }
    }
}

impl std::fmt::Debug for OverlayFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayFont")
            .field("units_per_em", &self.units_per_em)
            .field("bytes_len", &self.data.len())
            .finish()
    }
}

fn glyph_advance(face: &Face<'_>, c: char) -> u16 {
    let glyph = face.glyph_index(c).unwrap_or(GlyphId(0));
    face.glyph_hor_advance(glyph).unwrap_or(0)
}

/// Receiver of glyph outlines in canvas pixel space (y down)
pub trait PathSink {
    fn move_to(&mut self, x: f32, y: f32);
    fn line_to(&mut self, x: f32, y: f32);
    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32);
    fn cubic_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32);
    fn close(&mut self);
}

impl PathSink for tiny_skia::PathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        Self::move_to(self, x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        Self::line_to(self, x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        Self::quad_to(self, x1, y1, x, y);
    }

    fn cubic_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        Self::cubic_to(self, x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        Self::close(self);
    }
}

/// Maps font units (y up) to canvas pixels (y down) for one glyph.
struct GlyphPlacer<'a, B: PathSink> {
    sink: &'a mut B,
    origin_x: f32,
    baseline: f32,
    scale: f32,
}

impl<B: PathSink> GlyphPlacer<'_, B> {
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin_x + x * self.scale, self.baseline - y * self.scale)
    }
}

impl<B: PathSink> OutlineBuilder for GlyphPlacer<'_, B> {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.sink.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.sink.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.sink.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.sink.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.sink.close();
    }
}

//! Text segments and translated pages.

use serde::{Deserialize, Serialize};

use crate::geometry::{NormPoint, NormRect};

/// One run of text recovered from a source page.
///
/// Position and size are ratios of the viewport the page was extracted
/// at. `x_ratio`/`y_ratio` is the baseline origin, measured from the top
/// of the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSegment {
    /// Current (possibly translated) content
    pub text: String,
    /// Untranslated content; never changed after extraction
    original_text: String,
    pub x_ratio: f32,
    pub y_ratio: f32,
    pub width_ratio: f32,
    pub height_ratio: f32,
    /// Glyph scale taken from the text matrix, in viewport units
    pub font_size: f32,
    pub viewport_width: f32,
    pub viewport_height: f32,
}

impl TextSegment {
    /// Create an untranslated segment (`text == original_text`).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        text: impl Into<String>,
        x_ratio: f32,
        y_ratio: f32,
        width_ratio: f32,
        height_ratio: f32,
        font_size: f32,
        viewport_width: f32,
        viewport_height: f32,
    ) -> Self {
        let text = text.into();
        Self {
            original_text: text.clone(),
            text,
            x_ratio,
            y_ratio,
            width_ratio,
            height_ratio,
            font_size,
            viewport_width,
            viewport_height,
        }
    }

    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    /// Same geometry and original, with `text` replaced.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Bounding box: `x..x+w` horizontally, `y-h..y` vertically.
    pub fn bounds(&self) -> NormRect {
        NormRect::new(
            self.x_ratio,
            self.y_ratio - self.height_ratio,
            self.x_ratio + self.width_ratio,
            self.y_ratio,
        )
    }

    /// Point used for nearest-segment picking (center of the box).
    pub fn anchor(&self) -> NormPoint {
        NormPoint::new(
            self.x_ratio + self.width_ratio / 2.0,
            self.y_ratio - self.height_ratio / 2.0,
        )
    }

    pub fn is_translated(&self) -> bool {
        self.text != self.original_text
    }

    /// Restore the untranslated text.
    pub fn revert(&mut self) {
        self.text.clone_from(&self.original_text);
    }
}

/// One page of a project, as persisted after a translation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslatedPage {
    /// 1-based, unique within a project
    pub page_number: u32,
    /// Base64 raster captured at extraction time; empty when unavailable
    pub image_data: String,
    /// Extraction order; indices are the selection keys
    pub segments: Vec<TextSegment>,
}

impl TranslatedPage {
    pub const fn new(page_number: u32, image_data: String, segments: Vec<TextSegment>) -> Self {
        Self {
            page_number,
            image_data,
            segments,
        }
    }

    /// Whether a raster was captured for this page.
    pub fn is_available(&self) -> bool {
        !self.image_data.is_empty()
    }

    /// Replace the whole segment list (batch-edit save).
    pub fn replace_segments(&mut self, segments: Vec<TextSegment>) {
        self.segments = segments;
    }
}

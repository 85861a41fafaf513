//! Resolution-independent page geometry.
//!
//! All positions are stored as ratios of the page viewport (`0.0..=1.0`,
//! top-left origin). Pixel values only exist transiently, computed against
//! whatever canvas is being drawn right now.

use serde::{Deserialize, Serialize};

/// A point in normalized page space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormPoint {
    pub x: f32,
    pub y: f32,
}

impl NormPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(self, other: Self) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned rectangle in normalized page space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormRect {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl NormRect {
    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Build a rectangle from any two opposite corners.
    pub fn from_corners(a: NormPoint, b: NormPoint) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Standard AABB overlap test.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Project onto a canvas of the given pixel size.
    pub fn to_pixels(&self, canvas_width: f32, canvas_height: f32) -> PixelRect {
        PixelRect {
            x: self.min_x * canvas_width,
            y: self.min_y * canvas_height,
            width: self.width() * canvas_width,
            height: self.height() * canvas_height,
        }
    }
}

/// Rectangle in canvas pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// On-screen placement of the drawn canvas, as reported by the client
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CanvasRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// Convert a raw pointer position into normalized page coordinates.
///
/// A collapsed canvas maps every pointer to the origin.
pub fn normalize_pointer(client_x: f32, client_y: f32, canvas: CanvasRect) -> NormPoint {
    let ratio = |offset: f32, extent: f32| {
        if extent > 0.0 { offset / extent } else { 0.0 }
    };
    NormPoint {
        x: ratio(client_x - canvas.left, canvas.width),
        y: ratio(client_y - canvas.top, canvas.height),
    }
}

mod canvas;
mod font;
mod renderer;

pub use canvas::{Canvas, Color, RasterCanvas};
pub use font::{OverlayFont, PathSink};
pub use renderer::{FrameInput, FrameLayout, OverlayRenderer, SegmentLayout, fit_font_size};

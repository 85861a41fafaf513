//! PDF Overlay Core Library
//!
//! Translated text overlays for rendered PDF pages:
//! - Positioned text extraction with resolution-independent coordinates
//! - Page rasterization and overlay redraw at any canvas size
//! - Single, area and two-point segment selection
//! - Translation passes, batch editing and PDF export over a project store

pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod overlay;
pub mod pass;
pub mod pdf;
pub mod segment;
pub mod selection;
pub mod session;
pub mod store;
pub mod translator;
pub mod util;

pub use batch::{BatchEdit, BatchEntry};
pub use cache::RasterCache;
pub use config::{AppConfig, BackendKind, Lang, TextColor, TranslatorConfig};
pub use error::{Error, Result};
pub use export::{ExportOutcome, PdfExporter};
pub use geometry::{CanvasRect, NormPoint, NormRect, PixelRect, normalize_pointer};
pub use overlay::{
    Canvas, Color, FrameInput, FrameLayout, OverlayFont, OverlayRenderer, RasterCanvas,
    SegmentLayout, fit_font_size,
};
pub use pass::{PassProgress, PassReport, TranslationPass};
pub use pdf::{PageRenderer, PdfDocument, TextExtractor, TextItem, Viewport, extract_segments};
pub use segment::{TextSegment, TranslatedPage};
pub use selection::{
    GesturePreview, Selection, SelectionController, SelectionMode, SelectionUpdate,
    nearest_segment, segments_in_rect,
};
pub use session::ProjectSession;
pub use store::{NewProject, Project, ProjectStore};
pub use translator::{Translator, create_translator, merge_translations};

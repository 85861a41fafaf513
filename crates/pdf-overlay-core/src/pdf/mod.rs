mod compose;
mod document;
mod page_index;
mod render;
mod text;

pub use compose::{PageImage, compose_image_pdf};
pub use document::PdfDocument;
pub use page_index::PageIndex;
pub use render::{
    DEFAULT_RENDER_QUALITY, DEFAULT_RENDER_SCALE, PageRenderer, decode_page_image, encode_webp,
};
pub use text::{TextExtractor, TextItem, Viewport, extract_segments};

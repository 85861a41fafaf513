//! Export translated pages as a new PDF.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::Result;
use crate::overlay::{FrameInput, OverlayFont, OverlayRenderer, RasterCanvas};
use crate::pdf::{PageImage, compose_image_pdf, decode_page_image};
use crate::segment::TranslatedPage;
use crate::session::ProjectSession;

/// Result of an export request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Exported { pdf: Vec<u8>, pages: Vec<u32> },
    /// None of the requested pages are translated
    NothingToExport { reason: String },
}

/// Renders translated pages and composes them into one PDF
#[derive(Debug, Clone)]
pub struct PdfExporter {
    renderer: OverlayRenderer,
    font: OverlayFont,
    quality: f32,
}

impl PdfExporter {
    pub const fn new(renderer: OverlayRenderer, font: OverlayFont, quality: f32) -> Self {
        Self {
            renderer,
            font,
            quality,
        }
    }

    /// Exporter drawing at `overlay.export_width` with the configured colors.
    pub fn from_config(config: &AppConfig, font: OverlayFont) -> Self {
        let renderer = OverlayRenderer::new(&config.overlay, config.text_color)
            .with_width(config.overlay.export_width);
        Self::new(renderer, font, config.render.quality)
    }

    /// Export `page_numbers` (all translated pages when empty), in page order.
    pub fn export(&self, session: &ProjectSession, page_numbers: &[u32]) -> Result<ExportOutcome> {
        let pages: Vec<&TranslatedPage> = if page_numbers.is_empty() {
            session.pages().collect()
        } else {
            page_numbers
                .iter()
                .copied()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .filter_map(|n| session.page(n))
                .collect()
        };

        if pages.is_empty() {
            let reason = if page_numbers.is_empty() {
                "No translated pages to export".to_string()
            } else {
                format!("None of pages {page_numbers:?} are translated yet")
            };
            info!("{}", reason);
            return Ok(ExportOutcome::NothingToExport { reason });
        }

        let mut images = Vec::with_capacity(pages.len());
        for page in &pages {
            images.push(PageImage::from_rgba(&self.render_page(page)?, self.quality)?);
            debug!("Rendered page {} for export", page.page_number);
        }

        let pdf = compose_image_pdf(&images)?;
        let numbers: Vec<u32> = pages.iter().map(|p| p.page_number).collect();
        info!("Exported {} page(s), {} bytes", numbers.len(), pdf.len());

        Ok(ExportOutcome::Exported {
            pdf,
            pages: numbers,
        })
    }

    /// Final overlay frame for one page.
    pub fn render_page(&self, page: &TranslatedPage) -> Result<image::RgbaImage> {
        let image = decode_page_image(&page.image_data)?;
        if image.is_none() {
            warn!("Page {} has no raster; exporting text on blank page", page.page_number);
        }

        let selected = BTreeSet::new();
        let mut canvas = RasterCanvas::new(self.font.clone())?;
        self.renderer.render(
            &mut canvas,
            &FrameInput {
                image: image.as_ref(),
                segments: &page.segments,
                show_original: false,
                edit_mode: false,
                selected: &selected,
                gesture: None,
            },
        );
        Ok(canvas.to_rgba_image())
    }
}

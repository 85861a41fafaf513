//! Translation passes: extract, translate and persist a page range.
//!
//! Pages are processed strictly one after another. The first failure
//! stops the pass; pages finished before it stay in the store.

use std::ops::RangeInclusive;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::{AppConfig, Lang, RenderConfig};
use crate::error::{Error, Result};
use crate::pdf::{PageRenderer, PdfDocument, TextExtractor};
use crate::segment::{TextSegment, TranslatedPage};
use crate::store::ProjectStore;
use crate::translator::{Translator, merge_translations};

/// Progress notification, sent after each completed page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PassProgress {
    pub page: u32,
    pub done: u32,
    pub total: u32,
}

pub type ProgressCallback = Box<dyn Fn(PassProgress) + Send + Sync>;

/// Outcome of a pass that ran to completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub project_id: Uuid,
    pub completed: Vec<u32>,
    /// Set when there was nothing to do
    pub message: Option<String>,
}

/// Runs translation passes for projects in a store
pub struct TranslationPass {
    store: ProjectStore,
    translator: Arc<dyn Translator>,
    render: RenderConfig,
    source_lang: Option<Lang>,
    target_lang: Option<Lang>,
}

impl TranslationPass {
    /// Languages default to the ones recorded on each project.
    pub fn new(store: ProjectStore, translator: Arc<dyn Translator>, render: RenderConfig) -> Self {
        Self {
            store,
            translator,
            render,
            source_lang: None,
            target_lang: None,
        }
    }

    pub fn from_config(
        store: ProjectStore,
        translator: Arc<dyn Translator>,
        config: &AppConfig,
    ) -> Self {
        Self::new(store, translator, config.render.clone())
    }

    /// Override the project's language pair.
    #[must_use]
    pub fn with_languages(mut self, source: Option<Lang>, target: Option<Lang>) -> Self {
        self.source_lang = source;
        self.target_lang = target;
        self
    }

    /// Translate `pages` of a project, clamped to the document.
    pub async fn run(
        &self,
        project_id: Uuid,
        pages: RangeInclusive<u32>,
        progress: Option<ProgressCallback>,
    ) -> Result<PassReport> {
        let project = self.store.require_project(project_id)?;
        let first = (*pages.start()).max(1);
        let last = (*pages.end()).min(project.page_count);

        if first > last {
            info!(
                "Nothing to translate in pages {}..={} of project {}",
                pages.start(),
                pages.end(),
                project_id
            );
            return Ok(PassReport {
                project_id,
                completed: Vec::new(),
                message: Some(format!(
                    "No pages in range {}-{} (document has {} pages)",
                    pages.start(),
                    pages.end(),
                    project.page_count
                )),
            });
        }

        let bytes = self
            .store
            .get_blob(project_id)?
            .ok_or_else(|| Error::BlobNotFound(project_id.to_string()))?;
        let doc = PdfDocument::from_bytes(bytes)?;
        let source = self.source_lang.as_ref().unwrap_or(&project.source_lang);
        let target = self.target_lang.as_ref().unwrap_or(&project.target_lang);

        info!(
            "Translating pages {}-{} of {} ({} -> {}) with {}",
            first,
            last,
            project.name,
            source,
            target,
            self.translator.name()
        );

        let total = last - first + 1;
        let mut completed = Vec::with_capacity(total as usize);

        for page_number in first..=last {
            let page = match self.translate_page(&doc, page_number, source, target).await {
                Ok(page) => page,
                Err(e) => return Err(abort(page_number, completed, &e)),
            };

            // A project deleted mid-pass must not get pages written back
            match self.store.get_project(project_id) {
                Ok(Some(_)) => {}
                Ok(None) => {
                    info!(
                        "Project {} was deleted; pass stopped at page {}",
                        project_id, page_number
                    );
                    return Err(Error::ProjectNotFound(project_id.to_string()));
                }
                Err(e) => return Err(abort(page_number, completed, &e)),
            }

            if let Err(e) = self.store.put_page(project_id, &page) {
                return Err(abort(page_number, completed, &e));
            }

            completed.push(page_number);
            if let Some(ref callback) = progress {
                callback(PassProgress {
                    page: page_number,
                    done: u32::try_from(completed.len()).unwrap_or(u32::MAX),
                    total,
                });
            }
        }

        info!("Pass finished: {} page(s) translated", completed.len());
        Ok(PassReport {
            project_id,
            completed,
            message: None,
        })
    }

    async fn translate_page(
        &self,
        doc: &PdfDocument,
        page_number: u32,
        source: &Lang,
        target: &Lang,
    ) -> Result<TranslatedPage> {
        let (doc, render) = (doc.clone(), self.render.clone());
        let (image_data, segments) =
            tokio::task::spawn_blocking(move || prepare_page(&doc, page_number, &render))
                .await
                .map_err(|e| Error::PdfRender {
                    page: page_number,
                    reason: format!("Render task failed: {e}"),
                })??;
        debug!("Page {}: {} segment(s)", page_number, segments.len());

        let originals: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        let translated = if originals.is_empty() {
            Vec::new()
        } else {
            let raw = self.translator.translate_batch(&originals, source, target).await?;
            merge_translations(&originals, raw)
        };

        let segments = segments
            .into_iter()
            .zip(translated)
            .map(|(segment, text)| segment.with_text(text))
            .collect();

        Ok(TranslatedPage::new(page_number, image_data, segments))
    }
}

/// Rasterize and extract one page; no mupdf handle outlives this call.
fn prepare_page(
    doc: &PdfDocument,
    page_number: u32,
    render: &RenderConfig,
) -> Result<(String, Vec<TextSegment>)> {
    let image_data = PageRenderer::with_config(doc, render).rasterize_base64(page_number)?;
    let (_, segments) = TextExtractor::new(doc).extract_page(page_number)?;
    Ok((image_data, segments))
}

fn abort(page: u32, completed: Vec<u32>, cause: &Error) -> Error {
    error!(
        "Translation pass aborted at page {} ({} page(s) kept): {}",
        page,
        completed.len(),
        cause
    );
    Error::PassAborted {
        page,
        completed,
        reason: cause.to_string(),
    }
}

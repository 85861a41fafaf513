//! HTTP route handlers for the overlay viewer API.
//!
//! All routes return JSON except the frame (PNG) and export (PDF) routes.

mod batch;
mod export;
mod frame;
mod pages;
mod projects;
mod translate;
mod viewer;

pub use batch::{begin_batch, discard_batch, update_batch};
pub use export::export_pdf;
pub use frame::get_frame;
pub use pages::list_pages;
pub use projects::{create_project, delete_project, list_projects};
pub use translate::{pass_status, start_pass};
pub use viewer::{get_viewer, pointer_event, update_viewer};

use pdf_overlay_core::{CanvasRect, SelectionMode};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::state::PointerPhase;

/// Body of `POST /translate`; missing bounds cover the whole document.
#[derive(Deserialize, Default)]
pub struct TranslateRequest {
    #[serde(default)]
    pub from: Option<u32>,
    #[serde(default)]
    pub to: Option<u32>,
    #[serde(default)]
    pub source_lang: Option<String>,
    #[serde(default)]
    pub target_lang: Option<String>,
}

/// Body of `POST /viewer`; absent fields keep their current value.
#[derive(Deserialize, Default)]
pub struct ViewerRequest {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub mode: Option<SelectionMode>,
    #[serde(default)]
    pub show_original: Option<bool>,
    #[serde(default)]
    pub edit_mode: Option<bool>,
    /// Jump to the next untranslated page
    #[serde(default)]
    pub next_untranslated: bool,
    /// Drop the selection of the current page
    #[serde(default)]
    pub clear_selection: bool,
}

/// Body of `POST /pointer`, in client pixels
#[derive(Deserialize)]
pub struct PointerRequest {
    pub phase: PointerPhase,
    pub client_x: f32,
    pub client_y: f32,
    pub canvas: CanvasRect,
}

/// Query params for the frame route.
#[derive(Deserialize, Default)]
pub struct FrameQuery {
    /// Canvas width override
    #[serde(default)]
    pub width: Option<u32>,
}

/// Body of `PUT /batch-edit`.
#[derive(Deserialize, Default)]
pub struct BatchUpdate {
    /// New text per segment index
    #[serde(default)]
    pub texts: BTreeMap<usize, String>,
    /// Indices to restore to their original text
    #[serde(default)]
    pub revert: Vec<usize>,
    /// Indices to restore to their text when the batch began
    #[serde(default)]
    pub reset: Vec<usize>,
    /// Save to the page and close the batch
    #[serde(default = "default_commit")]
    pub commit: bool,
}

const fn default_commit() -> bool {
    true
}

/// Query params for export.
#[derive(Deserialize, Default)]
pub struct ExportQuery {
    /// Page list such as "1-3,5"; all translated pages when absent
    #[serde(default)]
    pub pages: Option<String>,
}

//! Page listing route.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::helpers::{CoreResultExt, OptionExt, RouteResult};
use crate::state::AppState;

#[derive(Serialize)]
pub struct PageList {
    pub page_count: u32,
    pub translated: Vec<u32>,
    pub next_untranslated: Option<u32>,
}

/// Translated page numbers and the first untranslated page.
pub async fn list_pages(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> RouteResult<Json<PageList>> {
    let viewer = state.viewer(project_id).await.or_status()?;

    let list = viewer
        .with_session_mut(|v| {
            v.refresh()?;
            Ok::<_, pdf_overlay_core::Error>(PageList {
                page_count: v.page_count(),
                translated: v.session.translated_page_numbers(),
                next_untranslated: v.session.first_untranslated(0),
            })
        })
        .await
        .or_not_found("Project not found")?
        .or_status()?;

    Ok(Json(list))
}

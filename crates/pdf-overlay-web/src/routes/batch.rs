//! Batch edit routes - edit the selected segments of the current page.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use pdf_overlay_core::BatchEdit;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::helpers::{CoreResultExt, OptionExt, RouteResult};
use crate::routes::BatchUpdate;
use crate::state::AppState;

/// Outcome of `PUT /batch-edit`
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchResponse {
    /// Edits applied to the working copy only
    Pending { batch: BatchEdit },
    /// Working copy written to the page
    Saved { page: u32, changed: usize },
}

/// Open a batch over the current selection.
pub async fn begin_batch(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> RouteResult<Json<BatchEdit>> {
    let viewer = state.viewer(project_id).await.or_status()?;

    let batch = viewer
        .with_session_mut(|v| {
            let page = v
                .session
                .page(v.page)
                .or_not_found(&format!("Page {} is not translated yet", v.page))?;
            let selected = v.selection.indices_for(v.page);
            if selected.is_empty() {
                return Err((
                    StatusCode::BAD_REQUEST,
                    "Select at least one segment first".to_string(),
                ));
            }

            let batch = BatchEdit::begin(page, &selected);
            v.batch = Some(batch.clone());
            Ok(batch)
        })
        .await
        .or_not_found("Project not found")??;

    Ok(Json(batch))
}

/// Apply edits to the open batch and, by default, save it.
pub async fn update_batch(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Json(update): Json<BatchUpdate>,
) -> RouteResult<Json<BatchResponse>> {
    let viewer = state.viewer(project_id).await.or_status()?;

    let response = viewer
        .with_session_mut(|v| {
            let mut batch = v.batch.take().or_not_found("No batch edit in progress")?;

            for (index, text) in update.texts {
                batch.set_text(index, text);
            }
            for index in update.revert {
                batch.revert(index);
            }
            for index in update.reset {
                batch.reset(index);
            }

            if !update.commit {
                v.batch = Some(batch.clone());
                return Ok(BatchResponse::Pending { batch });
            }

            let page_number = batch.page_number();
            let mut page = v
                .session
                .page(page_number)
                .cloned()
                .or_not_found("Page is no longer translated")?;
            let changed = batch.commit(&mut page);
            if changed > 0 {
                v.session
                    .save_page_segments(page_number, page.segments)
                    .or_status()?;
            }
            info!("Batch edit saved {} segment(s) on page {}", changed, page_number);

            Ok(BatchResponse::Saved {
                page: page_number,
                changed,
            })
        })
        .await
        .or_not_found("Project not found")??;

    Ok(Json(response))
}

/// Close the batch without saving.
pub async fn discard_batch(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> RouteResult<StatusCode> {
    let viewer = state.viewer(project_id).await.or_status()?;
    viewer
        .with_session_mut(|v| v.batch = None)
        .await
        .or_not_found("Project not found")?;
    Ok(StatusCode::NO_CONTENT)
}

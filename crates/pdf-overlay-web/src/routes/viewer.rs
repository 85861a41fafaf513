//! Viewer routes - navigation, display flags and pointer input.
//!
//! Every change here only updates state; the client fetches a fresh
//! frame afterwards.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use pdf_overlay_core::normalize_pointer;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::helpers::{CoreResultExt, OptionExt, RouteResult, validate_page};
use crate::routes::{PointerRequest, ViewerRequest};
use crate::state::{AppState, ViewerView};

/// Current viewer state.
pub async fn get_viewer(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> RouteResult<Json<ViewerView>> {
    let viewer = state.viewer(project_id).await.or_status()?;
    let view = viewer
        .with_session(|v| v.view(None))
        .await
        .or_not_found("Project not found")?;
    Ok(Json(view))
}

/// Change page, selection mode or display flags.
pub async fn update_viewer(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Json(request): Json<ViewerRequest>,
) -> RouteResult<Json<ViewerView>> {
    let viewer = state.viewer(project_id).await.or_status()?;

    let view = viewer
        .with_session_mut(|v| {
            if let Some(page) = request.page {
                validate_page(page, v.page_count())?;
                if !v.session.is_translated(page) {
                    // A running pass may have stored it since the last load
                    v.refresh().or_status()?;
                }
                v.go_to(page);
            }

            let mut message = None;
            if request.next_untranslated {
                message = Some(match v.go_to_next_untranslated() {
                    Some(page) => format!("Moved to untranslated page {page}"),
                    None => "No untranslated page after this one".to_string(),
                });
            }

            if let Some(mode) = request.mode {
                v.set_mode(mode);
            }
            if let Some(show_original) = request.show_original {
                v.show_original = show_original;
            }
            if let Some(edit_mode) = request.edit_mode {
                v.edit_mode = edit_mode;
                if !edit_mode {
                    v.hover = None;
                }
            }
            if request.clear_selection {
                v.selection.clear();
            }

            Ok::<_, (StatusCode, String)>(v.view(message))
        })
        .await
        .or_not_found("Project not found")??;

    Ok(Json(view))
}

/// Feed a pointer event to the selection controller.
pub async fn pointer_event(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Json(request): Json<PointerRequest>,
) -> RouteResult<Json<ViewerView>> {
    let viewer = state.viewer(project_id).await.or_status()?;
    let point = normalize_pointer(request.client_x, request.client_y, request.canvas);

    let view = viewer
        .with_session_mut(|v| {
            if v.pointer(request.phase, point) {
                debug!(
                    "Selection on page {} is now {:?}",
                    v.page,
                    v.selection.indices()
                );
            }
            v.view(None)
        })
        .await
        .or_not_found("Project not found")?;

    Ok(Json(view))
}

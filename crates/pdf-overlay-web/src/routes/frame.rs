//! Frame route - the overlay drawn for the viewer's current state.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::Response,
};
use pdf_overlay_core::{FrameInput, RasterCanvas};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::helpers::{CoreResultExt, OptionExt, ResultExt, RouteResult, frame_width};
use crate::routes::FrameQuery;
use crate::state::AppState;

/// Render the current page as PNG.
///
/// Each request repaints from the latest state; nothing is cached except
/// the decoded page raster.
pub async fn get_frame(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<FrameQuery>,
) -> RouteResult<Response> {
    let width = frame_width(query.width)?;
    let viewer = state.viewer(project_id).await.or_status()?;

    let (page, job) = viewer
        .with_session(|v| (v.page, v.frame_job()))
        .await
        .or_not_found("Project not found")?;
    let job = job.or_not_found(&format!("Page {page} is not translated yet"))?;

    let state_clone = Arc::clone(&state);
    let png = tokio::task::spawn_blocking(move || {
        let image = state_clone.rasters.get_or_decode(&job.image_data)?;
        let renderer = match width {
            Some(width) => state_clone.renderer.with_width(width),
            None => state_clone.renderer.clone(),
        };

        let mut canvas = RasterCanvas::new(state_clone.font.clone())?;
        renderer.render(
            &mut canvas,
            &FrameInput {
                image: image.as_deref(),
                segments: &job.segments,
                show_original: job.show_original,
                edit_mode: job.edit_mode,
                selected: &job.selected,
                gesture: job.gesture,
            },
        );
        canvas.encode_png()
    })
    .await
    .map_err(|e| {
        error!("Frame rendering task panicked: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Frame rendering failed".to_string(),
        )
    })?
    .or_status()?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/png")
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from(png))
        .or_internal_error()
}

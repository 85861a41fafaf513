//! Export route - translated pages as one PDF download.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::Response,
};
use pdf_overlay_core::{ExportOutcome, PdfExporter};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use crate::helpers::{CoreResultExt, OptionExt, ResultExt, RouteResult, export_pages};
use crate::routes::ExportQuery;
use crate::state::AppState;

/// Render and download translated pages.
///
/// Returns 400 when `pages` selects nothing in the document and 404 with
/// an explanation when none of the selected pages are translated.
pub async fn export_pdf(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Query(query): Query<ExportQuery>,
) -> RouteResult<Response> {
    let viewer = state.viewer(project_id).await.or_status()?;

    let session = viewer
        .with_session_mut(|v| v.refresh().map(|()| v.session.clone()))
        .await
        .or_not_found("Project not found")?
        .or_status()?;
    let project = session.project().clone();

    let pages = export_pages(query.pages.as_deref(), project.page_count)?;

    let exporter = PdfExporter::from_config(&state.config, state.font.clone());
    let outcome = tokio::task::spawn_blocking(move || exporter.export(&session, &pages))
        .await
        .map_err(|e| {
            error!("Export task panicked: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Export failed".to_string())
        })?
        .or_status()?;

    let pdf = match outcome {
        ExportOutcome::Exported { pdf, .. } => pdf,
        ExportOutcome::NothingToExport { reason } => return Err((StatusCode::NOT_FOUND, reason)),
    };

    let download_name = format!("{}-{}.pdf", project.name, project.target_lang);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/pdf")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{download_name}\""),
        )
        .body(Body::from(pdf))
        .or_internal_error()
}

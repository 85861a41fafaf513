//! Translation routes - background passes with progress tracking.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use pdf_overlay_core::{Error, Lang, TranslationPass};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::helpers::{CoreResultExt, OptionExt, RouteResult};
use crate::routes::TranslateRequest;
use crate::state::{AppState, PassJob, PassStatus};

/// Start a translation pass over a page range.
///
/// Returns 202 Accepted (the pass runs in the background); poll
/// `GET /translate` for progress. One pass per project at a time.
pub async fn start_pass(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
    Json(request): Json<TranslateRequest>,
) -> RouteResult<(StatusCode, Json<PassStatus>)> {
    let viewer = state.viewer(project_id).await.or_status()?;

    let page_count = viewer
        .with_session(|v| v.page_count())
        .await
        .or_not_found("Project not found")?;
    let first = request.from.unwrap_or(1);
    let last = request.to.unwrap_or(page_count);

    let job = Arc::new(PassJob::new(first, last));
    let started = viewer
        .with_session_mut(|v| {
            if v.pass.as_ref().is_some_and(|j| j.is_running()) {
                return false;
            }
            v.pass = Some(Arc::clone(&job));
            true
        })
        .await
        .or_not_found("Project not found")?;

    if !started {
        return Err((
            StatusCode::CONFLICT,
            "A translation pass is already running".to_string(),
        ));
    }

    let pass = TranslationPass::from_config(
        state.store.clone(),
        Arc::clone(&state.translator),
        &state.config,
    )
    .with_languages(
        request.source_lang.map(Lang::new),
        request.target_lang.map(Lang::new),
    );

    let job_clone = Arc::clone(&job);
    let state_clone = Arc::clone(&state);

    tokio::spawn(async move {
        let progress_job = Arc::clone(&job_clone);
        let result = pass
            .run(
                project_id,
                first..=last,
                Some(Box::new(move |progress| {
                    progress_job.done.store(progress.done, Ordering::SeqCst);
                })),
            )
            .await;

        match result {
            Ok(report) => {
                if let Some(message) = &report.message {
                    info!("{}", message);
                }
                job_clone.finish(report.completed, report.message).await;
            }
            Err(Error::PassAborted {
                page,
                completed,
                reason,
            }) => {
                job_clone
                    .finish(completed, Some(format!("Failed at page {page}: {reason}")))
                    .await;
            }
            Err(e) => {
                error!("Translation pass for {} failed: {}", project_id, e);
                job_clone.finish(Vec::new(), Some(e.to_string())).await;
            }
        }

        // Show the new pages in the viewer
        if let Ok(viewer) = state_clone.viewer(project_id).await {
            let refreshed = viewer.with_session_mut(|v| v.refresh()).await;
            if let Some(Err(e)) = refreshed {
                warn!("Failed to reload project {}: {}", project_id, e);
            }
        }
    });

    Ok((StatusCode::ACCEPTED, Json(job.status().await)))
}

/// Progress of the latest pass of a project.
pub async fn pass_status(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> RouteResult<Json<PassStatus>> {
    let viewer = state.viewer(project_id).await.or_status()?;
    let job = viewer
        .with_session(|v| v.pass.clone())
        .await
        .flatten()
        .or_not_found("No translation pass started")?;

    Ok(Json(job.status().await))
}

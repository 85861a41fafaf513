//! Project routes - upload, listing and deletion.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use axum_extra::extract::Multipart;
use pdf_overlay_core::{Lang, NewProject, Project};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::helpers::{CoreResultExt, ResultExt, RouteResult};
use crate::state::AppState;

/// Project metadata plus translation progress
#[derive(Serialize)]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub project: Project,
    pub translated_pages: usize,
}

/// Create a project from a multipart upload.
///
/// Fields: `file` (required), `name`, `source_lang`, `target_lang`.
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> RouteResult<(StatusCode, Json<Project>)> {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut name = String::new();
    let mut source_lang = state.config.source_lang.clone();
    let mut target_lang = state.config.target_lang.clone();

    while let Some(field) = multipart.next_field().await.or_bad_request()? {
        match field.name().unwrap_or("") {
            "file" => {
                let file_name = field.file_name().unwrap_or("document.pdf").to_string();
                let data = field.bytes().await.or_bad_request()?;
                upload = Some((file_name, data.to_vec()));
            }
            "name" => name = field.text().await.or_bad_request()?,
            "source_lang" => source_lang = Lang::new(field.text().await.or_bad_request()?),
            "target_lang" => target_lang = Lang::new(field.text().await.or_bad_request()?),
            _ => {}
        }
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| (StatusCode::BAD_REQUEST, "No file uploaded".to_string()))?;

    // Parse PDF in a blocking task to avoid blocking the async runtime
    let new = tokio::task::spawn_blocking(move || {
        NewProject::from_pdf(name, file_name, bytes, source_lang, target_lang)
    })
    .await
    .map_err(|e| {
        error!("PDF parsing task panicked: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "PDF parsing failed".to_string(),
        )
    })?
    .or_status()?;

    let project = state.store.create_project(new).or_status()?;
    info!(
        "Created project {} for {} ({} pages)",
        project.id, project.file_name, project.page_count
    );

    Ok((StatusCode::CREATED, Json(project)))
}

/// List projects, newest first.
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
) -> RouteResult<Json<Vec<ProjectSummary>>> {
    let projects = state.store.list_projects().or_status()?;

    let mut summaries = Vec::with_capacity(projects.len());
    for project in projects {
        let translated_pages = state.store.pages_for_project(project.id).or_status()?.len();
        summaries.push(ProjectSummary {
            project,
            translated_pages,
        });
    }
    Ok(Json(summaries))
}

/// Delete a project with its PDF and pages.
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<Uuid>,
) -> RouteResult<StatusCode> {
    if !state.forget(project_id).await {
        return Err((
            StatusCode::CONFLICT,
            "A translation pass is running for this project".to_string(),
        ));
    }

    if state.store.delete_project(project_id).or_status()? {
        info!("Deleted project {}", project_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Project not found".to_string()))
    }
}

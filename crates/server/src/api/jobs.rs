//! Job API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use reelkeeper_core::{
    JobError, JobHandle, JobOrchestrator, JobRecord, MediaKind, MediaRef,
};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

/// Error response
#[derive(Debug, Serialize)]
pub struct JobsErrorResponse {
    pub error: String,
}

/// Job list response
#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobRecord>,
    pub total: usize,
}

/// Handler failures, rendered as JSON.
pub enum ApiError {
    Unavailable,
    NotFound(String),
    BadRequest(String),
    Job(JobError),
}

impl From<JobError> for ApiError {
    fn from(e: JobError) -> Self {
        ApiError::Job(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Job queues not available. Check that torrent_client is configured.".to_string(),
            ),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Job(e @ JobError::QueueClosed(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
            ApiError::Job(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };
        (status, Json(JobsErrorResponse { error })).into_response()
    }
}

type Accepted = (StatusCode, Json<JobHandle>);

fn orchestrator(state: &AppState) -> Result<&Arc<JobOrchestrator>, ApiError> {
    state.jobs().ok_or(ApiError::Unavailable)
}

fn accepted(handle: JobHandle) -> Accepted {
    (StatusCode::ACCEPTED, Json(handle))
}

// ============================================================================
// Handlers
// ============================================================================

/// List all jobs, oldest first
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JobListResponse>, ApiError> {
    let jobs = orchestrator(&state)?.jobs().await;
    Ok(Json(JobListResponse {
        total: jobs.len(),
        jobs,
    }))
}

/// Get a job by id
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobRecord>, ApiError> {
    orchestrator(&state)?
        .job(id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Job not found: {}", id)))
}

pub async fn download_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Accepted, ApiError> {
    Ok(accepted(orchestrator(&state)?.download_movie(id).await?))
}

pub async fn download_season(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Accepted, ApiError> {
    Ok(accepted(orchestrator(&state)?.download_season(id).await?))
}

pub async fn download_episode(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Accepted, ApiError> {
    Ok(accepted(orchestrator(&state)?.download_episode(id).await?))
}

pub async fn download_missing(State(state): State<Arc<AppState>>) -> Result<Accepted, ApiError> {
    Ok(accepted(orchestrator(&state)?.download_missing().await?))
}

pub async fn scan_library(State(state): State<Arc<AppState>>) -> Result<Accepted, ApiError> {
    Ok(accepted(orchestrator(&state)?.scan_library().await?))
}

pub async fn find_new_episodes(State(state): State<Arc<AppState>>) -> Result<Accepted, ApiError> {
    Ok(accepted(orchestrator(&state)?.find_new_episodes().await?))
}

/// Enqueue an organize job; `kind` is movie, season or episode
pub async fn organize(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Accepted, ApiError> {
    let kind = MediaKind::parse(&kind)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown media kind: {}", kind)))?;
    let handle = orchestrator(&state)?
        .organize(MediaRef::new(kind, id))
        .await?;
    Ok(accepted(handle))
}

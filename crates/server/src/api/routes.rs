use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, jobs, middleware::metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Job registry
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/{id}", get(jobs::get_job))
        // Enqueue
        .route("/jobs/download/movie/{id}", post(jobs::download_movie))
        .route("/jobs/download/season/{id}", post(jobs::download_season))
        .route("/jobs/download/episode/{id}", post(jobs::download_episode))
        .route("/jobs/download/missing", post(jobs::download_missing))
        .route("/jobs/scan", post(jobs::scan_library))
        .route("/jobs/find-new-episodes", post(jobs::find_new_episodes))
        .route("/jobs/organize/{kind}/{id}", post(jobs::organize))
        .with_state(state.clone());

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}

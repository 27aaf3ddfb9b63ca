use axum::{extract::State, http::Uri, response::Response};

use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/jobs",
    tag = "jobs",
    params(crate::dto::job_dto::JobSearchRequest),
    responses(
        (status = 200, description = "Page of matching jobs", body = crate::dto::job_dto::JobSearchResponse),
        (status = 400, description = "Malformed, invalid or unconvertible query", body = crate::error::ErrorResponse),
        (status = 500, description = "Search failed", body = crate::error::ErrorResponse)
    )
)]
#[axum::debug_handler]
pub async fn search_jobs(State(state): State<AppState>, uri: Uri) -> Response {
    state.jobs.handle_search(&uri).await
}

#[utoipa::path(
    get,
    path = "/api/v1/jobs/count",
    tag = "jobs",
    params(crate::dto::job_dto::JobSearchRequest),
    responses(
        (status = 200, description = "Number of matching jobs", body = crate::pipeline::response::CountResponse),
        (status = 400, description = "Malformed, invalid or unconvertible query", body = crate::error::ErrorResponse),
        (status = 500, description = "Count failed", body = crate::error::ErrorResponse)
    )
)]
#[axum::debug_handler]
pub async fn search_jobs_count(State(state): State<AppState>, uri: Uri) -> Response {
    state.jobs.handle_search_count(&uri).await
}

use axum::Json;
use utoipa::OpenApi;

use crate::dto::job_dto::{
    JobRequirementsResponse, JobResponse, JobSearchResponse, TechnologyResponse,
};
use crate::error::{ErrorDetails, ErrorResponse};
use crate::pipeline::response::{CountResponse, PaginationDetails};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Job Board API",
        description = "Search over active job postings"
    ),
    paths(
        super::jobs::search_jobs,
        super::jobs::search_jobs_count,
        super::health::health,
    ),
    components(schemas(
        JobSearchResponse,
        JobResponse,
        JobRequirementsResponse,
        TechnologyResponse,
        PaginationDetails,
        CountResponse,
        ErrorResponse,
        ErrorDetails,
    )),
    tags(
        (name = "jobs", description = "Job search"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

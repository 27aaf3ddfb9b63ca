pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod server;
pub mod services;
pub mod telemetry;

use std::sync::Arc;

use crate::database::JobDataRepository;
use crate::dto::job_dto::JobSearchRequest;
use crate::pipeline::SearchHandler;
use crate::services::job_search_service::JobSearchService;

pub type JobSearchHandler = SearchHandler<JobSearchRequest, JobSearchService>;

#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<JobSearchHandler>,
}

impl AppState {
    pub fn new(repos: Arc<dyn JobDataRepository>) -> Self {
        let jobs = SearchHandler::with_defaults(JobSearchService::new(repos));
        Self {
            jobs: Arc::new(jobs),
        }
    }
}

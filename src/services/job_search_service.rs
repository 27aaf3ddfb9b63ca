use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use crate::database::JobDataRepository;
use crate::dto::job_dto::{JobResponse, JobResponseList};
use crate::error::Result;
use crate::models::job::JobSearchParams;
use crate::pipeline::SearchService;

/// Job search on top of a [`JobDataRepository`]. Technologies for a page are fetched
/// with a single batch lookup.
#[derive(Clone)]
pub struct JobSearchService {
    repos: Arc<dyn JobDataRepository>,
}

impl JobSearchService {
    pub fn new(repos: Arc<dyn JobDataRepository>) -> Self {
        Self { repos }
    }
}

#[async_trait]
impl SearchService<JobSearchParams> for JobSearchService {
    type Output = JobResponseList;

    #[instrument(skip_all, fields(component = "jobs", query = %params.query))]
    async fn execute_search(&self, params: &JobSearchParams) -> Result<(JobResponseList, i64)> {
        let (jobs, total) = self.repos.search_jobs_with_count(params).await?;
        if jobs.is_empty() {
            return Ok((JobResponseList::default(), total));
        }

        let mut seen = HashSet::with_capacity(jobs.len());
        let job_ids: Vec<i32> = jobs
            .iter()
            .map(|entry| entry.job.id)
            .filter(|id| seen.insert(*id))
            .collect();
        let technologies = self.repos.get_job_technologies_batch(&job_ids).await?;

        let items: Vec<JobResponse> = jobs
            .into_iter()
            .map(|entry| {
                let techs = technologies.get(&entry.job.id).cloned().unwrap_or_default();
                JobResponse::from_parts(entry, techs)
            })
            .collect();

        tracing::debug!(total, returned = items.len(), "job search completed");
        Ok((JobResponseList(items), total))
    }

    #[instrument(skip_all, fields(component = "jobs", query = %params.query))]
    async fn execute_search_count(&self, params: &JobSearchParams) -> Result<i64> {
        self.repos.get_search_count(params).await
    }
}

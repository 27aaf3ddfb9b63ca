pub mod embedded;
pub mod job_repository;
pub mod jobtech_repository;
pub mod pool;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::config::{AppMode, Config};
use crate::error::Result;
use crate::models::job::{JobSearchParams, JobWithCompany};
use crate::models::technology::JobTechnologyWithDetails;

pub use embedded::EmbeddedJobRepository;
pub use job_repository::JobRepository;
pub use jobtech_repository::JobTechnologyRepository;

/// Everything the job search needs from storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobDataRepository: Send + Sync {
    /// One page of matching jobs plus the total number of matches.
    async fn search_jobs_with_count(
        &self,
        params: &JobSearchParams,
    ) -> Result<(Vec<JobWithCompany>, i64)>;

    async fn get_search_count(&self, params: &JobSearchParams) -> Result<i64>;

    /// Technologies of every given job, keyed by job id. Jobs without technologies are
    /// absent from the map.
    async fn get_job_technologies_batch(
        &self,
        job_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<JobTechnologyWithDetails>>>;
}

/// PostgreSQL-backed repositories behind one [`JobDataRepository`].
#[derive(Clone)]
pub struct PgJobRepositories {
    jobs: JobRepository,
    technologies: JobTechnologyRepository,
}

impl PgJobRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            jobs: JobRepository::new(pool.clone()),
            technologies: JobTechnologyRepository::new(pool),
        }
    }
}

#[async_trait]
impl JobDataRepository for PgJobRepositories {
    async fn search_jobs_with_count(
        &self,
        params: &JobSearchParams,
    ) -> Result<(Vec<JobWithCompany>, i64)> {
        self.jobs.search_jobs_with_count(params).await
    }

    async fn get_search_count(&self, params: &JobSearchParams) -> Result<i64> {
        self.jobs.get_search_count(params).await
    }

    async fn get_job_technologies_batch(
        &self,
        job_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<JobTechnologyWithDetails>>> {
        self.technologies.get_job_technologies_batch(job_ids).await
    }
}

/// Picks the data source for the configured mode. The pool is returned so the caller
/// can close it on shutdown.
pub async fn setup_job_repositories(
    config: &Config,
) -> Result<(Arc<dyn JobDataRepository>, Option<PgPool>)> {
    if config.mode == AppMode::Test {
        tracing::info!(component = "database", "using embedded job data");
        return Ok((Arc::new(EmbeddedJobRepository::new()), None));
    }

    let pool = pool::create_pool(&config.database).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!(component = "database", "database connected and migrated");

    Ok((Arc::new(PgJobRepositories::new(pool.clone())), Some(pool)))
}

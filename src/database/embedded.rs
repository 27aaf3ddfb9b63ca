//! In-memory job data compiled into the binary, used in `test` mode instead of
//! PostgreSQL. Filters behave like the SQL repository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use super::JobDataRepository;
use crate::error::{Error, Result};
use crate::models::job::{Job, JobSearchParams, JobWithCompany};
use crate::models::technology::JobTechnologyWithDetails;

const MOCK_JOBS: &str = include_str!("../../data/mock_jobs.json");

#[derive(Debug, Deserialize)]
struct MockJobData {
    id: i32,
    company_id: i32,
    title: String,
    #[serde(default)]
    original_post: String,
    description: String,
    #[serde(default)]
    responsibilities: Vec<String>,
    #[serde(default)]
    skill_must_have: Vec<String>,
    #[serde(default)]
    skill_nice_to_have: Vec<String>,
    #[serde(default)]
    benefits: Vec<String>,
    experience_level: String,
    employment_type: String,
    location: String,
    work_mode: String,
    application_url: String,
    is_active: bool,
    signature: String,
    days_ago: i64,
    company_name: String,
    #[serde(default)]
    company_logo_url: String,
}

#[derive(Debug, Deserialize)]
struct MockTechnologyData {
    job_id: i32,
    technology_id: i32,
    tech_name: String,
    tech_category: String,
    is_required: bool,
}

#[derive(Debug, Deserialize)]
struct MockData {
    jobs: Vec<MockJobData>,
    technologies: HashMap<String, Vec<MockTechnologyData>>,
}

#[derive(Debug, Clone, Default)]
pub struct EmbeddedJobRepository {
    jobs: Vec<JobWithCompany>,
    technologies: HashMap<i32, Vec<JobTechnologyWithDetails>>,
}

impl EmbeddedJobRepository {
    /// Loads the bundled dataset. A broken dataset leaves the repository empty rather
    /// than failing startup.
    pub fn new() -> Self {
        match Self::from_json(MOCK_JOBS, Utc::now()) {
            Ok(repo) => repo,
            Err(err) => {
                tracing::warn!(component = "database", error = %err, "failed to load embedded job data");
                Self::default()
            }
        }
    }

    /// Parses a dataset; `created_at` of each job is `now - days_ago`.
    pub fn from_json(raw: &str, now: DateTime<Utc>) -> Result<Self> {
        let data: MockData = serde_json::from_str(raw)?;

        let mut jobs: Vec<JobWithCompany> = data
            .jobs
            .into_iter()
            .map(|job| JobWithCompany {
                job: Job {
                    id: job.id,
                    company_id: job.company_id,
                    title: job.title,
                    original_post: job.original_post,
                    description: job.description,
                    responsibilities: job.responsibilities,
                    skill_must_have: job.skill_must_have,
                    skill_nice_to_have: job.skill_nice_to_have,
                    benefits: job.benefits,
                    experience_level: job.experience_level,
                    employment_type: job.employment_type,
                    location: job.location,
                    work_mode: job.work_mode,
                    application_url: job.application_url,
                    is_active: job.is_active,
                    signature: job.signature,
                    created_at: now - Duration::days(job.days_ago),
                    updated_at: now - Duration::days(1),
                },
                company_name: job.company_name,
                company_logo_url: job.company_logo_url,
            })
            .collect();
        // Same ordering as the SQL repository: newest first, id breaks ties.
        jobs.sort_by(|a, b| {
            b.job
                .created_at
                .cmp(&a.job.created_at)
                .then(b.job.id.cmp(&a.job.id))
        });

        let mut technologies = HashMap::new();
        for (key, list) in data.technologies {
            let job_id: i32 = key
                .parse()
                .map_err(|_| Error::Internal(format!("invalid job id '{}' in mock data", key)))?;
            let list = list
                .into_iter()
                .map(|tech| JobTechnologyWithDetails {
                    job_id: tech.job_id,
                    technology_id: tech.technology_id,
                    tech_name: tech.tech_name,
                    tech_category: tech.tech_category,
                    is_required: tech.is_required,
                })
                .collect();
            technologies.insert(job_id, list);
        }

        Ok(Self { jobs, technologies })
    }

    fn filter_jobs<'a>(
        &'a self,
        params: &'a JobSearchParams,
    ) -> impl Iterator<Item = &'a JobWithCompany> + 'a {
        self.jobs.iter().filter(move |job| matches_filters(job, params))
    }
}

#[async_trait]
impl JobDataRepository for EmbeddedJobRepository {
    async fn search_jobs_with_count(
        &self,
        params: &JobSearchParams,
    ) -> Result<(Vec<JobWithCompany>, i64)> {
        let matching: Vec<&JobWithCompany> = self.filter_jobs(params).collect();
        let total = matching.len() as i64;

        let offset = usize::try_from(params.offset).unwrap_or(0);
        let limit = usize::try_from(params.limit).unwrap_or(0);
        let page = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn get_search_count(&self, params: &JobSearchParams) -> Result<i64> {
        Ok(self.filter_jobs(params).count() as i64)
    }

    async fn get_job_technologies_batch(
        &self,
        job_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<JobTechnologyWithDetails>>> {
        Ok(job_ids
            .iter()
            .filter_map(|id| self.technologies.get(id).map(|techs| (*id, techs.clone())))
            .collect())
    }
}

fn matches_filters(entry: &JobWithCompany, params: &JobSearchParams) -> bool {
    let job = &entry.job;
    job.is_active
        && matches_query(entry, &params.query)
        && equals_filter(&job.experience_level, &params.experience_level)
        && equals_filter(&job.employment_type, &params.employment_type)
        && equals_filter(&job.work_mode, &params.work_mode)
        && contains_filter(&job.location, &params.location)
        && contains_filter(&entry.company_name, &params.company)
        && params.date_from.map_or(true, |from| job.created_at >= from)
        && params.date_to.map_or(true, |to| job.created_at <= to)
}

fn matches_query(entry: &JobWithCompany, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    [&entry.job.title, &entry.company_name, &entry.job.description]
        .iter()
        .any(|field| field.to_lowercase().contains(&query))
}

fn equals_filter(value: &str, filter: &Option<String>) -> bool {
    filter
        .as_deref()
        .map_or(true, |wanted| value.eq_ignore_ascii_case(wanted))
}

fn contains_filter(value: &str, filter: &Option<String>) -> bool {
    filter
        .as_deref()
        .map_or(true, |wanted| value.to_lowercase().contains(&wanted.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const DATASET: &str = r#"{
        "jobs": [
            {"id": 1, "company_id": 10, "title": "Rust Engineer", "description": "Systems work",
             "experience_level": "senior", "employment_type": "full-time", "location": "costarica",
             "work_mode": "remote", "application_url": "https://a.test/1", "is_active": true,
             "signature": "sig-1", "days_ago": 1, "company_name": "Ferris Labs"},
            {"id": 2, "company_id": 11, "title": "Backend Developer", "description": "Rust and SQL",
             "experience_level": "mid-level", "employment_type": "contractor", "location": "latam",
             "work_mode": "hybrid", "application_url": "https://a.test/2", "is_active": true,
             "signature": "sig-2", "days_ago": 10, "company_name": "Crab Corp"},
            {"id": 3, "company_id": 10, "title": "Rust Intern", "description": "Learn",
             "experience_level": "entry-level", "employment_type": "internship", "location": "costarica",
             "work_mode": "onsite", "application_url": "https://a.test/3", "is_active": false,
             "signature": "sig-3", "days_ago": 2, "company_name": "Ferris Labs"}
        ],
        "technologies": {
            "1": [{"job_id": 1, "technology_id": 5, "tech_name": "Rust", "tech_category": "language", "is_required": true}],
            "3": [{"job_id": 3, "technology_id": 5, "tech_name": "Rust", "tech_category": "language", "is_required": true}]
        }
    }"#;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn repo() -> EmbeddedJobRepository {
        EmbeddedJobRepository::from_json(DATASET, now()).unwrap()
    }

    fn params(query: &str) -> JobSearchParams {
        JobSearchParams {
            query: query.into(),
            limit: 20,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn query_matches_title_company_or_description() {
        let repo = repo();
        let (jobs, total) = repo.search_jobs_with_count(&params("RUST")).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(jobs.iter().map(|j| j.job.id).collect::<Vec<_>>(), vec![1, 2]);

        let (jobs, _) = repo.search_jobs_with_count(&params("crab")).await.unwrap();
        assert_eq!(jobs[0].job.id, 2);
    }

    #[tokio::test]
    async fn inactive_jobs_are_hidden() {
        let total = repo().get_search_count(&params("intern")).await.unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn pagination_keeps_full_total() {
        let repo = repo();
        let page = JobSearchParams {
            limit: 1,
            offset: 1,
            ..params("rust")
        };
        let (jobs, total) = repo.search_jobs_with_count(&page).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job.id, 2);

        let past_end = JobSearchParams {
            offset: 5,
            ..params("rust")
        };
        let (jobs, total) = repo.search_jobs_with_count(&past_end).await.unwrap();
        assert!(jobs.is_empty());
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn categorical_and_substring_filters() {
        let repo = repo();
        let senior = JobSearchParams {
            experience_level: Some("Senior".into()),
            ..params("rust")
        };
        assert_eq!(repo.get_search_count(&senior).await.unwrap(), 1);

        let company = JobSearchParams {
            company: Some("crab".into()),
            location: Some("LAT".into()),
            ..params("rust")
        };
        assert_eq!(repo.get_search_count(&company).await.unwrap(), 1);

        let nobody = JobSearchParams {
            work_mode: Some("onsite".into()),
            ..params("rust")
        };
        assert_eq!(repo.get_search_count(&nobody).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn date_range_is_inclusive() {
        let repo = repo();
        let last_week = JobSearchParams {
            date_from: Some(now() - Duration::days(7)),
            date_to: Some(now() - Duration::days(1)),
            ..params("rust")
        };
        let (jobs, _) = repo.search_jobs_with_count(&last_week).await.unwrap();
        assert_eq!(jobs.iter().map(|j| j.job.id).collect::<Vec<_>>(), vec![1]);
    }

    #[tokio::test]
    async fn batch_lookup_skips_jobs_without_technologies() {
        let techs = repo().get_job_technologies_batch(&[1, 2]).await.unwrap();
        assert_eq!(techs.len(), 1);
        assert_eq!(techs[&1][0].tech_name, "Rust");
    }

    #[test]
    fn bundled_dataset_loads() {
        let repo = EmbeddedJobRepository::from_json(MOCK_JOBS, now()).unwrap();
        assert!(!repo.jobs.is_empty());
        assert!(!repo.technologies.is_empty());
    }

    #[test]
    fn malformed_dataset_is_an_error() {
        assert!(EmbeddedJobRepository::from_json("{\"jobs\": 3}", now()).is_err());
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::pipeline::SearchParams;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: i32,
    pub company_id: i32,
    pub title: String,
    pub original_post: String,
    pub description: String,
    pub responsibilities: Vec<String>,
    pub skill_must_have: Vec<String>,
    pub skill_nice_to_have: Vec<String>,
    pub benefits: Vec<String>,
    pub experience_level: String,
    pub employment_type: String,
    pub location: String,
    pub work_mode: String,
    pub application_url: String,
    pub is_active: bool,
    pub signature: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A job joined with the company that posted it. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct JobWithCompany {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: Job,
    pub company_name: String,
    pub company_logo_url: String,
}

/// Normalized filters handed to the data-access layer. A `None` filter is inactive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobSearchParams {
    pub query: String,
    pub limit: i64,
    pub offset: i64,
    pub experience_level: Option<String>,
    pub employment_type: Option<String>,
    pub location: Option<String>,
    pub work_mode: Option<String>,
    pub company: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

impl SearchParams for JobSearchParams {
    fn limit(&self) -> i64 {
        self.limit
    }

    fn offset(&self) -> i64 {
        self.offset
    }
}

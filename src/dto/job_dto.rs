use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{Error, Result};
use crate::models::job::{JobSearchParams, JobWithCompany};
use crate::models::technology::JobTechnologyWithDetails;
use crate::pipeline::{PaginationDetails, SearchRequest, SearchResult};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

pub const MIN_QUERY_LENGTH: usize = 2;
pub const MAX_QUERY_LENGTH: usize = 100;

pub const EXPERIENCE_LEVELS: &[&str] = &[
    "entry-level",
    "mid-level",
    "senior",
    "manager",
    "director",
    "executive",
];
pub const EMPLOYMENT_TYPES: &[&str] = &[
    "full-time",
    "part-time",
    "contractor",
    "temporary",
    "internship",
];
pub const LOCATIONS: &[&str] = &["costarica", "latam"];
pub const WORK_MODES: &[&str] = &["remote", "hybrid", "onsite"];

const DATE_FORMAT: &str = "%Y-%m-%d";

// Matched against the lowercased query.
const SUSPICIOUS_PATTERNS: &[&str] = &[
    "<script",
    "</script",
    "javascript:",
    "vbscript:",
    "onerror=",
    "onload=",
    "<iframe",
    "union select",
    "drop table",
    "--",
    "/*",
    "*/",
    "\0",
];

/// Query string of `GET /api/v1/jobs` and `GET /api/v1/jobs/count`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct JobSearchRequest {
    /// Search query, matched against title, company and description
    #[param(example = "golang developer")]
    pub q: String,
    /// Number of results to return (max 100)
    #[serde(default, deserialize_with = "empty_as_zero")]
    #[param(example = 20)]
    pub limit: i64,
    /// Number of results to skip
    #[serde(default, deserialize_with = "empty_as_zero")]
    #[param(example = 0)]
    pub offset: i64,
    /// entry-level, mid-level, senior, manager, director or executive
    #[serde(default, rename = "experience")]
    pub experience_level: String,
    /// full-time, part-time, contractor, temporary or internship
    #[serde(default, rename = "type")]
    pub employment_type: String,
    /// costarica or latam
    #[serde(default)]
    pub location: String,
    /// remote, hybrid or onsite
    #[serde(default, rename = "mode")]
    pub work_mode: String,
    /// Company name filter (partial match)
    #[serde(default)]
    pub company: String,
    /// Start date filter (YYYY-MM-DD)
    #[serde(default)]
    pub date_from: String,
    /// End date filter (YYYY-MM-DD)
    #[serde(default)]
    pub date_to: String,
}

impl JobSearchRequest {
    fn validate_query(&self, errors: &mut Vec<String>) {
        let query = self.q.trim();
        if query.is_empty() {
            errors.push("search query cannot be empty".to_string());
            return;
        }

        // Measured in bytes.
        let length = query.len();
        if length < MIN_QUERY_LENGTH {
            errors.push(format!(
                "search query must be at least {} characters",
                MIN_QUERY_LENGTH
            ));
        }
        if length > MAX_QUERY_LENGTH {
            errors.push(format!(
                "search query cannot exceed {} characters",
                MAX_QUERY_LENGTH
            ));
        }

        if contains_suspicious_patterns(query) {
            errors.push("search query contains invalid characters".to_string());
        }
    }

    fn validate_enum_fields(&self, errors: &mut Vec<String>) {
        let fields = [
            ("experience_level", &self.experience_level, EXPERIENCE_LEVELS),
            ("employment_type", &self.employment_type, EMPLOYMENT_TYPES),
            ("location", &self.location, LOCATIONS),
            ("work_mode", &self.work_mode, WORK_MODES),
        ];

        for (field, value, allowed) in fields {
            if !value.is_empty() && !allowed.contains(&value.as_str()) {
                errors.push(format!("invalid value for field: '{}'", field));
            }
        }
    }

    fn validate_date_range(&self, errors: &mut Vec<String>) {
        let has_from = !self.date_from.is_empty();
        let has_to = !self.date_to.is_empty();

        if has_from != has_to {
            errors.push("both date_from and date_to must be provided together".to_string());
            return;
        }
        if !has_from {
            return;
        }

        let from = parse_date(&self.date_from);
        if from.is_err() {
            errors.push("date_from must be in YYYY-MM-DD format".to_string());
        }
        let to = parse_date(&self.date_to);
        if to.is_err() {
            errors.push("date_to must be in YYYY-MM-DD format".to_string());
        }

        if let (Ok(from), Ok(to)) = (from, to) {
            if from > to {
                errors.push("date_from cannot be after date_to".to_string());
            }
        }
    }
}

impl SearchRequest for JobSearchRequest {
    type Params = JobSearchParams;

    fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        self.validate_query(&mut errors);
        self.validate_enum_fields(&mut errors);
        self.validate_date_range(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(errors))
        }
    }

    fn to_search_params(&self) -> Result<JobSearchParams> {
        let limit = if self.limit <= 0 {
            DEFAULT_LIMIT
        } else {
            self.limit.min(MAX_LIMIT)
        };

        let mut params = JobSearchParams {
            query: self.q.clone(),
            limit,
            offset: self.offset.max(0),
            experience_level: non_empty(&self.experience_level),
            employment_type: non_empty(&self.employment_type),
            location: non_empty(&self.location),
            work_mode: non_empty(&self.work_mode),
            company: non_empty(&self.company),
            date_from: None,
            date_to: None,
        };

        if !self.date_from.is_empty() && !self.date_to.is_empty() {
            params.date_from = Some(start_of_day("date_from", &self.date_from)?);
            params.date_to = Some(start_of_day("date_to", &self.date_to)?);
        }

        Ok(params)
    }
}

/// Integer query value where an empty string (`limit=`) means "not set".
fn empty_as_zero<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct EmptyAsZero;

    impl<'de> de::Visitor<'de> for EmptyAsZero {
        type Value = i64;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("an integer or an empty string")
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<i64, E> {
            Ok(value)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<i64, E> {
            i64::try_from(value).map_err(E::custom)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<i64, E> {
            let value = value.trim();
            if value.is_empty() {
                Ok(0)
            } else {
                value.parse().map_err(E::custom)
            }
        }
    }

    deserializer.deserialize_any(EmptyAsZero)
}

fn contains_suspicious_patterns(query: &str) -> bool {
    let lowered = query.to_lowercase();
    SUSPICIOUS_PATTERNS
        .iter()
        .any(|pattern| lowered.contains(pattern))
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_date(raw: &str) -> std::result::Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
}

fn start_of_day(field: &'static str, raw: &str) -> Result<DateTime<Utc>> {
    parse_date(raw)
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|source| Error::Conversion {
            field,
            value: raw.to_string(),
            source,
        })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct JobResponse {
    #[serde(rename = "job_id")]
    pub id: i32,
    pub company_id: i32,
    pub company_name: String,
    pub company_logo_url: String,
    pub title: String,
    pub description: String,
    pub responsibilities: Vec<String>,
    pub requirements: JobRequirementsResponse,
    pub benefits: Vec<String>,
    pub experience_level: String,
    pub employment_type: String,
    pub location: String,
    pub work_mode: String,
    pub application_url: String,
    pub technologies: Vec<TechnologyResponse>,
    pub posted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct JobRequirementsResponse {
    pub must_have: Vec<String>,
    pub nice_to_have: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TechnologyResponse {
    pub name: String,
    pub category: String,
    pub required: bool,
}

/// OpenAPI schema of the `SearchResponse<JobResponse>` envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobSearchResponse {
    pub data: Vec<JobResponse>,
    pub pagination: PaginationDetails,
}

impl From<JobTechnologyWithDetails> for TechnologyResponse {
    fn from(value: JobTechnologyWithDetails) -> Self {
        Self {
            name: value.tech_name,
            category: value.tech_category,
            required: value.is_required,
        }
    }
}

impl JobResponse {
    pub fn from_parts(value: JobWithCompany, technologies: Vec<JobTechnologyWithDetails>) -> Self {
        let job = value.job;
        Self {
            id: job.id,
            company_id: job.company_id,
            company_name: value.company_name,
            company_logo_url: value.company_logo_url,
            title: job.title,
            description: job.description,
            responsibilities: job.responsibilities,
            requirements: JobRequirementsResponse {
                must_have: job.skill_must_have,
                nice_to_have: job.skill_nice_to_have,
            },
            benefits: job.benefits,
            experience_level: job.experience_level,
            employment_type: job.employment_type,
            location: job.location,
            work_mode: job.work_mode,
            application_url: job.application_url,
            technologies: technologies.into_iter().map(Into::into).collect(),
            posted_at: job.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobResponseList(pub Vec<JobResponse>);

impl SearchResult for JobResponseList {
    type Item = JobResponse;

    fn items(&self) -> &[JobResponse] {
        &self.0
    }

    fn into_items(self) -> Vec<JobResponse> {
        self.0
    }
}

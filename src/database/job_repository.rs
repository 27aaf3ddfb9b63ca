use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use crate::error::Result;
use crate::models::job::{JobSearchParams, JobWithCompany};

const SELECT_JOBS: &str = r#"
    SELECT
        j.id, j.company_id, j.title, j.original_post, j.description,
        j.responsibilities, j.skill_must_have, j.skill_nice_to_have, j.benefits,
        j.experience_level, j.employment_type, j.location, j.work_mode,
        j.application_url, j.is_active, j.signature, j.created_at, j.updated_at,
        c.name AS company_name,
        c.logo_url AS company_logo_url,
        COUNT(*) OVER() AS total_count
    FROM jobs j
    JOIN companies c ON c.id = j.company_id
"#;

const COUNT_JOBS: &str = r#"
    SELECT COUNT(*)
    FROM jobs j
    JOIN companies c ON c.id = j.company_id
"#;

#[derive(Debug, sqlx::FromRow)]
struct JobSearchRow {
    #[sqlx(flatten)]
    job: JobWithCompany,
    total_count: i64,
}

#[derive(Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip_all, fields(component = "database", limit = params.limit, offset = params.offset))]
    pub async fn search_jobs_with_count(
        &self,
        params: &JobSearchParams,
    ) -> Result<(Vec<JobWithCompany>, i64)> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_JOBS);
        push_search_filters(&mut builder, params);
        builder
            .push(" ORDER BY j.created_at DESC, j.id DESC LIMIT ")
            .push_bind(params.limit)
            .push(" OFFSET ")
            .push_bind(params.offset);

        let rows = builder
            .build_query_as::<JobSearchRow>()
            .fetch_all(&self.pool)
            .await?;

        // The window count is only visible on returned rows.
        let total = match rows.first() {
            Some(row) => row.total_count,
            None if params.offset > 0 => self.get_search_count(params).await?,
            None => 0,
        };

        Ok((rows.into_iter().map(|row| row.job).collect(), total))
    }

    #[instrument(skip_all, fields(component = "database"))]
    pub async fn get_search_count(&self, params: &JobSearchParams) -> Result<i64> {
        let mut builder = QueryBuilder::<Postgres>::new(COUNT_JOBS);
        push_search_filters(&mut builder, params);

        let total = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}

fn push_search_filters(builder: &mut QueryBuilder<'_, Postgres>, params: &JobSearchParams) {
    builder.push(" WHERE j.is_active = TRUE");

    let query = params.query.trim();
    if !query.is_empty() {
        let pattern = contains_pattern(query);
        builder
            .push(" AND (j.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR c.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR j.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    let exact_filters = [
        ("j.experience_level", &params.experience_level),
        ("j.employment_type", &params.employment_type),
        ("j.work_mode", &params.work_mode),
    ];
    for (column, value) in exact_filters {
        if let Some(value) = value {
            builder
                .push(format!(" AND LOWER({}) = LOWER(", column))
                .push_bind(value.clone())
                .push(")");
        }
    }

    if let Some(location) = &params.location {
        builder
            .push(" AND j.location ILIKE ")
            .push_bind(contains_pattern(location));
    }
    if let Some(company) = &params.company {
        builder
            .push(" AND c.name ILIKE ")
            .push_bind(contains_pattern(company));
    }
    if let Some(date_from) = params.date_from {
        builder.push(" AND j.created_at >= ").push_bind(date_from);
    }
    if let Some(date_to) = params.date_to {
        builder.push(" AND j.created_at <= ").push_bind(date_to);
    }
}

/// `%value%` with LIKE metacharacters escaped so user input matches literally.
fn contains_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> JobSearchParams {
        JobSearchParams {
            query: "golang".into(),
            limit: 20,
            ..Default::default()
        }
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(contains_pattern("c#"), "%c#%");
        assert_eq!(contains_pattern("100%_done"), "%100\\%\\_done%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn only_active_filters_reach_the_sql() {
        let mut builder = QueryBuilder::<Postgres>::new(COUNT_JOBS);
        push_search_filters(&mut builder, &params());
        let sql = builder.sql().to_string();

        assert!(sql.contains("j.is_active = TRUE"));
        assert!(sql.contains("j.title ILIKE $1"));
        assert!(sql.contains("j.description ILIKE $3"));
        assert!(!sql.contains("experience_level"));
        assert!(!sql.contains("created_at"));
    }

    #[test]
    fn every_filter_gets_its_own_placeholder() {
        let params = JobSearchParams {
            experience_level: Some("senior".into()),
            employment_type: Some("full-time".into()),
            work_mode: Some("remote".into()),
            location: Some("costarica".into()),
            company: Some("Tech".into()),
            date_from: Some(chrono::Utc::now()),
            date_to: Some(chrono::Utc::now()),
            ..params()
        };
        let mut builder = QueryBuilder::<Postgres>::new(COUNT_JOBS);
        push_search_filters(&mut builder, &params);
        let sql = builder.sql().to_string();

        assert!(sql.contains("LOWER(j.experience_level) = LOWER($4)"));
        assert!(sql.contains("LOWER(j.work_mode) = LOWER($6)"));
        assert!(sql.contains("j.location ILIKE $7"));
        assert!(sql.contains("c.name ILIKE $8"));
        assert!(sql.contains("j.created_at >= $9"));
        assert!(sql.contains("j.created_at <= $10"));
    }
}

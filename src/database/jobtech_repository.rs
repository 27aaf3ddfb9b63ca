use std::collections::HashMap;

use sqlx::PgPool;
use tracing::instrument;

use crate::error::Result;
use crate::models::technology::JobTechnologyWithDetails;

#[derive(Clone)]
pub struct JobTechnologyRepository {
    pool: PgPool,
}

impl JobTechnologyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads the technologies of all `job_ids` in a single round trip.
    #[instrument(skip_all, fields(component = "database", jobs = job_ids.len()))]
    pub async fn get_job_technologies_batch(
        &self,
        job_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<JobTechnologyWithDetails>>> {
        if job_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, JobTechnologyWithDetails>(
            r#"
            SELECT
                jt.job_id,
                jt.technology_id,
                t.name AS tech_name,
                t.category AS tech_category,
                jt.is_required
            FROM job_technologies jt
            JOIN technologies t ON t.id = jt.technology_id
            WHERE jt.job_id = ANY($1)
            ORDER BY jt.job_id, jt.is_required DESC, t.name
            "#,
        )
        .bind(job_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(group_by_job(rows))
    }
}

fn group_by_job(
    rows: Vec<JobTechnologyWithDetails>,
) -> HashMap<i32, Vec<JobTechnologyWithDetails>> {
    let mut grouped: HashMap<i32, Vec<JobTechnologyWithDetails>> = HashMap::new();
    for row in rows {
        grouped.entry(row.job_id).or_default().push(row);
    }
    grouped
}

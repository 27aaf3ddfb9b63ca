use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct JobTechnologyWithDetails {
    pub job_id: i32,
    pub technology_id: i32,
    pub tech_name: String,
    pub tech_category: String,
    pub is_required: bool,
}

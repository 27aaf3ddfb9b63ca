use crate::config::DatabaseConfig;
use crate::error::Result;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .max_lifetime(Duration::from_secs(60 * 60))
        .idle_timeout(Duration::from_secs(30 * 60))
        .test_before_acquire(true)
        .connect(&config.connection_url())
        .await?;
    Ok(pool)
}

//! CLI command implementations.

pub mod clean;
pub mod download;
pub mod load;
pub mod status;
pub mod update;

use crate::Result;
use calraw_pipeline::config::PipelineConfig;
use calraw_pipeline::db::{create_pool, run_migrations, DbConfig};
use calraw_pipeline::history::PgRunHistory;
use sqlx::PgPool;

/// Resolve the pipeline configuration for a command invocation.
pub(crate) fn base_config() -> PipelineConfig {
    PipelineConfig::default().with_env_overrides()
}

/// Connect to the database, run migrations, and build the history store.
pub(crate) async fn connect() -> Result<(PgPool, PgRunHistory)> {
    let db_config = DbConfig::from_env()?;
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;
    let history = PgRunHistory::new(pool.clone());
    Ok((pool, history))
}

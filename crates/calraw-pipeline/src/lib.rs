//! Batch ETL pipeline for the campaign-finance raw database.
//!
//! Downloads the state's periodically republished archive, cleans each raw
//! TSV into a loadable CSV, and bulk-loads the results into Postgres. Runs
//! are recorded durably so an interrupted invocation can be resumed, with
//! already-completed work skipped.
//!
//! # Components
//!
//! - [`history`]: durable record of runs and dataset versions
//! - [`resume`]: pure up-to-date / resume / restart decision
//! - [`stage`]: per-item stage execution with resume skipping
//! - [`loader`]: schema-driven bulk load of one CSV into one table
//! - [`clean`]: TSV normalization collaborator
//! - [`download`]: archive source collaborator
//! - [`coordinator`]: top-level sequencing
//!
//! # Example
//!
//! ```no_run
//! use calraw_pipeline::config::PipelineConfig;
//! use calraw_pipeline::coordinator::PipelineCoordinator;
//! use calraw_pipeline::db::{create_pool, run_migrations, DbConfig};
//! use calraw_pipeline::download::HttpArchiveSource;
//! use calraw_pipeline::history::PgRunHistory;
//! use calraw_pipeline::prompt::InteractivePrompt;
//! use calraw_pipeline::schema::SchemaRegistry;
//!
//! # async fn run() -> calraw_pipeline::Result<()> {
//! let config = PipelineConfig::default().with_env_overrides().normalized();
//! let pool = create_pool(&DbConfig::from_env()?).await?;
//! run_migrations(&pool).await?;
//!
//! let history = PgRunHistory::new(pool.clone());
//! let source = HttpArchiveSource::new(config.archive_url.clone());
//! let registry = SchemaRegistry::for_app(&config.app)?;
//!
//! PipelineCoordinator::new(&config, &pool, &history, &source, &InteractivePrompt, &registry)
//!     .run()
//!     .await
//! # }
//! ```

pub mod clean;
pub mod config;
pub mod coordinator;
pub mod db;
pub mod download;
pub mod error;
pub mod history;
pub mod loader;
pub mod prompt;
pub mod resume;
pub mod schema;
pub mod stage;

pub use error::{PipelineError, Result};

//! Streamflow content ETL
//!
//! Batch pipeline that reads a nested content catalog plus flat user and
//! viewing-session tables, reshapes the catalog into `content`, `movies` and
//! `series` tables, validates them and loads everything into PostgreSQL in a
//! single transaction.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use streamflow_etl::{ContentPipeline, EtlConfig, LogAlerter, PgStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = EtlConfig::from_env()?;
//!     let store = PgStore::connect(&config.database, config.batch_size).await?;
//!     let pipeline = ContentPipeline::new(
//!         config.paths.clone(),
//!         Arc::new(store),
//!         Arc::new(LogAlerter::new(config.alert_recipient.clone())),
//!     );
//!
//!     let output = pipeline.run().await?;
//!     println!("loaded {} rows", output.summary.rows_loaded);
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod alert;
pub mod codec;
pub mod config;
pub mod convert;
pub mod error;
pub mod extract;
pub mod load;
pub mod models;
pub mod pipeline;
pub mod runner;
pub mod snapshot;
pub mod stats;
pub mod store;
pub mod transform;
pub mod validate;

pub use alert::{Alerter, LogAlerter};
pub use config::{DatabaseConfig, EtlConfig, PipelinePaths};
pub use error::{EtlError, Result};
pub use models::{
    ContentRow, ContentType, FlatContentRow, MovieRow, NormalizedTables, RawCatalog, SeriesRow,
    SessionRecord, Table, UserRecord,
};
pub use pipeline::{ContentPipeline, PipelineOutput, PipelineState};
pub use runner::PipelineRunner;
pub use stats::{format_duration, PipelineSummary};
pub use store::{PgStore, Store, StoreError, UnitOfWork};
pub use validate::{Violation, ViolationKind};

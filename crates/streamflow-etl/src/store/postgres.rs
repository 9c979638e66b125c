//! PostgreSQL store backed by a sqlx connection pool
//!
//! Every unit of work wraps one database transaction. Rows are written with
//! multi-row `INSERT ... VALUES` statements of at most `batch_size` rows,
//! further capped so a single statement stays under PostgreSQL's
//! bind-parameter limit.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::query_builder::Separated;
use sqlx::{Postgres, QueryBuilder, Transaction};
use std::time::Duration;
use tracing::{debug, info};

use super::{Store, StoreError, StoreResult, UnitOfWork};
use crate::config::DatabaseConfig;
use crate::models::{ContentRow, MovieRow, SeriesRow, SessionRecord, TableRow, UserRecord};

/// Most bind parameters PostgreSQL accepts in one statement
pub const MAX_BIND_PARAMS: usize = 65_535;

pub struct PgStore {
    pool: PgPool,
    batch_size: usize,
}

impl PgStore {
    pub fn new(pool: PgPool, batch_size: usize) -> Self {
        Self {
            pool,
            batch_size: batch_size.max(1),
        }
    }

    /// Open a connection pool for the configured database
    pub async fn connect(config: &DatabaseConfig, batch_size: usize) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await?;

        info!(
            max_connections = config.max_connections,
            batch_size, "Database connection pool created"
        );

        Ok(Self::new(pool, batch_size))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        debug!("Transaction opened");
        Ok(Box::new(PgUnitOfWork {
            tx: Some(tx),
            batch_size: self.batch_size,
        }))
    }
}

pub struct PgUnitOfWork {
    tx: Option<Transaction<'static, Postgres>>,
    batch_size: usize,
}

impl PgUnitOfWork {
    async fn insert<T: PgBind>(&mut self, rows: &[T]) -> StoreResult<u64> {
        let tx = self.tx.as_mut().ok_or(StoreError::Closed)?;
        insert_rows(tx, self.batch_size, rows).await
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn insert_users(&mut self, rows: &[UserRecord]) -> StoreResult<u64> {
        self.insert(rows).await
    }

    async fn insert_content(&mut self, rows: &[ContentRow]) -> StoreResult<u64> {
        self.insert(rows).await
    }

    async fn insert_sessions(&mut self, rows: &[SessionRecord]) -> StoreResult<u64> {
        self.insert(rows).await
    }

    async fn insert_movies(&mut self, rows: &[MovieRow]) -> StoreResult<u64> {
        self.insert(rows).await
    }

    async fn insert_series(&mut self, rows: &[SeriesRow]) -> StoreResult<u64> {
        self.insert(rows).await
    }

    async fn commit(&mut self) -> StoreResult<()> {
        let tx = self.tx.take().ok_or(StoreError::Closed)?;
        tx.commit().await?;
        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(&mut self) -> StoreResult<()> {
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
            debug!("Transaction rolled back");
        }
        Ok(())
    }
}

async fn insert_rows<T: PgBind>(
    tx: &mut Transaction<'static, Postgres>,
    batch_size: usize,
    rows: &[T],
) -> StoreResult<u64> {
    let mut written = 0;

    for chunk in rows.chunks(rows_per_statement::<T>(batch_size)) {
        let mut query_builder = QueryBuilder::<Postgres>::new(format!(
            "INSERT INTO {} ({}) ",
            T::TABLE.as_str(),
            T::COLUMNS.join(", ")
        ));

        query_builder.push_values(chunk.iter(), |mut b, row| row.bind_into(&mut b));

        let result = query_builder.build().execute(&mut **tx).await?;
        written += result.rows_affected();
    }

    debug!(table = %T::TABLE, rows = written, "Bulk insert complete");
    Ok(written)
}

/// `batch_size` limited to what fits in one statement for `T`
fn rows_per_statement<T: TableRow>(batch_size: usize) -> usize {
    batch_size.clamp(1, MAX_BIND_PARAMS / T::COLUMNS.len())
}

/// Binds one row's cells in `COLUMNS` order
trait PgBind: TableRow + Sync {
    fn bind_into<'args>(&self, b: &mut Separated<'_, 'args, Postgres, &'static str>);
}

impl PgBind for UserRecord {
    fn bind_into<'args>(&self, b: &mut Separated<'_, 'args, Postgres, &'static str>) {
        b.push_bind(self.user_id.clone())
            .push_bind(self.age)
            .push_bind(self.country.clone())
            .push_bind(self.subscription_type.clone())
            .push_bind(self.registration_date)
            .push_bind(self.total_watch_time_hours);
    }
}

impl PgBind for ContentRow {
    fn bind_into<'args>(&self, b: &mut Separated<'_, 'args, Postgres, &'static str>) {
        b.push_bind(self.content_id.clone())
            .push_bind(self.title.clone())
            .push_bind(self.content_type.as_str())
            .push_bind(self.genre.clone())
            .push_unseparated("::jsonb")
            .push_bind(self.rating)
            .push_bind(self.production_budget);
    }
}

impl PgBind for SessionRecord {
    fn bind_into<'args>(&self, b: &mut Separated<'_, 'args, Postgres, &'static str>) {
        b.push_bind(self.session_id.clone())
            .push_bind(self.user_id.clone())
            .push_bind(self.content_id.clone())
            .push_bind(self.watch_date)
            .push_bind(self.watch_duration_minutes)
            .push_bind(self.completion_percentage)
            .push_bind(self.device_type.clone())
            .push_bind(self.quality_level.clone());
    }
}

impl PgBind for MovieRow {
    fn bind_into<'args>(&self, b: &mut Separated<'_, 'args, Postgres, &'static str>) {
        b.push_bind(self.content_id.clone())
            .push_bind(self.duration_minutes)
            .push_bind(self.views_count)
            .push_bind(self.release_year);
    }
}

impl PgBind for SeriesRow {
    fn bind_into<'args>(&self, b: &mut Separated<'_, 'args, Postgres, &'static str>) {
        b.push_bind(self.content_id.clone())
            .push_bind(self.avg_episode_duration)
            .push_bind(self.episodes_per_season.clone())
            .push_unseparated("::jsonb")
            .push_bind(self.total_views);
    }
}

//! Persistence collaborator
//!
//! The pipeline never talks to a database directly. It asks a [`Store`] for a
//! [`UnitOfWork`], inserts every table through it and then commits or rolls
//! back. [`PgStore`] is the PostgreSQL implementation; tests use an
//! in-memory recorder.
//!
//! A unit of work is closed by `commit` or `rollback`. After that, inserts
//! and commits fail with [`StoreError::Closed`] and further rollbacks are
//! no-ops. Dropping an open unit of work discards its writes.

pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{ContentRow, MovieRow, SeriesRow, SessionRecord, UserRecord};

pub use postgres::PgStore;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Unit of work is already closed")]
    Closed,

    #[error("Store rejected write: {0}")]
    Rejected(String),
}

/// Hands out units of work
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>>;
}

/// One atomic batch of writes
///
/// Each insert returns the number of rows written.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn insert_users(&mut self, rows: &[UserRecord]) -> StoreResult<u64>;
    async fn insert_content(&mut self, rows: &[ContentRow]) -> StoreResult<u64>;
    async fn insert_sessions(&mut self, rows: &[SessionRecord]) -> StoreResult<u64>;
    async fn insert_movies(&mut self, rows: &[MovieRow]) -> StoreResult<u64>;
    async fn insert_series(&mut self, rows: &[SeriesRow]) -> StoreResult<u64>;

    async fn commit(&mut self) -> StoreResult<()>;

    /// Discard every write made so far; a no-op once closed
    async fn rollback(&mut self) -> StoreResult<()>;
}

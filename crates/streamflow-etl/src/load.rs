//! Loader: one bulk insert per table inside a single unit of work
//!
//! Tables go in a fixed order (users, content, sessions, movies, series) so
//! content rows exist before anything that references them. The first failed
//! insert rolls the whole unit of work back; committing is left to the
//! caller.

use tracing::{error, info, warn};

use crate::error::{EtlError, Result};
use crate::models::{NormalizedTables, SessionRecord, Table, UserRecord};
use crate::store::{StoreResult, UnitOfWork};

/// Insert every table, returning the total number of rows written
pub async fn load(
    tables: &NormalizedTables,
    users: &[UserRecord],
    sessions: &[SessionRecord],
    uow: &mut dyn UnitOfWork,
) -> Result<u64> {
    let mut total = 0;

    for table in [Table::Users, Table::Content, Table::Sessions, Table::Movies, Table::Series] {
        let result = match table {
            Table::Users => uow.insert_users(users).await,
            Table::Content => uow.insert_content(&tables.content).await,
            Table::Sessions => uow.insert_sessions(sessions).await,
            Table::Movies => uow.insert_movies(&tables.movies).await,
            Table::Series => uow.insert_series(&tables.series).await,
        };

        total += checked(table, result, uow).await?;
    }

    info!(rows = total, "All tables inserted");
    Ok(total)
}

async fn checked(table: Table, result: StoreResult<u64>, uow: &mut dyn UnitOfWork) -> Result<u64> {
    match result {
        Ok(rows) => {
            info!(table = %table, rows, "Table loaded");
            Ok(rows)
        },
        Err(source) => {
            error!(table = %table, error = %source, "Bulk insert failed, rolling back");
            if let Err(rollback_err) = uow.rollback().await {
                warn!(error = %rollback_err, "Rollback after failed insert also failed");
            }
            Err(EtlError::Load { table, source })
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::{ContentRow, MovieRow, SeriesRow};
    use crate::store::StoreError;
    use async_trait::async_trait;

    /// Records insert order and fails on one table
    #[derive(Default)]
    struct OrderedUow {
        calls: Vec<Table>,
        fail_on: Option<Table>,
        rolled_back: bool,
    }

    impl OrderedUow {
        fn record(&mut self, table: Table, rows: usize) -> StoreResult<u64> {
            self.calls.push(table);
            if self.fail_on == Some(table) {
                return Err(StoreError::Rejected(format!("{} unavailable", table)));
            }
            Ok(rows as u64)
        }
    }

    #[async_trait]
    impl UnitOfWork for OrderedUow {
        async fn insert_users(&mut self, rows: &[UserRecord]) -> StoreResult<u64> {
            self.record(Table::Users, rows.len())
        }
        async fn insert_content(&mut self, rows: &[ContentRow]) -> StoreResult<u64> {
            self.record(Table::Content, rows.len())
        }
        async fn insert_sessions(&mut self, rows: &[SessionRecord]) -> StoreResult<u64> {
            self.record(Table::Sessions, rows.len())
        }
        async fn insert_movies(&mut self, rows: &[MovieRow]) -> StoreResult<u64> {
            self.record(Table::Movies, rows.len())
        }
        async fn insert_series(&mut self, rows: &[SeriesRow]) -> StoreResult<u64> {
            self.record(Table::Series, rows.len())
        }
        async fn commit(&mut self) -> StoreResult<()> {
            Ok(())
        }
        async fn rollback(&mut self) -> StoreResult<()> {
            self.rolled_back = true;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_load_inserts_in_dependency_order() {
        let mut uow = OrderedUow::default();
        let rows = load(&NormalizedTables::default(), &[], &[], &mut uow).await.unwrap();

        assert_eq!(rows, 0);
        assert_eq!(
            uow.calls,
            vec![Table::Users, Table::Content, Table::Sessions, Table::Movies, Table::Series]
        );
        assert!(!uow.rolled_back);
    }

    #[tokio::test]
    async fn test_load_stops_and_rolls_back_on_failure() {
        let mut uow = OrderedUow {
            fail_on: Some(Table::Sessions),
            ..Default::default()
        };

        let err = load(&NormalizedTables::default(), &[], &[], &mut uow).await.unwrap_err();

        assert!(matches!(err, EtlError::Load { table: Table::Sessions, .. }));
        assert_eq!(uow.calls, vec![Table::Users, Table::Content, Table::Sessions]);
        assert!(uow.rolled_back);
    }
}

//! Shared helpers for the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use streamflow_etl::alert::Alerter;
use streamflow_etl::store::{Store, StoreError, StoreResult, UnitOfWork};
use streamflow_etl::{
    ContentPipeline, ContentRow, MovieRow, PipelinePaths, SeriesRow, SessionRecord, Table,
    UserRecord,
};

// ============================================================================
// Recording store
// ============================================================================

/// Row counts per table that were made visible by a commit
#[derive(Debug, Default)]
pub struct StoreState {
    pub begins: usize,
    pub commits: usize,
    pub rollbacks: usize,
    pub committed: Vec<(Table, usize)>,
    pub insert_calls: Vec<Table>,
}

impl StoreState {
    pub fn committed_rows(&self) -> usize {
        self.committed.iter().map(|(_, rows)| rows).sum()
    }

    pub fn committed_rows_for(&self, table: Table) -> usize {
        self.committed
            .iter()
            .filter(|(t, _)| *t == table)
            .map(|(_, rows)| rows)
            .sum()
    }
}

/// In-memory store that only publishes rows when a unit of work commits
#[derive(Clone, Default)]
pub struct RecordingStore {
    pub state: Arc<Mutex<StoreState>>,
    fail_on: Option<Table>,
    insert_delay: Option<Duration>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(table: Table) -> Self {
        Self {
            fail_on: Some(table),
            ..Self::default()
        }
    }

    pub fn with_insert_delay(delay: Duration) -> Self {
        Self {
            insert_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn snapshot<R>(&self, f: impl FnOnce(&StoreState) -> R) -> R {
        f(&self.state.lock().unwrap())
    }
}

#[async_trait]
impl Store for RecordingStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        self.state.lock().unwrap().begins += 1;
        Ok(Box::new(RecordingUow {
            state: Arc::clone(&self.state),
            fail_on: self.fail_on,
            insert_delay: self.insert_delay,
            pending: Vec::new(),
            closed: false,
        }))
    }
}

struct RecordingUow {
    state: Arc<Mutex<StoreState>>,
    fail_on: Option<Table>,
    insert_delay: Option<Duration>,
    pending: Vec<(Table, usize)>,
    closed: bool,
}

impl RecordingUow {
    async fn insert(&mut self, table: Table, rows: usize) -> StoreResult<u64> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        if let Some(delay) = self.insert_delay {
            tokio::time::sleep(delay).await;
        }
        self.state.lock().unwrap().insert_calls.push(table);
        if self.fail_on == Some(table) {
            return Err(StoreError::Rejected(format!("{} is read-only", table)));
        }
        self.pending.push((table, rows));
        Ok(rows as u64)
    }
}

#[async_trait]
impl UnitOfWork for RecordingUow {
    async fn insert_users(&mut self, rows: &[UserRecord]) -> StoreResult<u64> {
        self.insert(Table::Users, rows.len()).await
    }

    async fn insert_content(&mut self, rows: &[ContentRow]) -> StoreResult<u64> {
        self.insert(Table::Content, rows.len()).await
    }

    async fn insert_sessions(&mut self, rows: &[SessionRecord]) -> StoreResult<u64> {
        self.insert(Table::Sessions, rows.len()).await
    }

    async fn insert_movies(&mut self, rows: &[MovieRow]) -> StoreResult<u64> {
        self.insert(Table::Movies, rows.len()).await
    }

    async fn insert_series(&mut self, rows: &[SeriesRow]) -> StoreResult<u64> {
        self.insert(Table::Series, rows.len()).await
    }

    async fn commit(&mut self) -> StoreResult<()> {
        if self.closed {
            return Err(StoreError::Closed);
        }
        self.closed = true;
        let mut state = self.state.lock().unwrap();
        state.commits += 1;
        state.committed.append(&mut self.pending);
        Ok(())
    }

    async fn rollback(&mut self) -> StoreResult<()> {
        if !self.closed {
            self.closed = true;
            self.pending.clear();
            self.state.lock().unwrap().rollbacks += 1;
        }
        Ok(())
    }
}

// ============================================================================
// Capturing alerter
// ============================================================================

#[derive(Clone, Default)]
pub struct CapturingAlerter {
    pub alerts: Arc<Mutex<Vec<(String, String)>>>,
}

impl CapturingAlerter {
    pub fn alerts(&self) -> Vec<(String, String)> {
        self.alerts.lock().unwrap().clone()
    }
}

impl Alerter for CapturingAlerter {
    fn notify(&self, subject: &str, body: &str) {
        self.alerts
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub const USERS_CSV: &str = "\
user_id,age,country,subscription_type,registration_date,total_watch_time_hours
U001,34,Mexico,Premium,2023-02-11,120.5
U002,22,Spain,Basic,2024-07-01,3.25
";

pub const SESSIONS_CSV: &str = "\
session_id,user_id,content_id,watch_date,watch_duration_minutes,\
completion_percentage,device_type,quality_level
S001,U001,m1,2024-01-02,95.0,95.0,Smart TV,4K
S002,U002,s1,2024-01-03,25.0,100.0,Mobile,HD
S003,U001,s1,2024-01-04,12.5,50.0,Laptop,SD
";

pub fn sample_catalog() -> Value {
    json!({
        "movies": [{
            "content_id": "m1", "title": "A", "genre": ["Drama"], "rating": 7.5,
            "production_budget": 1000000, "duration_minutes": 100,
            "views_count": 500, "release_year": 2020
        }],
        "series": [{
            "content_id": "s1", "title": "B", "genre": ["Comedy"], "rating": 8.0,
            "production_budget": 2000000, "avg_episode_duration": 25,
            "episodes_per_season": [10, 8], "total_views": 9999
        }]
    })
}

pub fn catalog_missing_title() -> Value {
    json!({
        "movies": [
            {"content_id": "m1", "title": "A", "genre": ["Drama"], "rating": 7.5,
             "production_budget": 1000000, "duration_minutes": 100,
             "views_count": 500, "release_year": 2020},
            {"content_id": "m2", "genre": ["Action"], "rating": 6.0,
             "production_budget": 500000, "duration_minutes": 90,
             "views_count": 10, "release_year": 2021}
        ],
        "series": []
    })
}

/// Write a data directory with the standard layout and return its paths
pub fn write_fixture(dir: &Path, catalog: &Value) -> PipelinePaths {
    let paths = PipelinePaths::under(dir);
    std::fs::write(&paths.catalog, serde_json::to_vec_pretty(catalog).unwrap()).unwrap();
    std::fs::write(&paths.users, USERS_CSV).unwrap();
    std::fs::write(&paths.sessions, SESSIONS_CSV).unwrap();
    paths
}

pub struct Harness {
    pub dir: TempDir,
    pub store: RecordingStore,
    pub alerter: CapturingAlerter,
    pub pipeline: ContentPipeline,
}

pub fn harness(catalog: &Value, store: RecordingStore) -> Harness {
    let dir = TempDir::new().unwrap();
    let paths = write_fixture(dir.path(), catalog);
    let alerter = CapturingAlerter::default();
    let pipeline = ContentPipeline::new(
        paths,
        Arc::new(store.clone()),
        Arc::new(alerter.clone()),
    );

    Harness {
        dir,
        store,
        alerter,
        pipeline,
    }
}

//! Pipeline orchestrator
//!
//! Sequences extract, transform, validate and load, times each phase and
//! owns the failure contract: on any error the open unit of work is rolled
//! back, exactly one alert is raised, a structured failure line is logged and
//! the original error is returned.
//!
//! ```text
//! Extracting -> Transforming -> Validating -> Loading -> Completed
//!      \______________\______________\___________\______> Failed
//! ```

use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::alert::{Alerter, FAILURE_ALERT_SUBJECT, VALIDATION_ALERT_SUBJECT};
use crate::config::PipelinePaths;
use crate::convert::write_json_lines;
use crate::error::{EtlError, Result};
use crate::extract::{read_catalog, read_table};
use crate::load::load;
use crate::models::{NormalizedTables, SessionRecord, UserRecord};
use crate::snapshot::write_snapshots;
use crate::stats::{format_duration, PhaseTimings, PipelineSummary};
use crate::store::{Store, UnitOfWork};
use crate::transform::transform;
use crate::validate::validate_all;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Extracting,
    Transforming,
    Validating,
    Loading,
    Completed,
    Failed,
}

impl PipelineState {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineState::Extracting => "extracting",
            PipelineState::Transforming => "transforming",
            PipelineState::Validating => "validating",
            PipelineState::Loading => "loading",
            PipelineState::Completed => "completed",
            PipelineState::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Completed | PipelineState::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a successful run produced
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub tables: NormalizedTables,
    pub users: Vec<UserRecord>,
    pub sessions: Vec<SessionRecord>,
    pub summary: PipelineSummary,
}

/// The content ETL pipeline
///
/// Holds its collaborators; each call to [`run`](Self::run) is an independent
/// run with its own unit of work.
pub struct ContentPipeline {
    paths: PipelinePaths,
    store: Arc<dyn Store>,
    alerter: Arc<dyn Alerter>,
}

impl ContentPipeline {
    pub fn new(paths: PipelinePaths, store: Arc<dyn Store>, alerter: Arc<dyn Alerter>) -> Self {
        Self {
            paths,
            store,
            alerter,
        }
    }

    pub fn paths(&self) -> &PipelinePaths {
        &self.paths
    }

    /// Run every phase once
    pub async fn run(&self) -> Result<PipelineOutput> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline_run", %run_id);

        async move {
            let mut run = RunState::new(run_id);
            match self.execute(&mut run).await {
                Ok(output) => Ok(output),
                Err(err) => {
                    self.fail(&mut run, &err).await;
                    Err(err)
                },
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, run: &mut RunState) -> Result<PipelineOutput> {
        info!(catalog = %self.paths.catalog.display(), "Pipeline started");

        run.enter(PipelineState::Extracting);
        let catalog = read_catalog(&self.paths.catalog)?;
        let users: Vec<UserRecord> = read_table(&self.paths.users)?;
        let sessions: Vec<SessionRecord> = read_table(&self.paths.sessions)?;
        run.timings.extract = run.phase_elapsed();

        run.enter(PipelineState::Transforming);
        let tables = transform(&catalog)?;
        write_snapshots(&self.paths.snapshot_dir, &tables)?;
        write_json_lines(&self.paths.users_json_lines(), &users)?;
        write_json_lines(&self.paths.sessions_json_lines(), &sessions)?;
        run.timings.transform = run.phase_elapsed();

        run.enter(PipelineState::Validating);
        let violations = validate_all(&tables);
        run.timings.validate = run.phase_elapsed();
        if !violations.is_empty() {
            return Err(EtlError::ValidationFailed { violations });
        }

        run.enter(PipelineState::Loading);
        let uow = self.store.begin().await.map_err(EtlError::UnitOfWork)?;
        let uow = run.uow.insert(uow);
        let rows_loaded = load(&tables, &users, &sessions, uow.as_mut()).await?;
        uow.commit().await.map_err(EtlError::UnitOfWork)?;
        run.uow = None;
        run.timings.load = run.phase_elapsed();

        run.enter(PipelineState::Completed);
        let summary = PipelineSummary {
            run_id: run.run_id,
            timings: run.timings,
            total: run.started.elapsed(),
            rows_processed: tables.row_count() + users.len() + sessions.len(),
            rows_loaded,
            started_at: run.started_at,
            completed_at: Utc::now(),
        };
        summary.log();

        Ok(PipelineOutput {
            tables,
            users,
            sessions,
            summary,
        })
    }

    async fn fail(&self, run: &mut RunState, err: &EtlError) {
        let phase = run.state;
        run.state = PipelineState::Failed;

        if let Some(mut uow) = run.uow.take() {
            if let Err(rollback_err) = uow.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
        }

        let elapsed = format_duration(run.started.elapsed());
        let header = format!("Pipeline failed after {} during {}", elapsed, phase);
        let (subject, body) = match err {
            EtlError::ValidationFailed { violations } => {
                let lines: Vec<String> = violations.iter().map(|v| format!("- {}", v)).collect();
                (VALIDATION_ALERT_SUBJECT, format!("{}\n{}", header, lines.join("\n")))
            },
            other => (
                FAILURE_ALERT_SUBJECT,
                format!("{}\nError [{}]: {}", header, other.kind(), other),
            ),
        };
        self.alerter.notify(subject, &body);

        error!(
            run_id = %run.run_id,
            phase = %phase,
            error_kind = err.kind(),
            elapsed = %elapsed,
            error = %err,
            "Pipeline failed"
        );
    }
}

/// Mutable bookkeeping for one run
struct RunState {
    run_id: Uuid,
    state: PipelineState,
    started: Instant,
    started_at: chrono::DateTime<Utc>,
    phase_started: Instant,
    timings: PhaseTimings,
    /// Open unit of work, dropped (and so released) with the run
    uow: Option<Box<dyn UnitOfWork>>,
}

impl RunState {
    fn new(run_id: Uuid) -> Self {
        let now = Instant::now();
        Self {
            run_id,
            state: PipelineState::Extracting,
            started: now,
            started_at: Utc::now(),
            phase_started: now,
            timings: PhaseTimings::default(),
            uow: None,
        }
    }

    fn enter(&mut self, state: PipelineState) {
        self.state = state;
        self.phase_started = Instant::now();
        if !state.is_terminal() {
            info!(phase = %state, "Entering phase");
        }
    }

    fn phase_elapsed(&self) -> Duration {
        self.phase_started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_names() {
        assert_eq!(PipelineState::Extracting.to_string(), "extracting");
        assert_eq!(PipelineState::Failed.as_str(), "failed");
        assert!(PipelineState::Completed.is_terminal());
        assert!(!PipelineState::Loading.is_terminal());
    }
}

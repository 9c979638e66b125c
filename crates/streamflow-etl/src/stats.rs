//! Run timing and throughput
//!
//! A successful run ends with a [`PipelineSummary`]: per-phase durations,
//! each phase's share of the total, rows processed and rows per second.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Wall-clock time spent in each phase
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseTimings {
    pub extract: Duration,
    pub transform: Duration,
    pub validate: Duration,
    pub load: Duration,
}

impl PhaseTimings {
    pub fn phases(&self) -> [(&'static str, Duration); 4] {
        [
            ("extract", self.extract),
            ("transform", self.transform),
            ("validate", self.validate),
            ("load", self.load),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSummary {
    pub run_id: Uuid,
    pub timings: PhaseTimings,
    pub total: Duration,
    /// Rows across every table the run built or read
    pub rows_processed: usize,
    /// Rows reported written by the store
    pub rows_loaded: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl PipelineSummary {
    /// Rows processed per second of total run time
    pub fn throughput(&self) -> f64 {
        let secs = self.total.as_secs_f64();
        if secs > 0.0 {
            self.rows_processed as f64 / secs
        } else {
            0.0
        }
    }

    /// Share of the total run time spent in `phase`, as a percentage
    pub fn share(&self, phase: Duration) -> f64 {
        let total = self.total.as_secs_f64();
        if total > 0.0 {
            phase.as_secs_f64() / total * 100.0
        } else {
            0.0
        }
    }

    /// Emit the performance summary
    pub fn log(&self) {
        for (phase, duration) in self.timings.phases() {
            info!(
                run_id = %self.run_id,
                phase,
                duration = %format_duration(duration),
                share_pct = %format!("{:.1}", self.share(duration)),
                "Phase timing"
            );
        }

        info!(
            run_id = %self.run_id,
            total = %format_duration(self.total),
            rows_processed = self.rows_processed,
            rows_loaded = self.rows_loaded,
            rows_per_sec = %format!("{:.2}", self.throughput()),
            "Pipeline completed"
        );
    }
}

/// `850.00ms`, `12.34s` or `2m 5.00s`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 1.0 {
        format!("{:.2}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        let minutes = (secs / 60.0).floor();
        format!("{}m {:.2}s", minutes as u64, secs - minutes * 60.0)
    }
}

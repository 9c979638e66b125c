//! Error types for the content ETL

use std::path::PathBuf;
use thiserror::Error;

use crate::models::Table;
use crate::store::StoreError;
use crate::validate::Violation;

/// Result type alias for ETL operations
pub type Result<T> = std::result::Result<T, EtlError>;

/// Everything that can abort a pipeline run
#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Source file not found: {}", .path.display())]
    SourceNotFound { path: PathBuf },

    #[error("Malformed source {}: {reason}", .path.display())]
    SourceMalformed { path: PathBuf, reason: String },

    #[error("Schema error in table '{table}', column '{column}': {detail}")]
    TransformSchema {
        table: Table,
        column: String,
        detail: String,
    },

    #[error(
        "Validation failed with {} violation(s): {}",
        .violations.len(),
        join_violations(.violations)
    )]
    ValidationFailed { violations: Vec<Violation> },

    #[error("Bulk insert into '{table}' failed: {source}")]
    Load {
        table: Table,
        #[source]
        source: StoreError,
    },

    #[error("Unit of work failed: {0}")]
    UnitOfWork(#[source] StoreError),

    #[error("Failed to write {}: {reason}", .path.display())]
    Snapshot { path: PathBuf, reason: String },

    #[error("Pipeline '{0}' is already running")]
    AlreadyRunning(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EtlError {
    /// Stable name of the error kind, used in alerts and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            EtlError::SourceNotFound { .. } => "SourceNotFound",
            EtlError::SourceMalformed { .. } => "SourceMalformed",
            EtlError::TransformSchema { .. } => "TransformSchemaError",
            EtlError::ValidationFailed { .. } => "ValidationFailed",
            EtlError::Load { .. } => "LoadError",
            EtlError::UnitOfWork(_) => "UnitOfWorkError",
            EtlError::Snapshot { .. } => "SnapshotError",
            EtlError::AlreadyRunning(_) => "AlreadyRunning",
            EtlError::Config(_) => "ConfigError",
        }
    }

    /// True for expected data-quality failures as opposed to system failures
    pub fn is_data_quality(&self) -> bool {
        matches!(self, EtlError::ValidationFailed { .. })
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        EtlError::SourceMalformed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn snapshot(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        EtlError::Snapshot {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

//! Structural checks run on the normalized tables before anything is loaded
//!
//! Validation never fails: problems come back as a list of [`Violation`]s and
//! the orchestrator decides what to do with them.

use std::collections::HashSet;

use crate::models::{ContentRow, MovieRow, NormalizedTables, SeriesRow, Table};

/// A data-quality problem found in one column of one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub table: Table,
    pub column: &'static str,
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// At least one row has no value in the column
    MissingValues { rows: usize },
    /// Values that occur more than once, in first-seen order
    DuplicateValues { values: Vec<String> },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ViolationKind::MissingValues { rows } => write!(
                f,
                "[{}] Missing values in '{}' column ({} row(s))",
                self.table, self.column, rows
            ),
            ViolationKind::DuplicateValues { values } => write!(
                f,
                "[{}] Duplicate values in '{}' column: {}",
                self.table,
                self.column,
                values.join(", ")
            ),
        }
    }
}

/// Content table: content_id and title present, content_id unique
pub fn validate_content(rows: &[ContentRow]) -> Vec<Violation> {
    let mut violations = Vec::new();
    not_null(&mut violations, Table::Content, "content_id", rows, |r| r.content_id.is_some());
    not_null(&mut violations, Table::Content, "title", rows, |r| r.title.is_some());
    unique(
        &mut violations,
        Table::Content,
        "content_id",
        rows.iter().filter_map(|r| r.content_id.as_deref()),
    );
    violations
}

pub fn validate_movies(rows: &[MovieRow]) -> Vec<Violation> {
    let mut violations = Vec::new();
    not_null(&mut violations, Table::Movies, "content_id", rows, |r| r.content_id.is_some());
    violations
}

pub fn validate_series(rows: &[SeriesRow]) -> Vec<Violation> {
    let mut violations = Vec::new();
    not_null(&mut violations, Table::Series, "content_id", rows, |r| r.content_id.is_some());
    not_null(&mut violations, Table::Series, "episodes_per_season", rows, |r| {
        r.episodes_per_season.is_some()
    });
    violations
}

/// Run every table's rules, content first, then movies, then series
pub fn validate_all(tables: &NormalizedTables) -> Vec<Violation> {
    let mut violations = validate_content(&tables.content);
    violations.extend(validate_movies(&tables.movies));
    violations.extend(validate_series(&tables.series));
    violations
}

fn not_null<R>(
    violations: &mut Vec<Violation>,
    table: Table,
    column: &'static str,
    rows: &[R],
    present: impl Fn(&R) -> bool,
) {
    let missing = rows.iter().filter(|row| !present(row)).count();
    if missing > 0 {
        violations.push(Violation {
            table,
            column,
            kind: ViolationKind::MissingValues { rows: missing },
        });
    }
}

fn unique<'a>(
    violations: &mut Vec<Violation>,
    table: Table,
    column: &'static str,
    values: impl Iterator<Item = &'a str>,
) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();

    for value in values {
        if !seen.insert(value) && reported.insert(value) {
            duplicates.push(value.to_string());
        }
    }

    if !duplicates.is_empty() {
        violations.push(Violation {
            table,
            column,
            kind: ViolationKind::DuplicateValues { values: duplicates },
        });
    }
}

//! Record types flowing between pipeline phases
//!
//! Every table the pipeline builds or loads is a `Vec` of one of the row
//! structs below. Cells that a heterogeneous catalog may leave empty are
//! `Option`s so the validator can see them as nulls.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Logical tables known to the pipeline and the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Users,
    Content,
    Sessions,
    Movies,
    Series,
}

impl Table {
    /// Name of the table in the store
    pub fn as_str(self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Content => "content",
            Table::Sessions => "viewing_sessions",
            Table::Movies => "movies",
            Table::Series => "series",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row type that maps one-to-one onto a store table.
///
/// `COLUMNS` lists the columns in the same order as the struct's fields, which
/// is also the order they are serialized in.
pub trait TableRow: Serialize {
    const TABLE: Table;
    const COLUMNS: &'static [&'static str];
}

/// Discriminates movies from series in the content table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    Movie,
    Series,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Movie => "Movie",
            ContentType::Series => "Series",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One catalog item exactly as it appears in the source document
pub type CatalogItem = Map<String, Value>;

/// The nested content catalog: a `movies` group and a `series` group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCatalog {
    pub movies: Vec<CatalogItem>,
    pub series: Vec<CatalogItem>,
}

impl RawCatalog {
    pub fn item_count(&self) -> usize {
        self.movies.len() + self.series.len()
    }
}

// ============================================================================
// Normalized catalog tables
// ============================================================================

/// Attributes shared by movies and series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRow {
    pub content_id: Option<String>,
    pub title: Option<String>,
    pub content_type: ContentType,
    /// Encoded genre list, e.g. `["Drama", "Crime"]`
    pub genre: Option<String>,
    pub rating: Option<f64>,
    pub production_budget: Option<f64>,
}

impl TableRow for ContentRow {
    const TABLE: Table = Table::Content;
    const COLUMNS: &'static [&'static str] = &[
        "content_id",
        "title",
        "content_type",
        "genre",
        "rating",
        "production_budget",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRow {
    pub content_id: Option<String>,
    pub duration_minutes: Option<i64>,
    pub views_count: Option<f64>,
    pub release_year: Option<i32>,
}

impl TableRow for MovieRow {
    const TABLE: Table = Table::Movies;
    const COLUMNS: &'static [&'static str] =
        &["content_id", "duration_minutes", "views_count", "release_year"];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRow {
    pub content_id: Option<String>,
    pub avg_episode_duration: Option<i64>,
    /// Encoded per-season episode counts, e.g. `[10, 8]`
    pub episodes_per_season: Option<String>,
    pub total_views: Option<f64>,
}

impl TableRow for SeriesRow {
    const TABLE: Table = Table::Series;
    const COLUMNS: &'static [&'static str] = &[
        "content_id",
        "avg_episode_duration",
        "episodes_per_season",
        "total_views",
    ];
}

/// The three tables produced from one catalog
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedTables {
    pub content: Vec<ContentRow>,
    pub movies: Vec<MovieRow>,
    pub series: Vec<SeriesRow>,
}

impl NormalizedTables {
    pub fn row_count(&self) -> usize {
        self.content.len() + self.movies.len() + self.series.len()
    }
}

// ============================================================================
// Flat source tables
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub age: i32,
    pub country: String,
    pub subscription_type: String,
    pub registration_date: NaiveDate,
    pub total_watch_time_hours: f64,
}

impl TableRow for UserRecord {
    const TABLE: Table = Table::Users;
    const COLUMNS: &'static [&'static str] = &[
        "user_id",
        "age",
        "country",
        "subscription_type",
        "registration_date",
        "total_watch_time_hours",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub user_id: String,
    pub content_id: String,
    pub watch_date: NaiveDate,
    pub watch_duration_minutes: f64,
    pub completion_percentage: f64,
    pub device_type: String,
    pub quality_level: String,
}

impl TableRow for SessionRecord {
    const TABLE: Table = Table::Sessions;
    const COLUMNS: &'static [&'static str] = &[
        "session_id",
        "user_id",
        "content_id",
        "watch_date",
        "watch_duration_minutes",
        "completion_percentage",
        "device_type",
        "quality_level",
    ];
}

/// One catalog item flattened into a single content listing row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatContentRow {
    pub content_id: String,
    pub title: String,
    pub content_type: ContentType,
    pub genre: String,
    pub release_year: i32,
    pub rating: f64,
    pub production_budget: f64,
    pub views_count: f64,
}

impl TableRow for FlatContentRow {
    const TABLE: Table = Table::Content;
    const COLUMNS: &'static [&'static str] = &[
        "content_id",
        "title",
        "content_type",
        "genre",
        "release_year",
        "rating",
        "production_budget",
        "views_count",
    ];
}

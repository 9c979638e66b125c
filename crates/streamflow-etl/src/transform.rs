//! Shape transformer
//!
//! Splits the nested catalog into the content, movies and series tables.
//! Shared attributes of every item go to `content` (movies first, then
//! series, each in source order); type-specific attributes go to `movies` or
//! `series`. Nested fields are stored in their encoded text form.
//!
//! A column counts as present for a group when at least one item carries the
//! key. A column missing from every item of a non-empty group is a schema
//! error; a key that is missing or `null` on individual items becomes a null
//! cell and is left for the validator to judge.

use serde_json::Value;
use tracing::info;

use crate::codec::encode_nested;
use crate::error::{EtlError, Result};
use crate::models::{
    CatalogItem, ContentRow, ContentType, MovieRow, NormalizedTables, RawCatalog, SeriesRow, Table,
};

const SHARED_COLUMNS: &[&str] = &["content_id", "title", "genre", "rating", "production_budget"];
const MOVIE_COLUMNS: &[&str] = &["content_id", "duration_minutes", "views_count", "release_year"];
const SERIES_COLUMNS: &[&str] = &[
    "content_id",
    "avg_episode_duration",
    "episodes_per_season",
    "total_views",
];

/// One source group of the catalog
pub(crate) struct Group<'a> {
    pub name: &'static str,
    pub content_type: ContentType,
    pub items: &'a [CatalogItem],
}

impl<'a> Group<'a> {
    pub fn movies(catalog: &'a RawCatalog) -> Self {
        Self {
            name: "movies",
            content_type: ContentType::Movie,
            items: &catalog.movies,
        }
    }

    pub fn series(catalog: &'a RawCatalog) -> Self {
        Self {
            name: "series",
            content_type: ContentType::Series,
            items: &catalog.series,
        }
    }

    pub fn require_columns(&self, table: Table, columns: &[&str]) -> Result<()> {
        if self.items.is_empty() {
            return Ok(());
        }
        for column in columns {
            if !self.items.iter().any(|item| item.contains_key(*column)) {
                return Err(EtlError::TransformSchema {
                    table,
                    column: column.to_string(),
                    detail: format!("column missing from every item in the '{}' group", self.name),
                });
            }
        }
        Ok(())
    }
}

/// Build the three normalized tables from a catalog
pub fn transform(catalog: &RawCatalog) -> Result<NormalizedTables> {
    let movies = Group::movies(catalog);
    let series = Group::series(catalog);

    movies.require_columns(Table::Content, SHARED_COLUMNS)?;
    series.require_columns(Table::Content, SHARED_COLUMNS)?;
    movies.require_columns(Table::Movies, MOVIE_COLUMNS)?;
    series.require_columns(Table::Series, SERIES_COLUMNS)?;

    let mut content = Vec::with_capacity(catalog.item_count());
    for group in [&movies, &series] {
        for item in group.items {
            content.push(content_row(item, group.content_type)?);
        }
    }

    let tables = NormalizedTables {
        content,
        movies: movies.items.iter().map(movie_row).collect::<Result<_>>()?,
        series: series.items.iter().map(series_row).collect::<Result<_>>()?,
    };

    info!(
        content = tables.content.len(),
        movies = tables.movies.len(),
        series = tables.series.len(),
        "Catalog normalized"
    );

    Ok(tables)
}

fn content_row(item: &CatalogItem, content_type: ContentType) -> Result<ContentRow> {
    let table = Table::Content;
    Ok(ContentRow {
        content_id: text_cell(item, table, "content_id")?,
        title: text_cell(item, table, "title")?,
        content_type,
        genre: nested_cell(item, table, "genre")?,
        rating: float_cell(item, table, "rating")?,
        production_budget: float_cell(item, table, "production_budget")?,
    })
}

fn movie_row(item: &CatalogItem) -> Result<MovieRow> {
    let table = Table::Movies;
    Ok(MovieRow {
        content_id: text_cell(item, table, "content_id")?,
        duration_minutes: int_cell(item, table, "duration_minutes")?,
        views_count: float_cell(item, table, "views_count")?,
        release_year: year_cell(item, table, "release_year")?,
    })
}

fn series_row(item: &CatalogItem) -> Result<SeriesRow> {
    let table = Table::Series;
    Ok(SeriesRow {
        content_id: text_cell(item, table, "content_id")?,
        avg_episode_duration: int_cell(item, table, "avg_episode_duration")?,
        episodes_per_season: nested_cell(item, table, "episodes_per_season")?,
        total_views: float_cell(item, table, "total_views")?,
    })
}

// ============================================================================
// Cell extraction
// ============================================================================

fn cell<'a>(item: &'a CatalogItem, column: &str) -> Option<&'a Value> {
    item.get(column).filter(|value| !value.is_null())
}

pub(crate) fn text_cell(item: &CatalogItem, table: Table, column: &str) -> Result<Option<String>> {
    match cell(item, column) {
        None => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(other) => Err(type_error(item, table, column, "a string", other)),
    }
}

pub(crate) fn float_cell(item: &CatalogItem, table: Table, column: &str) -> Result<Option<f64>> {
    match cell(item, column) {
        None => Ok(None),
        Some(value @ Value::Number(number)) => match number.as_f64() {
            Some(float) => Ok(Some(float)),
            None => Err(type_error(item, table, column, "a finite number", value)),
        },
        Some(other) => Err(type_error(item, table, column, "a number", other)),
    }
}

/// Whole numbers written as `100` or `100.0` are both accepted
pub(crate) fn int_cell(item: &CatalogItem, table: Table, column: &str) -> Result<Option<i64>> {
    match cell(item, column) {
        None => Ok(None),
        Some(value @ Value::Number(number)) => {
            if let Some(whole) = number.as_i64() {
                return Ok(Some(whole));
            }
            match number.as_f64() {
                Some(float) if float.fract() == 0.0 && float.abs() < i64::MAX as f64 => {
                    Ok(Some(float as i64))
                },
                _ => Err(type_error(item, table, column, "a whole number", value)),
            }
        },
        Some(other) => Err(type_error(item, table, column, "a whole number", other)),
    }
}

pub(crate) fn year_cell(item: &CatalogItem, table: Table, column: &str) -> Result<Option<i32>> {
    match int_cell(item, table, column)? {
        None => Ok(None),
        Some(year) => i32::try_from(year).map(Some).map_err(|_| {
            type_error(item, table, column, "a calendar year", &Value::from(year))
        }),
    }
}

pub(crate) fn nested_cell(
    item: &CatalogItem,
    table: Table,
    column: &str,
) -> Result<Option<String>> {
    cell(item, column)
        .map(|value| {
            encode_nested(value).map_err(|e| EtlError::TransformSchema {
                table,
                column: column.to_string(),
                detail: format!("cannot encode value in item {}: {}", item_label(item), e),
            })
        })
        .transpose()
}

pub(crate) fn item_label(item: &CatalogItem) -> String {
    match item.get("content_id") {
        Some(Value::String(id)) => id.clone(),
        Some(other) if !other.is_null() => other.to_string(),
        _ => "<no content_id>".to_string(),
    }
}

fn type_error(
    item: &CatalogItem,
    table: Table,
    column: &str,
    expected: &str,
    found: &Value,
) -> EtlError {
    EtlError::TransformSchema {
        table,
        column: column.to_string(),
        detail: format!(
            "expected {}, found {} in item {}",
            expected,
            json_type(found),
            item_label(item)
        ),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

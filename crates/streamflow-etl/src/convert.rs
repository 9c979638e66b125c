//! Flat-file conversion tools
//!
//! Round-trips the flat user and session tables between CSV and JSON-lines,
//! and flattens the nested catalog into a single content listing. The
//! pipeline uses the CSV to JSON-lines direction to leave a JSON-lines copy
//! of each flat source next to the raw data; the CLI exposes all three.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{EtlError, Result};
use crate::extract::read_table;
use crate::models::{CatalogItem, ContentType, FlatContentRow, RawCatalog, Table, TableRow};
use crate::snapshot::write_csv;
use crate::transform::{float_cell, item_label, nested_cell, text_cell, year_cell, Group};

/// Release year assigned to series that do not carry one
pub const FALLBACK_RELEASE_YEAR: i32 = 2020;

/// Write records as JSON-lines, creating the parent directory if needed
pub fn write_json_lines<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| EtlError::snapshot(parent, e))?;
    }
    serde_jsonlines::write_json_lines(path, rows).map_err(|e| EtlError::snapshot(path, e))
}

/// Convert a CSV table to JSON-lines, returning the number of records
pub fn csv_to_json_lines<T>(input: &Path, output: &Path) -> Result<usize>
where
    T: TableRow + DeserializeOwned,
{
    let rows: Vec<T> = read_table(input)?;
    write_json_lines(output, &rows)?;

    info!(
        input = %input.display(),
        output = %output.display(),
        records = rows.len(),
        "Converted CSV to JSON lines"
    );
    Ok(rows.len())
}

/// Convert a JSON-lines file back to CSV, returning the number of records
pub fn json_lines_to_csv<T>(input: &Path, output: &Path) -> Result<usize>
where
    T: TableRow + DeserializeOwned,
{
    if !input.is_file() {
        return Err(EtlError::SourceNotFound {
            path: input.to_path_buf(),
        });
    }

    let rows = serde_jsonlines::json_lines(input)
        .map_err(|e| EtlError::malformed(input, e))?
        .collect::<std::io::Result<Vec<T>>>()
        .map_err(|e| EtlError::malformed(input, e))?;
    write_csv(output, &rows)?;

    info!(
        input = %input.display(),
        output = %output.display(),
        records = rows.len(),
        "Converted JSON lines to CSV"
    );
    Ok(rows.len())
}

/// One listing row per catalog item, movies first
///
/// Unlike the normalized tables this listing has no nulls: an item missing
/// any listed field is rejected with a schema error.
pub fn flatten_catalog(catalog: &RawCatalog) -> Result<Vec<FlatContentRow>> {
    let mut rows = Vec::with_capacity(catalog.item_count());
    for group in [Group::movies(catalog), Group::series(catalog)] {
        for item in group.items {
            rows.push(flat_row(item, group.content_type)?);
        }
    }
    Ok(rows)
}

/// Flatten the catalog and write it as CSV
pub fn write_flat_catalog(catalog: &RawCatalog, output: &Path) -> Result<usize> {
    let rows = flatten_catalog(catalog)?;
    write_csv(output, &rows)?;
    info!(output = %output.display(), rows = rows.len(), "Flattened content catalog");
    Ok(rows.len())
}

fn flat_row(item: &CatalogItem, content_type: ContentType) -> Result<FlatContentRow> {
    let table = Table::Content;
    let (release_year, views_count) = match content_type {
        ContentType::Movie => (
            required(item, "release_year", year_cell(item, table, "release_year")?)?,
            required(item, "views_count", float_cell(item, table, "views_count")?)?,
        ),
        ContentType::Series => (
            year_cell(item, table, "release_year")?.unwrap_or(FALLBACK_RELEASE_YEAR),
            required(item, "total_views", float_cell(item, table, "total_views")?)?,
        ),
    };

    Ok(FlatContentRow {
        content_id: required(item, "content_id", text_cell(item, table, "content_id")?)?,
        title: required(item, "title", text_cell(item, table, "title")?)?,
        content_type,
        genre: required(item, "genre", nested_cell(item, table, "genre")?)?,
        release_year,
        rating: required(item, "rating", float_cell(item, table, "rating")?)?,
        production_budget: required(
            item,
            "production_budget",
            float_cell(item, table, "production_budget")?,
        )?,
        views_count,
    })
}

fn required<T>(item: &CatalogItem, column: &str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| EtlError::TransformSchema {
        table: Table::Content,
        column: column.to_string(),
        detail: format!("missing in item {}", item_label(item)),
    })
}

//! Source readers
//!
//! Load the nested catalog and the flat CSV tables into memory. Files are
//! checked for existence up front so a missing input is reported as
//! [`EtlError::SourceNotFound`] rather than a generic IO failure.

use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{EtlError, Result};
use crate::models::{RawCatalog, TableRow};

/// Read the nested content catalog (`{"movies": [...], "series": [...]}`)
pub fn read_catalog(path: impl AsRef<Path>) -> Result<RawCatalog> {
    let path = path.as_ref();
    ensure_exists(path)?;

    let file = File::open(path).map_err(|e| EtlError::malformed(path, e))?;
    let catalog: RawCatalog = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| EtlError::malformed(path, format!("invalid catalog document: {}", e)))?;

    info!(
        path = %path.display(),
        movies = catalog.movies.len(),
        series = catalog.series.len(),
        "Extracted content catalog"
    );

    Ok(catalog)
}

/// Read a flat CSV table with a header row into typed records
///
/// The header must name every column of `T`, the table must be rectangular
/// and every cell must parse into the column's type; otherwise the whole read
/// fails with `SourceMalformed`.
pub fn read_table<T>(path: impl AsRef<Path>) -> Result<Vec<T>>
where
    T: TableRow + DeserializeOwned,
{
    let path = path.as_ref();
    ensure_exists(path)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| EtlError::malformed(path, e))?;
    check_header::<T>(path, reader.headers().map_err(|e| EtlError::malformed(path, e))?)?;

    let mut rows = Vec::new();
    for record in reader.deserialize() {
        let row: T = record.map_err(|e| EtlError::malformed(path, e))?;
        rows.push(row);
    }

    info!(path = %path.display(), rows = rows.len(), "Extracted flat table");
    Ok(rows)
}

fn check_header<T: TableRow>(path: &Path, header: &csv::StringRecord) -> Result<()> {
    if header.iter().all(str::is_empty) {
        return Err(EtlError::malformed(path, "missing header row"));
    }

    let missing: Vec<&str> = T::COLUMNS
        .iter()
        .copied()
        .filter(|column| !header.iter().any(|name| name == *column))
        .collect();
    if !missing.is_empty() {
        return Err(EtlError::malformed(
            path,
            format!("header is missing column(s): {}", missing.join(", ")),
        ));
    }
    Ok(())
}

fn ensure_exists(path: &Path) -> Result<()> {
    if !path.is_file() {
        debug!(path = %path.display(), "Source file missing");
        return Err(EtlError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

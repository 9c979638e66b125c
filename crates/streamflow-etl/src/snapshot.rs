//! Intermediate snapshots of the normalized tables
//!
//! Each table is written to `processed_<table>.csv` in the snapshot
//! directory before validation, so a failed run still leaves the reshaped
//! data behind for inspection. Nested fields appear in their encoded form.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{EtlError, Result};
use crate::models::{NormalizedTables, TableRow};

/// Write one table as CSV; the header row is written even when `rows` is empty
pub fn write_table_snapshot<T: TableRow>(dir: &Path, rows: &[T]) -> Result<PathBuf> {
    let path = dir.join(format!("processed_{}.csv", T::TABLE.as_str()));
    write_csv(&path, rows)?;
    debug!(path = %path.display(), rows = rows.len(), "Snapshot written");
    Ok(path)
}

/// Write content, movies and series snapshots, in that order
pub fn write_snapshots(dir: &Path, tables: &NormalizedTables) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| EtlError::snapshot(dir, e))?;

    let paths = vec![
        write_table_snapshot(dir, &tables.content)?,
        write_table_snapshot(dir, &tables.movies)?,
        write_table_snapshot(dir, &tables.series)?,
    ];

    info!(dir = %dir.display(), files = paths.len(), "Snapshots written");
    Ok(paths)
}

pub(crate) fn write_csv<T: TableRow>(path: &Path, rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| EtlError::snapshot(parent, e))?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| EtlError::snapshot(path, e))?;

    writer
        .write_record(T::COLUMNS)
        .map_err(|e| EtlError::snapshot(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| EtlError::snapshot(path, e))?;
    }
    writer.flush().map_err(|e| EtlError::snapshot(path, e))?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::models::{ContentRow, ContentType, MovieRow, SeriesRow};
    use tempfile::TempDir;

    fn tables() -> NormalizedTables {
        NormalizedTables {
            content: vec![ContentRow {
                content_id: Some("s1".to_string()),
                title: None,
                content_type: ContentType::Series,
                genre: Some(r#"["Comedy", "Drama"]"#.to_string()),
                rating: Some(8.0),
                production_budget: None,
            }],
            movies: Vec::<MovieRow>::new(),
            series: vec![SeriesRow {
                content_id: Some("s1".to_string()),
                avg_episode_duration: Some(25),
                episodes_per_season: Some("[10, 8]".to_string()),
                total_views: Some(9999.0),
            }],
        }
    }

    #[test]
    fn test_write_snapshots() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("processed");

        let paths = write_snapshots(&out, &tables()).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["processed_content.csv", "processed_movies.csv", "processed_series.csv"]
        );

        let content = fs::read_to_string(&paths[0]).unwrap();
        assert_eq!(
            content,
            "content_id,title,content_type,genre,rating,production_budget\n\
             s1,,Series,\"[\"\"Comedy\"\", \"\"Drama\"\"]\",8.0,\n"
        );

        let movies = fs::read_to_string(&paths[1]).unwrap();
        assert_eq!(movies, "content_id,duration_minutes,views_count,release_year\n");

        let series = fs::read_to_string(&paths[2]).unwrap();
        assert!(series.contains("s1,25,\"[10, 8]\",9999.0"));
    }
}

//! Read-back validation of written Parquet files

use crate::error::{PipeError, Result};
use crate::parquet::reader::ParquetReader;
use crate::parquet::writer::PARQUET_EXTENSION;
use std::fmt;
use std::path::{Path, PathBuf};

/// Number of rows kept in [`SchemaSummary::preview`]
pub const PREVIEW_ROWS: usize = 5;

/// What a persisted file looks like when read back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSummary {
    pub path: PathBuf,
    pub row_count: usize,
    pub column_count: usize,
    pub column_names: Vec<String>,
    /// Declared Arrow type per column, e.g. `Int64`, `Utf8`
    pub column_types: Vec<String>,
    /// First rows rendered as strings
    pub preview: Vec<Vec<String>>,
}

impl fmt::Display for SchemaSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let columns: Vec<String> = self
            .column_names
            .iter()
            .zip(&self.column_types)
            .map(|(name, ty)| format!("{}: {}", name, ty))
            .collect();
        write!(
            f,
            "{} rows={} columns={} schema=[{}]",
            self.path.display(),
            self.row_count,
            self.column_count,
            columns.join(", ")
        )
    }
}

/// Re-read a Parquet file and summarize its schema
///
/// Read-only. Fails with [`PipeError::NotFound`] if `path` does not exist
/// and [`PipeError::Read`] if it is not a readable Parquet file.
pub fn validate<P: AsRef<Path>>(path: P) -> Result<SchemaSummary> {
    let reader = ParquetReader::open(path)?;

    let preview = reader
        .rows()?
        .take(PREVIEW_ROWS)
        .collect::<Result<Vec<_>>>()?;

    Ok(SchemaSummary {
        path: reader.path().to_path_buf(),
        row_count: reader.row_count(),
        column_count: reader.schema().fields().len(),
        column_names: reader.column_names(),
        column_types: reader.column_types(),
        preview,
    })
}

/// Validate every `*.parquet` file directly inside `dir`, in name order
pub fn validate_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<(PathBuf, Result<SchemaSummary>)>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(PipeError::NotFound(dir.to_path_buf()));
    }

    let dir_str = dir.to_str().ok_or_else(|| {
        PipeError::InvalidState(format!("non UTF-8 directory path: {}", dir.display()))
    })?;
    let pattern = format!(
        "{}/*.{}",
        glob::Pattern::escape(dir_str),
        PARQUET_EXTENSION
    );

    let paths = glob::glob(&pattern)
        .map_err(|e| PipeError::InvalidState(format!("bad glob pattern '{}': {}", pattern, e)))?;

    let mut results = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| PipeError::Io(e.into()))?;
        let summary = validate(&path);
        results.push((path, summary));
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parquet::writer::write;
    use crate::types::{CellValue, Table};
    use tempfile::TempDir;

    fn table(rows: usize) -> Table {
        let data = (0..rows)
            .map(|i| vec![CellValue::Int(i as i64), CellValue::from(format!("r{}", i))])
            .collect();
        Table::from_rows(vec!["id".into(), "label".into()], data)
    }

    #[test]
    fn test_round_trip_counts_and_types() {
        let dir = TempDir::new().unwrap();
        let source = table(12);
        write(&source, "t", dir.path(), "snappy", true).unwrap();

        let summary = validate(dir.path().join("t.parquet")).unwrap();
        assert_eq!(summary.row_count, source.row_count());
        assert_eq!(summary.column_count, source.column_count());
        assert_eq!(summary.column_names, vec!["id", "label"]);
        assert_eq!(summary.column_types, vec!["Int64", "Utf8"]);
        assert_eq!(summary.preview.len(), PREVIEW_ROWS);
        assert_eq!(summary.preview[1], vec!["1", "r1"]);
    }

    #[test]
    fn test_zero_row_file() {
        let dir = TempDir::new().unwrap();
        write(&table(0), "empty", dir.path(), "zstd", true).unwrap();

        let summary = validate(dir.path().join("empty.parquet")).unwrap();
        assert_eq!(summary.row_count, 0);
        assert_eq!(summary.column_count, 2);
        assert!(summary.preview.is_empty());
    }

    #[test]
    fn test_missing_and_corrupt_files() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.parquet");
        assert!(matches!(validate(&missing), Err(PipeError::NotFound(p)) if p == missing));

        let corrupt = dir.path().join("corrupt.parquet");
        std::fs::write(&corrupt, b"definitely not parquet").unwrap();
        assert!(matches!(validate(&corrupt), Err(PipeError::Read { .. })));
    }

    #[test]
    fn test_validate_dir_only_parquet_files() {
        let dir = TempDir::new().unwrap();
        write(&table(1), "b", dir.path(), "snappy", true).unwrap();
        write(&table(2), "a", dir.path(), "snappy", true).unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let results = validate_dir(dir.path()).unwrap();
        let names: Vec<_> = results
            .iter()
            .map(|(p, _)| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.parquet", "b.parquet"]);
        assert_eq!(results[0].1.as_ref().unwrap().row_count, 2);
    }
}

//! Parquet writer for in-memory tables

use crate::error::{PipeError, Result};
use crate::types::{CellValue, Column, ColumnType, Table};
use arrow::array::{
    ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::basic::{BrotliLevel, Compression, GzipLevel, ZstdLevel};
use parquet::errors::ParquetError;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File extension of every output file
pub const PARQUET_EXTENSION: &str = "parquet";

/// Result of a write request that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Table written to `path`
    Persisted { path: PathBuf, row_count: usize },
    /// `path` already existed and overwrite was disabled; nothing written
    SkippedExists(PathBuf),
}

impl WriteOutcome {
    pub fn path(&self) -> &Path {
        match self {
            WriteOutcome::Persisted { path, .. } | WriteOutcome::SkippedExists(path) => path,
        }
    }
}

/// `output_dir/<identifier>.parquet`
pub fn output_path(output_dir: &Path, identifier: &str) -> PathBuf {
    output_dir.join(format!("{}.{}", identifier, PARQUET_EXTENSION))
}

/// Parse a compression name such as `snappy`, `gzip`, `gzip(6)`, `zstd` or `none`
///
/// Case-insensitive. `gzip`, `zstd` and `brotli` without a level use the
/// codec's default level.
pub fn parse_compression(name: &str) -> std::result::Result<Compression, ParquetError> {
    let normalized = name.trim().to_ascii_uppercase();
    match normalized.as_str() {
        "NONE" => Ok(Compression::UNCOMPRESSED),
        "GZIP" => Ok(Compression::GZIP(GzipLevel::default())),
        "ZSTD" => Ok(Compression::ZSTD(ZstdLevel::default())),
        "BROTLI" => Ok(Compression::BROTLI(BrotliLevel::default())),
        other => other.parse::<Compression>(),
    }
}

/// Write `table` to `output_dir/<identifier>.parquet`
///
/// The output directory is created if missing. An existing file is left
/// untouched when `overwrite` is false. Codec failures come back as
/// [`PipeError::Write`] naming the target path; nothing is retried.
///
/// # Example
///
/// ```no_run
/// use sheetpipe::parquet::{write, WriteOutcome};
/// use sheetpipe::types::Table;
/// use std::path::Path;
///
/// let outcome = write(&Table::default(), "empty", Path::new("out"), "zstd", false)?;
/// println!("{}", outcome.path().display());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn write(
    table: &Table,
    identifier: &str,
    output_dir: &Path,
    compression: &str,
    overwrite: bool,
) -> Result<WriteOutcome> {
    std::fs::create_dir_all(output_dir).map_err(|e| PipeError::Write {
        path: output_dir.to_path_buf(),
        message: format!("failed to create output directory: {}", e),
    })?;

    let path = output_path(output_dir, identifier);
    if path.exists() && !overwrite {
        return Ok(WriteOutcome::SkippedExists(path));
    }

    write_table(table, &path, compression).map_err(|message| PipeError::Write {
        path: path.clone(),
        message,
    })?;

    Ok(WriteOutcome::Persisted {
        path,
        row_count: table.row_count(),
    })
}

fn write_table(table: &Table, path: &Path, compression: &str) -> std::result::Result<(), String> {
    let compression = parse_compression(compression)
        .map_err(|e| format!("unsupported compression '{}': {}", compression, e))?;

    let batch = to_record_batch(table)?;

    let file = File::create(path).map_err(|e| e.to_string())?;
    let props = WriterProperties::builder()
        .set_compression(compression)
        .build();
    let mut writer =
        ArrowWriter::try_new(file, batch.schema(), Some(props)).map_err(|e| e.to_string())?;

    if batch.num_rows() > 0 {
        writer.write(&batch).map_err(|e| e.to_string())?;
    }

    writer.close().map_err(|e| e.to_string())?;
    Ok(())
}

/// Convert a table into a single Arrow record batch
pub fn to_record_batch(table: &Table) -> std::result::Result<RecordBatch, String> {
    let mut fields: Vec<Field> = Vec::with_capacity(table.column_count());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.column_count());

    for column in table.columns() {
        let column_type = column.inferred_type();
        fields.push(Field::new(&column.name, arrow_type(column_type), true));
        arrays.push(column_to_array(column, column_type));
    }

    let schema = Arc::new(Schema::new(fields));
    let options = RecordBatchOptions::new().with_row_count(Some(table.row_count()));

    RecordBatch::try_new_with_options(schema, arrays, &options).map_err(|e| e.to_string())
}

fn arrow_type(column_type: ColumnType) -> DataType {
    match column_type {
        ColumnType::Boolean => DataType::Boolean,
        ColumnType::Int64 => DataType::Int64,
        ColumnType::Float64 => DataType::Float64,
        ColumnType::Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
        ColumnType::Utf8 => DataType::Utf8,
    }
}

fn column_to_array(column: &Column, column_type: ColumnType) -> ArrayRef {
    let values = &column.values;
    match column_type {
        ColumnType::Boolean => Arc::new(BooleanArray::from(
            values.iter().map(CellValue::as_bool).collect::<Vec<_>>(),
        )),
        ColumnType::Int64 => Arc::new(Int64Array::from(
            values.iter().map(CellValue::as_i64).collect::<Vec<_>>(),
        )),
        ColumnType::Float64 => Arc::new(Float64Array::from(
            values.iter().map(CellValue::as_f64).collect::<Vec<_>>(),
        )),
        ColumnType::Timestamp => Arc::new(TimestampMicrosecondArray::from(
            values
                .iter()
                .map(|v| v.as_datetime().map(|dt| dt.and_utc().timestamp_micros()))
                .collect::<Vec<_>>(),
        )),
        ColumnType::Utf8 => Arc::new(StringArray::from(
            values
                .iter()
                .map(|v| (!v.is_empty()).then(|| v.as_string()))
                .collect::<Vec<Option<String>>>(),
        )),
    }
}

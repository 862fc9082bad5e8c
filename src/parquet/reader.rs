//! Parquet file reader with row-by-row access

use crate::error::{PipeError, Result};
use crate::types::DATETIME_FORMAT;
use arrow::array::*;
use arrow::datatypes::*;
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Parquet file reader that exposes schema metadata and string rows
///
/// # Example
///
/// ```no_run
/// use sheetpipe::parquet::ParquetReader;
///
/// let reader = ParquetReader::open("out/summary.parquet")?;
/// println!("{:?}", reader.column_names());
///
/// for row in reader.rows()?.take(5) {
///     println!("{:?}", row?);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ParquetReader {
    path: PathBuf,
    schema: SchemaRef,
    row_count: usize,
}

impl ParquetReader {
    /// Open a Parquet file and read its footer
    ///
    /// Fails with [`PipeError::NotFound`] when the file does not exist and
    /// [`PipeError::Read`] when it cannot be decoded.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(PipeError::NotFound(path));
        }

        let builder = Self::builder(&path)?;
        let schema = builder.schema().clone();
        let row_count = builder
            .metadata()
            .file_metadata()
            .num_rows()
            .try_into()
            .unwrap_or(0);

        Ok(Self {
            path,
            schema,
            row_count,
        })
    }

    fn builder(path: &Path) -> Result<ParquetRecordBatchReaderBuilder<File>> {
        let file = File::open(path)?;
        ParquetRecordBatchReaderBuilder::try_new(file).map_err(|e| PipeError::Read {
            path: path.to_path_buf(),
            message: format!("failed to open Parquet file: {}", e),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get column names from the Parquet schema
    pub fn column_names(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Get declared column types from the Parquet schema
    pub fn column_types(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .map(|f| type_name(f.data_type()))
            .collect()
    }

    /// Get the Arrow schema of the file
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Get total number of rows in the file
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Create an iterator over rows rendered as strings
    ///
    /// Nulls render as empty strings.
    pub fn rows(&self) -> Result<ParquetRowIterator> {
        let reader = Self::builder(&self.path)?
            .build()
            .map_err(|e| PipeError::Read {
                path: self.path.clone(),
                message: format!("failed to build reader: {}", e),
            })?;

        Ok(ParquetRowIterator {
            path: self.path.clone(),
            reader: Box::new(reader),
            current_batch: None,
            current_row: 0,
        })
    }
}

/// Short name of an Arrow type as reported in schema summaries
pub fn type_name(data_type: &DataType) -> String {
    match data_type {
        DataType::Boolean => "Boolean".to_string(),
        DataType::Int32 => "Int32".to_string(),
        DataType::Int64 => "Int64".to_string(),
        DataType::Float32 => "Float32".to_string(),
        DataType::Float64 => "Float64".to_string(),
        DataType::Utf8 => "Utf8".to_string(),
        DataType::LargeUtf8 => "LargeUtf8".to_string(),
        DataType::Timestamp(unit, _) => format!("Timestamp({:?})", unit),
        other => format!("{:?}", other),
    }
}

/// Iterator over Parquet rows converted to string vectors
pub struct ParquetRowIterator {
    path: PathBuf,
    reader: Box<dyn Iterator<Item = std::result::Result<RecordBatch, ArrowError>>>,
    current_batch: Option<RecordBatch>,
    current_row: usize,
}

impl Iterator for ParquetRowIterator {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(ref batch) = self.current_batch {
                if self.current_row < batch.num_rows() {
                    let row = self.extract_row(batch, self.current_row);
                    self.current_row += 1;
                    return Some(row);
                }
            }

            match self.reader.next() {
                Some(Ok(batch)) => {
                    self.current_batch = Some(batch);
                    self.current_row = 0;
                }
                Some(Err(e)) => {
                    return Some(Err(PipeError::Read {
                        path: self.path.clone(),
                        message: format!("failed to read batch: {}", e),
                    }))
                }
                None => return None,
            }
        }
    }
}

impl ParquetRowIterator {
    fn extract_row(&self, batch: &RecordBatch, row_idx: usize) -> Result<Vec<String>> {
        batch
            .columns()
            .iter()
            .map(|array| self.array_value_to_string(array, row_idx))
            .collect()
    }

    fn downcast_error(&self, target: &str) -> PipeError {
        PipeError::Read {
            path: self.path.clone(),
            message: format!("failed to downcast to {}", target),
        }
    }

    fn array_value_to_string(&self, array: &ArrayRef, row_idx: usize) -> Result<String> {
        if array.is_null(row_idx) {
            return Ok(String::new());
        }

        let value = match array.data_type() {
            DataType::Utf8 => array
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| self.downcast_error("StringArray"))?
                .value(row_idx)
                .to_string(),
            DataType::LargeUtf8 => array
                .as_any()
                .downcast_ref::<LargeStringArray>()
                .ok_or_else(|| self.downcast_error("LargeStringArray"))?
                .value(row_idx)
                .to_string(),
            DataType::Int32 => array
                .as_any()
                .downcast_ref::<Int32Array>()
                .ok_or_else(|| self.downcast_error("Int32Array"))?
                .value(row_idx)
                .to_string(),
            DataType::Int64 => array
                .as_any()
                .downcast_ref::<Int64Array>()
                .ok_or_else(|| self.downcast_error("Int64Array"))?
                .value(row_idx)
                .to_string(),
            DataType::Float32 => array
                .as_any()
                .downcast_ref::<Float32Array>()
                .ok_or_else(|| self.downcast_error("Float32Array"))?
                .value(row_idx)
                .to_string(),
            DataType::Float64 => array
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| self.downcast_error("Float64Array"))?
                .value(row_idx)
                .to_string(),
            DataType::Boolean => array
                .as_any()
                .downcast_ref::<BooleanArray>()
                .ok_or_else(|| self.downcast_error("BooleanArray"))?
                .value(row_idx)
                .to_string(),
            DataType::Timestamp(TimeUnit::Microsecond, _) => array
                .as_any()
                .downcast_ref::<TimestampMicrosecondArray>()
                .ok_or_else(|| self.downcast_error("TimestampMicrosecondArray"))?
                .value_as_datetime(row_idx)
                .map(|dt| dt.format(DATETIME_FORMAT).to_string())
                .unwrap_or_default(),
            // Fallback for types this crate never writes
            other => format!("<{:?}>", other),
        };

        Ok(value)
    }
}

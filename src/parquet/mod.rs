//! Parquet persistence and read-back
//!
//! # Features
//!
//! - Write one [`Table`](crate::types::Table) per file with a chosen compression
//! - Per-column Arrow types inferred from the cells (bool, int64, float64, utf8)
//! - Read files back as string rows for previews
//! - Schema summaries for validating what was written
//!
//! # Example
//!
//! ```no_run
//! use sheetpipe::parquet::{validate, write, WriteOutcome};
//! use sheetpipe::types::{CellValue, Table};
//! use std::path::Path;
//!
//! let table = Table::from_rows(
//!     vec!["id".into(), "name".into()],
//!     vec![vec![CellValue::Int(1), "Alice".into()]],
//! );
//! let outcome = write(&table, "people", Path::new("out"), "snappy", true)?;
//! if let WriteOutcome::Persisted { path, .. } = outcome {
//!     let summary = validate(&path)?;
//!     assert_eq!(summary.row_count, 1);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod reader;
pub mod validator;
pub mod writer;

pub use reader::ParquetReader;
pub use validator::{validate, validate_dir, SchemaSummary};
pub use writer::{output_path, parse_compression, write, WriteOutcome, PARQUET_EXTENSION};

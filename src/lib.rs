//! # sheetpipe
//!
//! Convert every sheet of an Excel workbook into its own Parquet file.
//!
//! A run is driven by a YAML configuration naming the workbook, which sheets
//! to take and where the output goes. Each selected sheet is decoded into a
//! [`Table`](types::Table), filtered, given a filesystem-safe identifier and
//! written as `<output_dir>/<identifier>.parquet`. Written files can then be
//! read back and summarized.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sheetpipe::{run, Config, RunContext};
//!
//! let config = Config::load("config/settings.yaml")?;
//! let ctx = RunContext::stdout("pipeline");
//! let report = run(&config, &ctx)?;
//!
//! for sheet in &report.sheets {
//!     println!("{}", sheet);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Configuration
//!
//! ```yaml
//! excel_reader:
//!   input_file: data/book.xlsx
//!   sheet_name: null          # all sheets, or a name, or a 0-based index
//!   skip_empty_sheets: true
//! parquet_writer:
//!   output_dir: out
//!   compression: snappy
//!   overwrite: false
//!   sanitize_names: true
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod filter;
pub mod loader;
pub mod parquet;
pub mod pipeline;
pub mod report;
pub mod sanitize;
pub mod selector;
pub mod types;
pub mod workbook;

pub use config::{CollisionPolicy, Config, ReaderConfig, SheetSelection, WriterConfig};
pub use context::{Level, RunContext};
pub use error::{PipeError, Result, SelectionError};
pub use parquet::{validate, validate_dir, SchemaSummary};
pub use pipeline::{run, run_with_workbook};
pub use report::{RunReport, SheetOutcome, SheetReport};
pub use types::{CellValue, Column, ColumnType, SheetRecord, Table};
pub use workbook::{WorkbookSource, XlsxWorkbook};

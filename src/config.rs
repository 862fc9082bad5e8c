//! YAML configuration
//!
//! The document is deserialized into loose `Raw*` structs first, then
//! resolved once into an immutable [`Config`] with defaults applied and the
//! sheet selection turned into a [`SheetSelection`].
//!
//! ```yaml
//! excel_reader:
//!   input_file: data/report.xlsx
//!   sheet_name: Summary        # or an integer position, or omit for all sheets
//!   skip_empty_sheets: true
//! parquet_writer:
//!   output_dir: data/parquet
//!   compression: snappy
//!   overwrite: true
//!   sanitize_names: true
//! ```

use crate::error::{PipeError, Result, SelectionError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/settings.yaml";

/// Default Parquet compression
pub const DEFAULT_COMPRESSION: &str = "snappy";

/// Which sheets of the workbook to process
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SheetSelection {
    /// Every sheet, in workbook order
    #[default]
    All,
    /// A single sheet by its exact name
    ByName(String),
    /// A single sheet by zero-based position
    ByIndex(usize),
}

/// What to do when two sheets sanitize to the same identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Append `_2`, `_3`, ... to later sheets
    #[default]
    Suffix,
    /// Report later sheets as failed
    Fail,
    /// Let later sheets write over earlier ones
    Overwrite,
}

/// Settings for reading the workbook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    pub input_file: PathBuf,
    pub selection: SheetSelection,
    pub skip_empty_sheets: bool,
}

/// Settings for writing Parquet output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    pub output_dir: PathBuf,
    pub compression: String,
    pub overwrite: bool,
    pub sanitize_names: bool,
    pub on_name_collision: CollisionPolicy,
    pub validate_output: bool,
}

impl WriterConfig {
    /// Writer settings with every optional key at its default
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        WriterConfig {
            output_dir: output_dir.into(),
            compression: DEFAULT_COMPRESSION.to_string(),
            overwrite: true,
            sanitize_names: true,
            on_name_collision: CollisionPolicy::default(),
            validate_output: true,
        }
    }
}

/// Fully resolved run configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub reader: ReaderConfig,
    pub writer: WriterConfig,
}

impl Config {
    /// Configuration for `input_file` → `output_dir` with defaults everywhere else
    pub fn new(input_file: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Config {
            reader: ReaderConfig {
                input_file: input_file.into(),
                selection: SheetSelection::All,
                skip_empty_sheets: true,
            },
            writer: WriterConfig::new(output_dir),
        }
    }

    /// Load and resolve a YAML configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PipeError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            PipeError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        Self::from_yaml(&text)
    }

    /// Parse and resolve a YAML configuration document
    pub fn from_yaml(text: &str) -> Result<Self> {
        let raw: RawConfig = if text.trim().is_empty() {
            RawConfig::default()
        } else {
            serde_saphyr::from_str(text)
                .map_err(|e| PipeError::Config(format!("invalid YAML: {}", e)))?
        };

        raw.resolve()
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    excel_reader: Option<RawReader>,
    #[serde(default)]
    parquet_writer: Option<RawWriter>,
}

#[derive(Debug, Default, Deserialize)]
struct RawReader {
    #[serde(default)]
    input_file: Option<String>,
    #[serde(default)]
    sheet_name: Option<RawSheetName>,
    #[serde(default)]
    skip_empty_sheets: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSheetName {
    Index(i64),
    Name(String),
}

#[derive(Debug, Default, Deserialize)]
struct RawWriter {
    #[serde(default)]
    output_dir: Option<String>,
    #[serde(default)]
    compression: Option<String>,
    #[serde(default)]
    overwrite: Option<bool>,
    #[serde(default)]
    sanitize_names: Option<bool>,
    #[serde(default)]
    on_name_collision: Option<CollisionPolicy>,
    #[serde(default)]
    validate_output: Option<bool>,
}

fn required(value: Option<String>, key: &str) -> Result<PathBuf> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(PathBuf::from(v)),
        _ => Err(PipeError::Config(format!(
            "config key '{}' is required but missing",
            key
        ))),
    }
}

impl RawConfig {
    fn resolve(self) -> Result<Config> {
        let reader = self.excel_reader.unwrap_or_default();
        let writer = self.parquet_writer.unwrap_or_default();

        let input_file = required(reader.input_file, "excel_reader.input_file")?;
        let output_dir = required(writer.output_dir, "parquet_writer.output_dir")?;

        let selection = match reader.sheet_name {
            None => SheetSelection::All,
            Some(RawSheetName::Name(name)) => SheetSelection::ByName(name),
            Some(RawSheetName::Index(i)) => {
                let index = usize::try_from(i).map_err(|_| SelectionError::NegativeIndex(i))?;
                SheetSelection::ByIndex(index)
            }
        };

        Ok(Config {
            reader: ReaderConfig {
                input_file,
                selection,
                skip_empty_sheets: reader.skip_empty_sheets.unwrap_or(true),
            },
            writer: WriterConfig {
                output_dir,
                compression: writer
                    .compression
                    .unwrap_or_else(|| DEFAULT_COMPRESSION.to_string()),
                overwrite: writer.overwrite.unwrap_or(true),
                sanitize_names: writer.sanitize_names.unwrap_or(true),
                on_name_collision: writer.on_name_collision.unwrap_or_default(),
                validate_output: writer.validate_output.unwrap_or(true),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "
excel_reader:
  input_file: data/book.xlsx
parquet_writer:
  output_dir: out
";

    #[test]
    fn test_defaults() {
        let config = Config::from_yaml(MINIMAL).unwrap();
        assert_eq!(config, Config::new("data/book.xlsx", "out"));
        assert_eq!(config.writer.compression, "snappy");
        assert!(config.reader.skip_empty_sheets);
        assert!(config.writer.overwrite);
        assert!(config.writer.sanitize_names);
        assert_eq!(config.writer.on_name_collision, CollisionPolicy::Suffix);
    }

    #[test]
    fn test_sheet_name_variants() {
        let by_name = Config::from_yaml(
            "excel_reader:\n  input_file: a.xlsx\n  sheet_name: Summary\nparquet_writer:\n  output_dir: out\n",
        )
        .unwrap();
        assert_eq!(
            by_name.reader.selection,
            SheetSelection::ByName("Summary".to_string())
        );

        let by_index = Config::from_yaml(
            "excel_reader:\n  input_file: a.xlsx\n  sheet_name: 2\nparquet_writer:\n  output_dir: out\n",
        )
        .unwrap();
        assert_eq!(by_index.reader.selection, SheetSelection::ByIndex(2));

        let quoted = Config::from_yaml(
            "excel_reader:\n  input_file: a.xlsx\n  sheet_name: \"2\"\nparquet_writer:\n  output_dir: out\n",
        )
        .unwrap();
        assert_eq!(
            quoted.reader.selection,
            SheetSelection::ByName("2".to_string())
        );
    }

    #[test]
    fn test_negative_index_is_selection_error() {
        let err = Config::from_yaml(
            "excel_reader:\n  input_file: a.xlsx\n  sheet_name: -1\nparquet_writer:\n  output_dir: out\n",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PipeError::Selection(SelectionError::NegativeIndex(-1))
        ));
    }

    #[test]
    fn test_explicit_values() {
        let config = Config::from_yaml(
            "
excel_reader:
  input_file: a.xlsx
  skip_empty_sheets: false
parquet_writer:
  output_dir: out
  compression: zstd
  overwrite: false
  sanitize_names: false
  on_name_collision: fail
  validate_output: false
",
        )
        .unwrap();
        assert!(!config.reader.skip_empty_sheets);
        assert_eq!(config.writer.compression, "zstd");
        assert!(!config.writer.overwrite);
        assert!(!config.writer.sanitize_names);
        assert_eq!(config.writer.on_name_collision, CollisionPolicy::Fail);
        assert!(!config.writer.validate_output);
    }

    #[test]
    fn test_missing_required_keys() {
        let err = Config::from_yaml("parquet_writer:\n  output_dir: out\n").unwrap_err();
        assert!(err.to_string().contains("excel_reader.input_file"));

        let err = Config::from_yaml("excel_reader:\n  input_file: a.xlsx\n").unwrap_err();
        assert!(err.to_string().contains("parquet_writer.output_dir"));

        assert!(matches!(Config::from_yaml(""), Err(PipeError::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, PipeError::Config(_)));
        assert!(err.to_string().contains("does/not/exist.yaml"));
    }
}

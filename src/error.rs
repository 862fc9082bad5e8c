//! Error types for the ingestion pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, PipeError>;

/// Failure while resolving a sheet selection directive
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// Position is past the last sheet of the workbook
    #[error("sheet index {index} out of range: workbook has {sheet_count} sheet(s)")]
    OutOfRange { index: usize, sheet_count: usize },

    /// Position given in the configuration is below zero
    #[error("sheet index {0} out of range: index must not be negative")]
    NegativeIndex(i64),
}

/// Errors raised by the pipeline and its collaborators
///
/// Configuration, selection and workbook-open failures abort a run.
/// Decode, identifier and write failures are attached to the sheet they
/// belong to and never stop the remaining sheets.
#[derive(Error, Debug)]
pub enum PipeError {
    /// Configuration file unreadable, malformed, or missing a required key
    #[error("config error: {0}")]
    Config(String),

    /// Workbook or Parquet file does not exist
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Sheet selection could not be resolved
    #[error("selection error: {0}")]
    Selection(#[from] SelectionError),

    /// Workbook or one of its sheets could not be decoded
    #[error("failed to decode '{source_name}': {message}")]
    Decode {
        source_name: String,
        message: String,
    },

    /// Every selected sheet was empty or failed to load
    #[error(
        "no usable sheets found in {}: {empty} empty, {failed} failed to load",
        .input.display()
    )]
    NoUsableSheets {
        input: PathBuf,
        empty: usize,
        failed: usize,
    },

    /// Sheet name produced an empty output identifier
    #[error("sheet '{0}' yields an empty output identifier")]
    EmptyIdentifier(String),

    /// Two sheets map to the same output identifier
    #[error("sheet '{sheet}' collides with sheet '{previous}' on identifier '{identifier}'")]
    NameCollision {
        sheet: String,
        previous: String,
        identifier: String,
    },

    /// Parquet codec failure while persisting a table
    #[error("failed to write {}: {message}", .path.display())]
    Write { path: PathBuf, message: String },

    /// Parquet codec failure while reading a persisted file back
    #[error("failed to read {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    /// Internal invariant violated (e.g. ragged table columns)
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipeError {
    pub(crate) fn decode(source_name: impl Into<String>, message: impl ToString) -> Self {
        PipeError::Decode {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    /// True for errors that end the whole run rather than a single sheet
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipeError::Config(_)
                | PipeError::NotFound(_)
                | PipeError::Selection(_)
                | PipeError::NoUsableSheets { .. }
        )
    }
}

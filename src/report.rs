//! Per-sheet outcomes and the aggregate run report

use crate::error::{PipeError, Result};
use crate::filter::SkipReason;
use crate::parquet::SchemaSummary;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// What happened to one selected sheet
#[derive(Debug)]
pub enum SheetOutcome {
    /// Table persisted to `path`
    Written { path: PathBuf, row_count: usize },
    /// No file written; `path` is set when a target file was involved
    Skipped {
        reason: SkipReason,
        path: Option<PathBuf>,
    },
    /// Loading, naming or writing failed
    Failed(PipeError),
}

impl SheetOutcome {
    /// Short label: `written`, `skipped` or `failed`
    pub fn label(&self) -> &'static str {
        match self {
            SheetOutcome::Written { .. } => "written",
            SheetOutcome::Skipped { .. } => "skipped",
            SheetOutcome::Failed(_) => "failed",
        }
    }
}

/// Outcome of one sheet, keyed by its canonical name
#[derive(Debug)]
pub struct SheetReport {
    pub sheet: String,
    /// Output identifier, once one was derived
    pub identifier: Option<String>,
    pub outcome: SheetOutcome,
}

impl SheetReport {
    pub fn new(sheet: impl Into<String>, identifier: Option<String>, outcome: SheetOutcome) -> Self {
        SheetReport {
            sheet: sheet.into(),
            identifier,
            outcome,
        }
    }
}

impl fmt::Display for SheetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            SheetOutcome::Written { path, row_count } => write!(
                f,
                "[written] '{}' -> {} ({} rows)",
                self.sheet,
                path.display(),
                row_count
            ),
            SheetOutcome::Skipped { reason, path } => match path {
                Some(path) => write!(f, "[skipped:{}] '{}' -> {}", reason, self.sheet, path.display()),
                None => write!(f, "[skipped:{}] '{}'", reason, self.sheet),
            },
            SheetOutcome::Failed(e) => write!(f, "[failed] '{}': {}", self.sheet, e),
        }
    }
}

/// Aggregate result of one pipeline run
#[derive(Debug, Default)]
pub struct RunReport {
    pub run_id: String,
    /// One entry per selected sheet, in selection order
    pub sheets: Vec<SheetReport>,
    /// Read-back result per written file, when validation is enabled
    pub validations: Vec<(PathBuf, Result<SchemaSummary>)>,
}

impl RunReport {
    pub fn new(run_id: impl Into<String>) -> Self {
        RunReport {
            run_id: run_id.into(),
            ..Default::default()
        }
    }

    fn count(&self, label: &str) -> usize {
        self.sheets
            .iter()
            .filter(|s| s.outcome.label() == label)
            .count()
    }

    pub fn written_count(&self) -> usize {
        self.count("written")
    }

    pub fn skipped_count(&self) -> usize {
        self.count("skipped")
    }

    pub fn failed_count(&self) -> usize {
        self.count("failed")
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }

    /// Paths of every file written in this run, in write order
    pub fn written_paths(&self) -> Vec<&Path> {
        self.sheets
            .iter()
            .filter_map(|s| match &s.outcome {
                SheetOutcome::Written { path, .. } => Some(path.as_path()),
                _ => None,
            })
            .collect()
    }

    /// Report entry for a sheet by canonical name
    pub fn sheet(&self, name: &str) -> Option<&SheetReport> {
        self.sheets.iter().find(|s| s.sheet == name)
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_sheets".to_string(), self.sheets.len() as u64);
        dict_counts.insert("cnt_written".to_string(), self.written_count() as u64);
        dict_counts.insert("cnt_skipped".to_string(), self.skipped_count() as u64);
        dict_counts.insert("cnt_failed".to_string(), self.failed_count() as u64);
        dict_counts.insert(
            "cnt_invalid".to_string(),
            self.validations.iter().filter(|(_, r)| r.is_err()).count() as u64,
        );
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} sheets={} written={} skipped={} failed={} invalid={}",
            dict_counts["cnt_sheets"],
            dict_counts["cnt_written"],
            dict_counts["cnt_skipped"],
            dict_counts["cnt_failed"],
            dict_counts["cnt_invalid"]
        )
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[INGEST]"))
    }
}

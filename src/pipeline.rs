//! Pipeline driver
//!
//! Selector → Loader → Filter → Sanitizer → Writer, then the validator over
//! whatever was written. Sheets are handled one at a time in selection order.
//!
//! Configuration, selection and workbook-open failures come back as `Err`
//! before any file is touched, as does a run where no sheet survives
//! loading and filtering. Everything that goes wrong with a single sheet is
//! recorded in its [`SheetReport`] and the run moves on to the next sheet.
//!
//! # Example
//!
//! ```no_run
//! use sheetpipe::{pipeline, Config, RunContext};
//!
//! let config = Config::load("config/settings.yaml")?;
//! let ctx = RunContext::stdout("pipeline");
//! let report = pipeline::run(&config, &ctx)?;
//! println!("{}", report);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::config::{Config, ReaderConfig, WriterConfig};
use crate::context::RunContext;
use crate::error::{PipeError, Result};
use crate::filter::{self, FilterDecision, SkipReason};
use crate::loader;
use crate::parquet::{self, WriteOutcome};
use crate::report::{RunReport, SheetOutcome, SheetReport};
use crate::sanitize::{self, IdentifierRegistry};
use crate::selector;
use crate::types::SheetRecord;
use crate::workbook::{WorkbookSource, XlsxWorkbook};
use std::path::{Path, PathBuf};

/// A selected sheet after loading and filtering
#[derive(Debug)]
pub enum SheetEntry {
    /// Loaded and kept; still to be written
    Ready(SheetRecord),
    /// Already settled (skipped as empty, or failed to load)
    Settled(SheetReport),
}

/// Run the whole pipeline for `config`
pub fn run(config: &Config, ctx: &RunContext) -> Result<RunReport> {
    let input = &config.reader.input_file;
    ctx.info(&format!("Opening workbook {}", input.display()));

    let workbook = XlsxWorkbook::open(input).inspect_err(|e| ctx.error(&e.to_string()))?;
    ctx.debug(&format!(
        "Workbook {} lists {} sheet(s)",
        workbook.path().display(),
        workbook.sheet_names().len()
    ));
    run_with_workbook(workbook, config, ctx)
}

/// Run the pipeline against an already opened workbook
///
/// The workbook is consumed and dropped as soon as every selected sheet has
/// been loaded.
pub fn run_with_workbook<W: WorkbookSource>(
    workbook: W,
    config: &Config,
    ctx: &RunContext,
) -> Result<RunReport> {
    let entries = read_sheets(workbook, &config.reader, ctx)?;

    let mut report = RunReport::new(ctx.run_id());
    report.sheets = save_sheets(entries, &config.writer, ctx);

    if config.writer.validate_output {
        let written: Vec<PathBuf> = report
            .written_paths()
            .into_iter()
            .map(Path::to_path_buf)
            .collect();

        for path in written {
            let result = parquet::validate(&path);
            match &result {
                Ok(summary) => ctx.info(&format!("Validated {}", summary)),
                Err(e) => ctx.warn(&format!("Validation failed: {}", e)),
            }
            report.validations.push((path, result));
        }
    }

    let summary = report.to_string();
    if report.has_failures() {
        ctx.warn(&summary);
    } else {
        ctx.info(&summary);
    }
    Ok(report)
}

/// Select, load and filter sheets
///
/// Fails before loading when the selection cannot be resolved, and after
/// loading when no sheet is left to write.
pub fn read_sheets<W: WorkbookSource>(
    mut workbook: W,
    reader: &ReaderConfig,
    ctx: &RunContext,
) -> Result<Vec<SheetEntry>> {
    let names = selector::resolve(workbook.sheet_names(), &reader.selection)
        .inspect_err(|e| ctx.error(&format!("Sheet selection failed: {}", e)))?;
    ctx.info(&format!("Selected {} sheet(s): {:?}", names.len(), names));

    let loaded = loader::load_all(&mut workbook, &names, ctx);
    drop(workbook);

    let mut entries = Vec::with_capacity(loaded.len());
    let (mut empty, mut failed) = (0, 0);

    for (name, result) in loaded {
        let entry = match result {
            Ok(record) => match filter::filter(record, reader.skip_empty_sheets) {
                FilterDecision::Keep(record) => {
                    ctx.debug(&format!(
                        "Sheet '{}' kept with {} row(s)",
                        record.name(),
                        record.table.row_count()
                    ));
                    SheetEntry::Ready(record)
                }
                FilterDecision::Skip(reason) => {
                    empty += 1;
                    ctx.warn(&format!("Sheet '{}' is empty and will be skipped", name));
                    SheetEntry::Settled(SheetReport::new(
                        name,
                        None,
                        SheetOutcome::Skipped { reason, path: None },
                    ))
                }
            },
            Err(e) => {
                failed += 1;
                SheetEntry::Settled(SheetReport::new(name, None, SheetOutcome::Failed(e)))
            }
        };
        entries.push(entry);
    }

    if !entries.iter().any(|e| matches!(e, SheetEntry::Ready(_))) {
        let err = PipeError::NoUsableSheets {
            input: reader.input_file.clone(),
            empty,
            failed,
        };
        ctx.error(&err.to_string());
        return Err(err);
    }

    Ok(entries)
}

/// Name and write every ready sheet, passing settled ones through
pub fn save_sheets(
    entries: Vec<SheetEntry>,
    writer: &WriterConfig,
    ctx: &RunContext,
) -> Vec<SheetReport> {
    let mut registry = IdentifierRegistry::new();

    entries
        .into_iter()
        .map(|entry| match entry {
            SheetEntry::Settled(report) => report,
            SheetEntry::Ready(record) => save_sheet(record, writer, &mut registry, ctx),
        })
        .collect()
}

fn save_sheet(
    record: SheetRecord,
    writer: &WriterConfig,
    registry: &mut IdentifierRegistry,
    ctx: &RunContext,
) -> SheetReport {
    let (name, table) = record.into_parts();

    let identifier = sanitize::sanitize(&name, writer.sanitize_names)
        .and_then(|id| registry.claim(&name, id, writer.on_name_collision));

    let identifier = match identifier {
        Ok(id) => id,
        Err(e) => {
            ctx.error(&format!("Cannot name output for sheet '{}': {}", name, e));
            return SheetReport::new(name, None, SheetOutcome::Failed(e));
        }
    };

    let outcome = match parquet::write(
        &table,
        &identifier,
        &writer.output_dir,
        &writer.compression,
        writer.overwrite,
    ) {
        Ok(WriteOutcome::Persisted { path, row_count }) => {
            ctx.info(&format!("Saved sheet '{}' to {}", name, path.display()));
            SheetOutcome::Written { path, row_count }
        }
        Ok(WriteOutcome::SkippedExists(path)) => {
            ctx.warn(&format!(
                "Skipping sheet '{}': {} already exists (overwrite disabled)",
                name,
                path.display()
            ));
            SheetOutcome::Skipped {
                reason: SkipReason::ExistsNoOverwrite,
                path: Some(path),
            }
        }
        Err(e) => {
            ctx.error(&format!("Failed to save sheet '{}': {}", name, e));
            SheetOutcome::Failed(e)
        }
    };

    SheetReport::new(name, Some(identifier), outcome)
}

//! Sheet loading

use crate::context::RunContext;
use crate::error::Result;
use crate::types::{SheetRecord, Table};
use crate::workbook::WorkbookSource;

/// Decode one sheet; decoder failures are returned unchanged
pub fn load<W: WorkbookSource + ?Sized>(workbook: &mut W, name: &str) -> Result<Table> {
    workbook.parse_sheet(name)
}

/// Load every named sheet in order
///
/// A failing sheet does not stop the ones after it; each name is paired
/// with its own result.
pub fn load_all<W: WorkbookSource + ?Sized>(
    workbook: &mut W,
    names: &[String],
    ctx: &RunContext,
) -> Vec<(String, Result<SheetRecord>)> {
    names
        .iter()
        .map(|name| {
            let loaded = load(workbook, name).map(|table| {
                ctx.info(&format!(
                    "Sheet: {} | Rows: {} | Columns: {:?}",
                    name,
                    table.row_count(),
                    table.column_names()
                ));
                SheetRecord::new(name.clone(), table)
            });
            if let Err(e) = &loaded {
                ctx.error(&format!("Failed to load sheet '{}': {}", name, e));
            }
            (name.clone(), loaded)
        })
        .collect()
}

//! Sheet selection

use crate::config::SheetSelection;
use crate::error::SelectionError;

/// Resolve a selection directive against the workbook's sheet names
///
/// `All` keeps workbook order. `ByName` is returned as-is without checking
/// membership; an unknown name fails later when the sheet is loaded.
/// `ByIndex` past the last sheet is an error, never clamped.
pub fn resolve(
    sheet_names: &[String],
    selection: &SheetSelection,
) -> Result<Vec<String>, SelectionError> {
    match selection {
        SheetSelection::All => Ok(sheet_names.to_vec()),
        SheetSelection::ByName(name) => Ok(vec![name.clone()]),
        SheetSelection::ByIndex(index) => sheet_names
            .get(*index)
            .map(|name| vec![name.clone()])
            .ok_or(SelectionError::OutOfRange {
                index: *index,
                sheet_count: sheet_names.len(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["Summary".into(), "Q1 Data".into(), "Archive".into()]
    }

    #[test]
    fn test_all_preserves_workbook_order() {
        assert_eq!(resolve(&names(), &SheetSelection::All).unwrap(), names());
    }

    #[test]
    fn test_by_name_is_not_checked() {
        let resolved = resolve(&names(), &SheetSelection::ByName("Missing".into())).unwrap();
        assert_eq!(resolved, vec!["Missing".to_string()]);
    }

    #[test]
    fn test_by_index_bounds() {
        let sheets = names();
        let last = resolve(&sheets, &SheetSelection::ByIndex(sheets.len() - 1)).unwrap();
        assert_eq!(last, vec!["Archive".to_string()]);

        let err = resolve(&sheets, &SheetSelection::ByIndex(sheets.len())).unwrap_err();
        assert_eq!(
            err,
            SelectionError::OutOfRange {
                index: 3,
                sheet_count: 3
            }
        );
    }

    #[test]
    fn test_by_index_on_empty_workbook() {
        assert!(resolve(&[], &SheetSelection::ByIndex(0)).is_err());
        assert!(resolve(&[], &SheetSelection::All).unwrap().is_empty());
    }
}

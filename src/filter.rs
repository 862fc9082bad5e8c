//! Empty sheet filtering

use crate::types::SheetRecord;
use std::fmt;

/// Why a sheet produced no output file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Sheet has no data rows
    Empty,
    /// Target file exists and overwrite is disabled
    ExistsNoOverwrite,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Empty => f.write_str("empty"),
            SkipReason::ExistsNoOverwrite => f.write_str("exists-no-overwrite"),
        }
    }
}

/// Result of running a sheet through the filter
#[derive(Debug, Clone, PartialEq)]
pub enum FilterDecision {
    Keep(SheetRecord),
    Skip(SkipReason),
}

/// Drop zero-row tables when `skip_empty` is set
pub fn filter(record: SheetRecord, skip_empty: bool) -> FilterDecision {
    if skip_empty && record.table.is_empty() {
        FilterDecision::Skip(SkipReason::Empty)
    } else {
        FilterDecision::Keep(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CellValue, Table};

    fn record(rows: usize) -> SheetRecord {
        let data = (0..rows).map(|i| vec![CellValue::Int(i as i64)]).collect();
        SheetRecord::new("s", Table::from_rows(vec!["n".into()], data))
    }

    #[test]
    fn test_skips_empty_when_enabled() {
        assert_eq!(filter(record(0), true), FilterDecision::Skip(SkipReason::Empty));
        assert!(matches!(filter(record(2), true), FilterDecision::Keep(_)));
    }

    #[test]
    fn test_keeps_empty_when_disabled() {
        assert!(matches!(filter(record(0), false), FilterDecision::Keep(_)));
    }

    #[test]
    fn test_skip_reason_labels() {
        assert_eq!(SkipReason::Empty.to_string(), "empty");
        assert_eq!(SkipReason::ExistsNoOverwrite.to_string(), "exists-no-overwrite");
    }
}

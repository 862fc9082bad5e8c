//! Type definitions for sheet data

use chrono::NaiveDateTime;
use std::fmt;

/// Text form of date/time cells, also used when previewing written files
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Represents a single cell value decoded from a worksheet
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty cell
    Empty,
    /// String value
    String(String),
    /// Integer value
    Int(i64),
    /// Float value
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// Date or date-time cell, without a time zone
    DateTime(NaiveDateTime),
    /// Error value (e.g. "#DIV/0!")
    Error(String),
}

impl CellValue {
    /// Convert cell value to string
    pub fn as_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::String(s) => s.clone(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
            CellValue::Error(e) => e.clone(),
        }
    }

    /// Check if cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Try to convert to integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to convert to float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(f) => Some(*f),
            CellValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to convert to boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

/// Storage type of a column, inferred from its non-empty cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Boolean,
    Int64,
    Float64,
    Timestamp,
    Utf8,
}

impl ColumnType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Int64 => "Int64",
            Self::Float64 => "Float64",
            Self::Timestamp => "Timestamp",
            Self::Utf8 => "Utf8",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named column of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Column {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Infer the storage type of this column
    ///
    /// Booleans, integers and date-times keep their type only when the
    /// column is homogeneous; integers mixed with floats widen to Float64;
    /// anything else (text, errors, mixed kinds, no values at all) is Utf8.
    pub fn inferred_type(&self) -> ColumnType {
        let mut kind: Option<ColumnType> = None;

        for value in &self.values {
            let cell_kind = match value {
                CellValue::Empty => continue,
                CellValue::Bool(_) => ColumnType::Boolean,
                CellValue::Int(_) => ColumnType::Int64,
                CellValue::Float(_) => ColumnType::Float64,
                CellValue::DateTime(_) => ColumnType::Timestamp,
                CellValue::String(_) | CellValue::Error(_) => return ColumnType::Utf8,
            };

            kind = Some(match (kind, cell_kind) {
                (None, k) => k,
                (Some(a), b) if a == b => a,
                (Some(ColumnType::Int64), ColumnType::Float64)
                | (Some(ColumnType::Float64), ColumnType::Int64) => ColumnType::Float64,
                _ => return ColumnType::Utf8,
            });
        }

        kind.unwrap_or(ColumnType::Utf8)
    }
}

/// In-memory, column-oriented table
///
/// All columns hold exactly `row_count` values. The row count is kept
/// separately so a table without columns still reports its height.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Build a table from a header row and data rows
    ///
    /// The width is the widest of all rows. Short rows are padded with empty
    /// cells, trailing all-empty rows are dropped, blank header cells become
    /// `Unnamed: <i>` and repeated names get a `.1`, `.2`, ... suffix.
    pub fn from_rows(header: Vec<CellValue>, mut rows: Vec<Vec<CellValue>>) -> Self {
        while rows
            .last()
            .is_some_and(|row| row.iter().all(CellValue::is_empty))
        {
            rows.pop();
        }

        let width = rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(header.len()))
            .max()
            .unwrap_or(0);

        let names = header_names(&header, width);
        let row_count = rows.len();

        let mut columns: Vec<Column> = names
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(row_count)))
            .collect();

        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.values.push(cells.next().unwrap_or(CellValue::Empty));
            }
        }

        Table { columns, row_count }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }
}

fn header_names(header: &[CellValue], width: usize) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(width);

    for idx in 0..width {
        let base = match header.get(idx).map(CellValue::as_string) {
            Some(s) if !s.is_empty() => s,
            _ => format!("Unnamed: {}", idx),
        };

        let mut name = base.clone();
        let mut dup = 0;
        while names.contains(&name) {
            dup += 1;
            name = format!("{}.{}", base, dup);
        }
        names.push(name);
    }

    names
}

/// A canonical sheet name paired with its decoded table
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRecord {
    name: String,
    pub table: Table,
}

impl SheetRecord {
    pub fn new(name: impl Into<String>, table: Table) -> Self {
        SheetRecord {
            name: name.into(),
            table,
        }
    }

    /// Canonical sheet name, fixed once resolved
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn into_parts(self) -> (String, Table) {
        (self.name, self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|s| CellValue::from(*s)).collect()
    }

    #[test]
    fn test_from_rows_pads_and_names_columns() {
        let table = Table::from_rows(
            strings(&["id", "", "id"]),
            vec![
                vec![CellValue::Int(1), CellValue::from("a")],
                vec![
                    CellValue::Int(2),
                    CellValue::from("b"),
                    CellValue::Float(2.5),
                    CellValue::Bool(true),
                ],
            ],
        );

        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.column_names(),
            vec!["id", "Unnamed: 1", "id.1", "Unnamed: 3"]
        );
        assert_eq!(table.columns()[2].values[0], CellValue::Empty);
    }

    #[test]
    fn test_from_rows_drops_trailing_blank_rows() {
        let table = Table::from_rows(
            strings(&["a"]),
            vec![
                vec![CellValue::Empty],
                vec![CellValue::Int(1)],
                vec![CellValue::Empty, CellValue::Empty],
                vec![],
            ],
        );
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_header_only_table_is_empty() {
        let table = Table::from_rows(strings(&["a", "b"]), vec![]);
        assert!(table.is_empty());
        assert_eq!(table.column_count(), 2);
    }

    #[test]
    fn test_column_type_inference() {
        let col = |values: Vec<CellValue>| Column::new("c", values).inferred_type();

        assert_eq!(col(vec![CellValue::Int(1), CellValue::Empty]), ColumnType::Int64);
        assert_eq!(
            col(vec![CellValue::Int(1), CellValue::Float(0.5)]),
            ColumnType::Float64
        );
        assert_eq!(
            col(vec![CellValue::Bool(true), CellValue::Bool(false)]),
            ColumnType::Boolean
        );
        assert_eq!(col(vec![CellValue::Bool(true), CellValue::Int(1)]), ColumnType::Utf8);
        assert_eq!(col(vec![CellValue::Int(1), CellValue::from("x")]), ColumnType::Utf8);
        assert_eq!(col(vec![CellValue::Empty]), ColumnType::Utf8);

        let day = chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(
            col(vec![CellValue::DateTime(day), CellValue::Empty]),
            ColumnType::Timestamp
        );
        assert_eq!(col(vec![CellValue::DateTime(day), CellValue::Int(1)]), ColumnType::Utf8);
        assert_eq!(CellValue::DateTime(day).as_string(), "2024-05-01 00:00:00");
    }

    #[test]
    fn test_cell_value_conversions() {
        let val = CellValue::Int(42);
        assert_eq!(val.as_i64(), Some(42));
        assert_eq!(val.as_f64(), Some(42.0));
        assert_eq!(CellValue::Bool(true).as_bool(), Some(true));
        assert_eq!(CellValue::Error("#N/A".into()).as_string(), "#N/A");
    }
}

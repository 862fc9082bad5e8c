//! Workbook decoding
//!
//! [`WorkbookSource`] is the capability the pipeline needs from a workbook:
//! list its sheet names and turn one sheet into a [`Table`].
//! [`XlsxWorkbook`] implements it for `.xlsx`/`.xlsm` files.
//!
//! Parts are parsed with `quick-xml` and elements are matched by local
//! name, so prefixed markup (`<x:sheet>`, `<x:row>`) reads the same as the
//! default namespace.
//!
//! **Memory Usage:**
//! - Shared Strings Table (SST): loaded fully at open
//! - Worksheet XML: loaded fully per sheet while it is parsed
//! - The resulting table is materialized in memory
//!
//! **Trade-offs:**
//! - Numbers whose style shows a date become [`CellValue::DateTime`];
//!   time-only formats stay numeric
//! - Cell formulas are ignored; their cached values are used

use crate::error::{PipeError, Result};
use crate::types::{CellValue, Table};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

// Local element names
const TAG_RELATIONSHIP: &[u8] = b"Relationship";
const TAG_WORKBOOK_PROPERTIES: &[u8] = b"workbookPr";
const TAG_SHEET: &[u8] = b"sheet";
const TAG_SHARED_STRING_ITEM: &[u8] = b"si";
const TAG_PHONETIC_TEXT: &[u8] = b"rPh";
const TAG_TEXT: &[u8] = b"t";
const TAG_CUSTOM_FORMAT: &[u8] = b"numFmt";
const TAG_FORMAT_INDEXES: &[u8] = b"cellXfs";
const TAG_FORMAT_INDEX: &[u8] = b"xf";
const TAG_ROW: &[u8] = b"row";
const TAG_CELL: &[u8] = b"c";
const TAG_INLINE_STRING: &[u8] = b"is";
const TAG_VALUE: &[u8] = b"v";

const PART_WORKBOOK: &str = "xl/workbook.xml";
const PART_WORKBOOK_RELS: &str = "xl/_rels/workbook.xml.rels";
const PART_SHARED_STRINGS: &str = "xl/sharedStrings.xml";
const PART_STYLES: &str = "xl/styles.xml";

/// Opaque workbook capability consumed by the pipeline
pub trait WorkbookSource {
    /// Sheet names in workbook order
    fn sheet_names(&self) -> &[String];

    /// Decode one sheet into a table; first row is the header
    fn parse_sheet(&mut self, name: &str) -> Result<Table>;
}

/// XLSX workbook opened from disk
///
/// The archive handle is held until the value is dropped.
///
/// # Example
///
/// ```no_run
/// use sheetpipe::workbook::{WorkbookSource, XlsxWorkbook};
///
/// let mut workbook = XlsxWorkbook::open("report.xlsx")?;
/// for name in workbook.sheet_names().to_vec() {
///     let table = workbook.parse_sheet(&name)?;
///     println!("{}: {} rows", name, table.row_count());
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct XlsxWorkbook {
    path: PathBuf,
    archive: ZipArchive<File>,
    sheets: Vec<SheetEntry>,
    sheet_names: Vec<String>,
    decoder: CellDecoder,
}

/// Sheet name and the archive part holding its cells
#[derive(Debug, Clone, PartialEq, Eq)]
struct SheetEntry {
    name: String,
    part: String,
}

/// What `xl/workbook.xml` says about the workbook
#[derive(Debug, Default, PartialEq, Eq)]
struct WorkbookInfo {
    sheets: Vec<SheetEntry>,
    is_1904: bool,
}

impl XlsxWorkbook {
    /// Open an XLSX workbook and load its sheet index, shared strings and styles
    ///
    /// Fails with [`PipeError::NotFound`] when the file is missing and
    /// [`PipeError::Decode`] when it is not a readable workbook or lists no
    /// sheets.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let source_name = path.display().to_string();

        if !path.is_file() {
            return Err(PipeError::NotFound(path));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        if let Some(ext) = ext.as_deref() {
            if !matches!(ext, "xlsx" | "xlsm") {
                return Err(PipeError::decode(
                    source_name,
                    format!("unsupported workbook format '.{}': only .xlsx and .xlsm can be read", ext),
                ));
            }
        }

        let file = File::open(&path)
            .map_err(|e| PipeError::decode(&source_name, format!("failed to open file: {}", e)))?;

        let mut archive = ZipArchive::new(file)
            .map_err(|e| PipeError::decode(&source_name, format!("failed to read ZIP: {}", e)))?;

        let workbook_xml = read_archive_entry(&mut archive, PART_WORKBOOK, &source_name)?
            .ok_or_else(|| PipeError::decode(&source_name, format!("missing {}", PART_WORKBOOK)))?;
        let rels_xml = read_archive_entry(&mut archive, PART_WORKBOOK_RELS, &source_name)?
            .ok_or_else(|| {
                PipeError::decode(&source_name, format!("missing {}", PART_WORKBOOK_RELS))
            })?;
        let info = parse_workbook(&workbook_xml, &rels_xml, &source_name)?;

        let sst = match read_archive_entry(&mut archive, PART_SHARED_STRINGS, &source_name)? {
            Some(xml) => parse_shared_strings(&xml, &source_name)?,
            None => Vec::new(), // No SST = all cells are inline
        };
        let date_styles = match read_archive_entry(&mut archive, PART_STYLES, &source_name)? {
            Some(xml) => parse_date_styles(&xml, &source_name)?,
            None => Vec::new(),
        };

        let sheet_names = info.sheets.iter().map(|s| s.name.clone()).collect();

        Ok(XlsxWorkbook {
            path,
            archive,
            sheets: info.sheets,
            sheet_names,
            decoder: CellDecoder {
                sst,
                date_styles,
                is_1904: info.is_1904,
            },
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WorkbookSource for XlsxWorkbook {
    fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    fn parse_sheet(&mut self, name: &str) -> Result<Table> {
        let part = self
            .sheets
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.part.clone())
            .ok_or_else(|| {
                PipeError::decode(
                    name,
                    format!(
                        "sheet not found. Available sheets: {:?}",
                        self.sheet_names
                    ),
                )
            })?;

        let xml = read_archive_entry(&mut self.archive, &part, name)?
            .ok_or_else(|| PipeError::decode(name, format!("missing worksheet part {}", part)))?;
        let mut rows = self.decoder.parse_rows(&xml, name)?;

        if rows.is_empty() {
            return Ok(Table::default());
        }
        let header = rows.remove(0);
        Ok(Table::from_rows(header, rows))
    }
}

fn read_archive_entry(
    archive: &mut ZipArchive<File>,
    entry: &str,
    source_name: &str,
) -> Result<Option<String>> {
    let mut file = match archive.by_name(entry) {
        Ok(f) => f,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => {
            return Err(PipeError::decode(
                source_name,
                format!("failed to open {}: {}", entry, e),
            ))
        }
    };

    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| PipeError::decode(source_name, format!("failed to read {}: {}", entry, e)))?;
    Ok(Some(xml))
}

/// Pull-based event reader over one XML part held in memory
struct XmlEvents<'a> {
    reader: Reader<&'a [u8]>,
    source_name: &'a str,
    part: &'a str,
}

impl<'a> XmlEvents<'a> {
    fn new(xml: &'a str, source_name: &'a str, part: &'a str) -> Self {
        let mut reader = Reader::from_str(xml);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.expand_empty_elements = true;
        config.trim_text(false);

        XmlEvents {
            reader,
            source_name,
            part,
        }
    }

    fn next(&mut self) -> Result<Option<Event<'a>>> {
        match self.reader.read_event() {
            Ok(Event::Eof) => Ok(None),
            Ok(event) => Ok(Some(event)),
            Err(e) => Err(self.error(e)),
        }
    }

    fn error(&self, cause: impl ToString) -> PipeError {
        PipeError::decode(
            self.source_name,
            format!(
                "malformed {} at byte {}: {}",
                self.part,
                self.reader.buffer_position(),
                cause.to_string()
            ),
        )
    }

    /// Unescaped value of the attribute whose local name is `key`
    fn attribute(&self, event: &BytesStart, key: &[u8]) -> Result<Option<String>> {
        for attr in event.attributes() {
            let attr = attr.map_err(|e| self.error(e))?;
            if attr.key.local_name().as_ref() == key {
                let value = attr.unescape_value().map_err(|e| self.error(e))?;
                return Ok(Some(value.into_owned()));
            }
        }
        Ok(None)
    }

    /// Text up to the end tag `end` of the element just opened
    ///
    /// Only `<t>` runs are collected unless `bare_text` is set, as for `<v>`.
    /// Phonetic runs are skipped.
    fn read_text(&mut self, end: &[u8], bare_text: bool) -> Result<String> {
        let mut text = String::new();
        let mut in_text = bare_text;
        let mut in_phonetic = false;

        while let Some(event) = self.next()? {
            match event {
                Event::End(e) if e.local_name().as_ref() == end => break,
                Event::Start(e) if e.local_name().as_ref() == TAG_PHONETIC_TEXT => {
                    in_phonetic = true
                }
                Event::End(e) if e.local_name().as_ref() == TAG_PHONETIC_TEXT => {
                    in_phonetic = false
                }
                Event::Start(e) if !in_phonetic && e.local_name().as_ref() == TAG_TEXT => {
                    in_text = true
                }
                Event::End(e) if e.local_name().as_ref() == TAG_TEXT => in_text = bare_text,
                Event::Text(e) if in_text => {
                    text.push_str(&e.xml_content().map_err(|e| self.error(e))?)
                }
                Event::CData(e) if in_text => {
                    text.push_str(&e.xml_content().map_err(|e| self.error(e))?)
                }
                Event::GeneralRef(e) if in_text => {
                    push_reference(&mut text, &e).map_err(|e| self.error(e))?
                }
                _ => {}
            }
        }

        Ok(text)
    }
}

/// Append the character an entity or character reference stands for
fn push_reference(text: &mut String, reference: &BytesRef) -> std::result::Result<(), String> {
    let raw = reference.xml_content().map_err(|e| e.to_string())?;

    let resolved = match raw.strip_prefix('#') {
        Some(number) => {
            let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16),
                None => number.parse::<u32>(),
            };
            code.ok().and_then(char::from_u32).map(String::from)
        }
        None => resolve_xml_entity(&raw).map(str::to_string),
    };

    match resolved {
        Some(s) => {
            text.push_str(&s);
            Ok(())
        }
        None => Err(format!("unknown entity '&{};'", raw)),
    }
}

/// Read sheet names, their parts and the date system
fn parse_workbook(workbook_xml: &str, rels_xml: &str, source_name: &str) -> Result<WorkbookInfo> {
    // <Relationship Id="rId1" Type="..." Target="worksheets/sheet1.xml"/>
    let mut targets: HashMap<String, String> = HashMap::new();
    let mut events = XmlEvents::new(rels_xml, source_name, PART_WORKBOOK_RELS);
    while let Some(event) = events.next()? {
        if let Event::Start(e) = event {
            if e.local_name().as_ref() == TAG_RELATIONSHIP {
                let id = events.attribute(&e, b"Id")?;
                let target = events.attribute(&e, b"Target")?;
                if let (Some(id), Some(target)) = (id, target) {
                    targets.insert(id, to_part_path(&target));
                }
            }
        }
    }

    // <sheet name="Sheet1" sheetId="1" r:id="rId1"/>
    let mut info = WorkbookInfo::default();
    let mut events = XmlEvents::new(workbook_xml, source_name, PART_WORKBOOK);
    while let Some(event) = events.next()? {
        let Event::Start(e) = event else {
            continue;
        };
        match e.local_name().as_ref() {
            TAG_SHEET => {
                let name = events.attribute(&e, b"name")?.ok_or_else(|| {
                    PipeError::decode(source_name, "sheet entry without a name")
                })?;
                let part = events
                    .attribute(&e, b"id")?
                    .and_then(|rid| targets.get(&rid).cloned())
                    .ok_or_else(|| {
                        PipeError::decode(
                            source_name,
                            format!("no worksheet part found for sheet '{}'", name),
                        )
                    })?;
                info.sheets.push(SheetEntry { name, part });
            }
            TAG_WORKBOOK_PROPERTIES => {
                info.is_1904 = events
                    .attribute(&e, b"date1904")?
                    .is_some_and(|v| v == "1" || v == "true");
            }
            _ => {}
        }
    }

    if info.sheets.is_empty() {
        return Err(PipeError::decode(
            source_name,
            format!("{} lists no sheets", PART_WORKBOOK),
        ));
    }
    Ok(info)
}

/// Archive path of a relationship target, relative to `xl/` unless absolute
fn to_part_path(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(abs) => abs.to_string(),
        None if target.starts_with("xl/") => target.to_string(),
        None => format!("xl/{}", target),
    }
}

/// Load the Shared Strings Table; cells reference strings by index
fn parse_shared_strings(xml: &str, source_name: &str) -> Result<Vec<String>> {
    let mut sst = Vec::new();
    let mut events = XmlEvents::new(xml, source_name, PART_SHARED_STRINGS);

    while let Some(event) = events.next()? {
        if let Event::Start(e) = event {
            if e.local_name().as_ref() == TAG_SHARED_STRING_ITEM {
                sst.push(events.read_text(TAG_SHARED_STRING_ITEM, false)?);
            }
        }
    }

    Ok(sst)
}

/// Per cell-format index, whether its number format displays a date
fn parse_date_styles(xml: &str, source_name: &str) -> Result<Vec<bool>> {
    let mut custom_formats: HashMap<String, bool> = HashMap::new();
    let mut format_ids: Vec<String> = Vec::new();
    let mut in_cell_formats = false;
    let mut events = XmlEvents::new(xml, source_name, PART_STYLES);

    while let Some(event) = events.next()? {
        match event {
            Event::Start(e) if e.local_name().as_ref() == TAG_CUSTOM_FORMAT => {
                let id = events.attribute(&e, b"numFmtId")?;
                let code = events.attribute(&e, b"formatCode")?;
                if let (Some(id), Some(code)) = (id, code) {
                    custom_formats.insert(id, is_date_format(&code));
                }
            }
            Event::Start(e) if e.local_name().as_ref() == TAG_FORMAT_INDEXES => {
                in_cell_formats = true
            }
            Event::End(e) if e.local_name().as_ref() == TAG_FORMAT_INDEXES => {
                in_cell_formats = false
            }
            Event::Start(e) if in_cell_formats && e.local_name().as_ref() == TAG_FORMAT_INDEX => {
                format_ids.push(events.attribute(&e, b"numFmtId")?.unwrap_or_default());
            }
            _ => {}
        }
    }

    Ok(format_ids
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .unwrap_or_else(|| is_builtin_date_format(id))
        })
        .collect())
}

fn is_builtin_date_format(id: &str) -> bool {
    matches!(id, "14" | "15" | "16" | "17" | "22")
}

/// True when a custom format code shows a year or a day
///
/// Quoted literals, escaped characters and bracketed sections (colors,
/// locales) are ignored.
fn is_date_format(code: &str) -> bool {
    let mut escaped = false;
    let mut literal = false;
    let mut bracket = false;

    for c in code.chars() {
        match c {
            _ if escaped => escaped = false,
            '\\' | '_' => escaped = true,
            '"' => literal = !literal,
            _ if literal => {}
            '[' => bracket = true,
            ']' => bracket = false,
            _ if bracket => {}
            'y' | 'Y' | 'd' | 'D' => return true,
            _ => {}
        }
    }
    false
}

/// Convert an Excel serial number into a date-time
///
/// In the 1900 system serials below 60 sit before the phantom 1900-02-29
/// and are shifted by a day.
fn serial_to_datetime(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }

    let epoch = if is_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)
    } else if serial < 60.0 {
        NaiveDate::from_ymd_opt(1899, 12, 31)
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)
    }?;

    let millis = (serial * 86_400_000.0).round() as i64;
    epoch
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

/// ISO 8601 value of a `t="d"` cell
fn parse_iso_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Cell attributes and content collected between `<c>` and `</c>`
#[derive(Debug, Default)]
struct PendingCell {
    column: usize,
    cell_type: Option<String>,
    style: Option<usize>,
    value: Option<String>,
    inline: Option<String>,
}

/// Workbook-wide state needed to type a cell
#[derive(Debug, Default)]
struct CellDecoder {
    sst: Vec<String>,
    date_styles: Vec<bool>,
    is_1904: bool,
}

impl CellDecoder {
    /// Parse all `<row>` elements of a worksheet into dense rows
    ///
    /// Leading blank rows are skipped. Missing rows between populated ones
    /// become empty rows; missing cells become [`CellValue::Empty`].
    fn parse_rows(&self, sheet_xml: &str, sheet_name: &str) -> Result<Vec<Vec<CellValue>>> {
        let mut rows: Vec<Vec<CellValue>> = Vec::new();
        let mut first_row: Option<usize> = None;
        let mut row_number = 0usize;
        let mut cells: Vec<CellValue> = Vec::new();
        let mut cell = PendingCell::default();
        let mut events = XmlEvents::new(sheet_xml, sheet_name, "worksheet");

        while let Some(event) = events.next()? {
            match event {
                Event::Start(e) if e.local_name().as_ref() == TAG_ROW => {
                    row_number = events
                        .attribute(&e, b"r")?
                        .and_then(|r| r.parse::<usize>().ok())
                        .unwrap_or(row_number + 1);
                    cells.clear();
                }
                Event::Start(e) if e.local_name().as_ref() == TAG_CELL => {
                    cell = PendingCell {
                        column: events
                            .attribute(&e, b"r")?
                            .map(|r| parse_column_index(&r))
                            .unwrap_or(cells.len()),
                        cell_type: events.attribute(&e, b"t")?,
                        style: events
                            .attribute(&e, b"s")?
                            .and_then(|s| s.parse::<usize>().ok()),
                        ..PendingCell::default()
                    };
                }
                Event::Start(e) if e.local_name().as_ref() == TAG_VALUE => {
                    cell.value = Some(events.read_text(TAG_VALUE, true)?);
                }
                Event::Start(e) if e.local_name().as_ref() == TAG_INLINE_STRING => {
                    cell.inline = Some(events.read_text(TAG_INLINE_STRING, false)?);
                }
                Event::End(e) if e.local_name().as_ref() == TAG_CELL => {
                    let cell = std::mem::take(&mut cell);
                    let column = cell.column;
                    let value = self.cell_value(cell);

                    while cells.len() < column {
                        cells.push(CellValue::Empty);
                    }
                    if column < cells.len() {
                        cells[column] = value;
                    } else {
                        cells.push(value);
                    }
                }
                Event::End(e) if e.local_name().as_ref() == TAG_ROW => {
                    while cells.last().is_some_and(CellValue::is_empty) {
                        cells.pop();
                    }

                    match first_row {
                        None if cells.is_empty() => continue,
                        None => first_row = Some(row_number),
                        Some(first) => {
                            while first + rows.len() < row_number {
                                rows.push(Vec::new());
                            }
                        }
                    }
                    rows.push(std::mem::take(&mut cells));
                }
                _ => {}
            }
        }

        Ok(rows)
    }

    fn is_date_style(&self, style: Option<usize>) -> bool {
        style
            .and_then(|s| self.date_styles.get(s))
            .copied()
            .unwrap_or(false)
    }

    fn cell_value(&self, cell: PendingCell) -> CellValue {
        let value = cell.value;

        match cell.cell_type.as_deref() {
            Some("inlineStr") => CellValue::String(cell.inline.or(value).unwrap_or_default()),
            Some("s") => value
                .and_then(|v| v.trim().parse::<usize>().ok())
                .and_then(|idx| self.sst.get(idx).cloned())
                .map(CellValue::String)
                .unwrap_or(CellValue::Empty),
            Some("b") => match value.as_deref().map(str::trim) {
                Some("1") | Some("true") => CellValue::Bool(true),
                Some("0") | Some("false") => CellValue::Bool(false),
                _ => CellValue::Empty,
            },
            Some("e") => value.map(CellValue::Error).unwrap_or(CellValue::Empty),
            Some("d") => match value {
                Some(v) => parse_iso_datetime(&v)
                    .map(CellValue::DateTime)
                    .unwrap_or(CellValue::String(v)),
                None => CellValue::Empty,
            },
            Some("str") => value.map(CellValue::String).unwrap_or(CellValue::Empty),
            _ => {
                let Some(v) = value else {
                    return CellValue::Empty;
                };
                let text = v.trim();
                if self.is_date_style(cell.style) {
                    let date = text
                        .parse::<f64>()
                        .ok()
                        .and_then(|serial| serial_to_datetime(serial, self.is_1904));
                    if let Some(dt) = date {
                        return CellValue::DateTime(dt);
                    }
                }
                parse_number(text)
            }
        }
    }
}

fn parse_number(text: &str) -> CellValue {
    if text.is_empty() {
        return CellValue::Empty;
    }
    if let Ok(i) = text.parse::<i64>() {
        return CellValue::Int(i);
    }
    match text.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => CellValue::Int(f as i64),
        Ok(f) => CellValue::Float(f),
        Err(_) => CellValue::String(text.to_string()),
    }
}

// Parse column index from cell reference (e.g., "A1" -> 0, "B1" -> 1, "AA1" -> 26)
fn parse_column_index(cell_ref: &str) -> usize {
    let mut col_idx = 0usize;
    for ch in cell_ref.chars() {
        if ch.is_ascii_alphabetic() {
            col_idx = col_idx * 26 + (ch.to_ascii_uppercase() as usize - 'A' as usize + 1);
        } else {
            break;
        }
    }
    col_idx.saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_parse_column_index() {
        assert_eq!(parse_column_index("A1"), 0);
        assert_eq!(parse_column_index("Z9"), 25);
        assert_eq!(parse_column_index("AA10"), 26);
    }

    #[test]
    fn test_shared_strings_runs_entities_and_phonetics() {
        let xml = r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="3">
            <si><t>Q1 &amp; Q2</t></si>
            <si><r><t xml:space="preserve">Hello </t></r><r><rPr><b/></rPr><t>world</t></r><rPh sb="0" eb="1"><t>ハ</t></rPh></si>
            <si><t>a&#10;b&#x41;</t></si>
            <si><t/></si>
        </sst>"#;

        let sst = parse_shared_strings(xml, "book.xlsx").unwrap();
        assert_eq!(sst, vec!["Q1 & Q2", "Hello world", "a\nbA", ""]);
    }

    #[test]
    fn test_workbook_with_prefixed_namespace() {
        let workbook = r#"<x:workbook xmlns:x="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
                xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
            <x:workbookPr date1904="1"/>
            <x:sheets><x:sheet name="Data" sheetId="1" r:id="rId1"/><x:sheet name="R&amp;D" sheetId="2" r:id="rId2"/></x:sheets>
        </x:workbook>"#;
        let rels = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
            <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
            <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="/xl/worksheets/sheet2.xml"/>
        </Relationships>"#;

        let info = parse_workbook(workbook, rels, "book.xlsx").unwrap();
        assert!(info.is_1904);
        assert_eq!(
            info.sheets,
            vec![
                SheetEntry {
                    name: "Data".into(),
                    part: "xl/worksheets/sheet1.xml".into()
                },
                SheetEntry {
                    name: "R&D".into(),
                    part: "xl/worksheets/sheet2.xml".into()
                },
            ]
        );
    }

    #[test]
    fn test_workbook_without_sheets_is_decode_error() {
        let workbook = r#"<workbook><sheets/></workbook>"#;
        let rels = r#"<Relationships/>"#;

        let err = parse_workbook(workbook, rels, "empty.xlsx").unwrap_err();
        match err {
            PipeError::Decode {
                source_name,
                message,
            } => {
                assert_eq!(source_name, "empty.xlsx");
                assert!(message.contains("lists no sheets"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_rows_typed_cells() {
        let decoder = CellDecoder {
            sst: vec!["name".to_string(), "Alice".to_string()],
            ..CellDecoder::default()
        };
        let xml = r#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="inlineStr"><is><t>age</t></is></c></row>
            <row r="2"><c r="A2" t="s"><v>1</v></c><c r="B2"><v>30</v></c><c r="C2" t="b"><v>1</v></c></row>
            <row r="4" spans="1:3"><c r="B4" s="1"/><c r="C4"><v>2.5</v></c><c r="D4" t="e"><v>#DIV/0!</v></c></row>
        </sheetData></worksheet>"#;

        let rows = decoder.parse_rows(xml, "Sheet1").unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], vec![CellValue::from("name"), CellValue::from("age")]);
        assert_eq!(
            rows[1],
            vec![CellValue::from("Alice"), CellValue::Int(30), CellValue::Bool(true)]
        );
        assert!(rows[2].is_empty());
        assert_eq!(
            rows[3],
            vec![
                CellValue::Empty,
                CellValue::Empty,
                CellValue::Float(2.5),
                CellValue::Error("#DIV/0!".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_rows_prefixed_worksheet() {
        let decoder = CellDecoder::default();
        let xml = r#"<x:worksheet xmlns:x="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><x:sheetData>
            <x:row r="1"><x:c r="A1" t="inlineStr"><x:is><x:t>id</x:t></x:is></x:c></x:row>
            <x:row r="2"><x:c r="A2"><x:v>7</x:v></x:c></x:row>
        </x:sheetData></x:worksheet>"#;

        let rows = decoder.parse_rows(xml, "Data").unwrap();
        assert_eq!(rows, vec![vec![CellValue::from("id")], vec![CellValue::Int(7)]]);
    }

    #[test]
    fn test_parse_rows_skips_leading_blank_rows() {
        let xml = r#"<sheetData><row r="1" ht="20" customHeight="1"/><row r="2"><c r="A2" s="3"/></row>
            <row r="3"><c r="A3" t="str"><f>A1</f><v>h</v></c></row><row r="5"><c r="A5"><v>1</v></c></row></sheetData>"#;

        let rows = CellDecoder::default().parse_rows(xml, "Sheet1").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec![CellValue::from("h")]);
        assert!(rows[1].is_empty());
        assert_eq!(rows[2], vec![CellValue::Int(1)]);
    }

    #[test]
    fn test_parse_rows_empty_sheet() {
        let rows = CellDecoder::default()
            .parse_rows("<worksheet><sheetData/></worksheet>", "Sheet1")
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_malformed_sheet_is_decode_error() {
        let err = CellDecoder::default()
            .parse_rows(r#"<sheetData><row r="1"><c r="A1" t="s><v>0</v></c></row>"#, "Broken")
            .unwrap_err();
        assert!(matches!(err, PipeError::Decode { ref source_name, .. } if source_name == "Broken"));
    }

    #[test]
    fn test_date_styles() {
        let xml = r#"<styleSheet>
            <numFmts count="2">
                <numFmt numFmtId="164" formatCode="yyyy\-mm\-dd"/>
                <numFmt numFmtId="165" formatCode="&quot;day&quot; 0.00"/>
            </numFmts>
            <cellStyleXfs count="1"><xf numFmtId="0"/></cellStyleXfs>
            <cellXfs count="5">
                <xf numFmtId="0"/><xf numFmtId="164" applyNumberFormat="1"/><xf numFmtId="165"/>
                <xf numFmtId="14"/><xf numFmtId="20"/>
            </cellXfs>
        </styleSheet>"#;

        let styles = parse_date_styles(xml, "book.xlsx").unwrap();
        assert_eq!(styles, vec![false, true, false, true, false]);
    }

    #[test]
    fn test_is_date_format() {
        assert!(is_date_format("yyyy-mm-dd"));
        assert!(is_date_format("[$-409]d-mmm-yy;@"));
        assert!(is_date_format("dd/mm/yyyy hh:mm"));
        assert!(!is_date_format("hh:mm:ss"));
        assert!(!is_date_format("[Red]0.00"));
        assert!(!is_date_format("\"days\" 0"));
        assert!(!is_date_format("General"));
    }

    #[test]
    fn test_serial_to_datetime() {
        assert_eq!(
            serial_to_datetime(45413.0, false),
            Some(ymd_hms(2024, 5, 1, 0, 0, 0))
        );
        assert_eq!(
            serial_to_datetime(45413.75, false),
            Some(ymd_hms(2024, 5, 1, 18, 0, 0))
        );
        assert_eq!(serial_to_datetime(1.0, false), Some(ymd_hms(1900, 1, 1, 0, 0, 0)));
        assert_eq!(serial_to_datetime(61.0, false), Some(ymd_hms(1900, 3, 1, 0, 0, 0)));
        assert_eq!(serial_to_datetime(0.0, true), Some(ymd_hms(1904, 1, 1, 0, 0, 0)));
        assert_eq!(serial_to_datetime(-1.0, false), None);
    }

    #[test]
    fn test_date_cells_decode_as_datetime() {
        let decoder = CellDecoder {
            date_styles: vec![false, true],
            ..CellDecoder::default()
        };
        let xml = r#"<sheetData>
            <row r="1"><c r="A1" t="inlineStr"><is><t>when</t></is></c><c r="B1" t="inlineStr"><is><t>n</t></is></c></row>
            <row r="2"><c r="A2" s="1"><v>45413</v></c><c r="B2" s="0"><v>45413</v></c></row>
            <row r="3"><c r="A3" t="d"><v>2024-05-02T08:15:00</v></c></row>
        </sheetData>"#;

        let rows = decoder.parse_rows(xml, "Dates").unwrap();
        assert_eq!(
            rows[1],
            vec![
                CellValue::DateTime(ymd_hms(2024, 5, 1, 0, 0, 0)),
                CellValue::Int(45413)
            ]
        );
        assert_eq!(rows[2], vec![CellValue::DateTime(ymd_hms(2024, 5, 2, 8, 15, 0))]);
    }

    #[test]
    fn test_open_missing_file() {
        let err = XlsxWorkbook::open("no/such/book.xlsx").err().unwrap();
        assert!(matches!(err, PipeError::NotFound(_)));
    }
}

use calamine::{Data, Range, Reader, Xlsx};
use chrono::{Days, NaiveDate};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Seek};

use super::detect::Format;
use super::error::{ImportError, ParseFailure};

/// A raw cell value. Absent cells are not represented; they are simply
/// missing from the row.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    pub(crate) fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }

    pub(crate) fn to_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RawRow {
    /// 1-based line (delimited text) or sheet row (spreadsheet).
    pub(crate) line: u64,
    pub(crate) cells: HashMap<String, Cell>,
}

impl RawRow {
    pub(crate) fn get(&self, column: &str) -> Option<&Cell> {
        self.cells.get(column)
    }

    pub(crate) fn is_blank(&self) -> bool {
        self.cells.values().all(Cell::is_blank)
    }
}

/// Lazily decoded statement rows.
pub(crate) enum Rows<R> {
    Delimited {
        headers: Vec<String>,
        records: csv::StringRecordsIntoIter<KeepBlankLines<R>>,
    },
    Sheet(std::vec::IntoIter<RawRow>),
}

impl<R: Read> Iterator for Rows<R> {
    type Item = Result<RawRow, ImportError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Delimited { headers, records } => {
                let result = records.next()?;
                Some(match result {
                    Ok(record) => {
                        let line = record.position().map_or(0, |p| p.line());
                        Ok(RawRow {
                            line,
                            cells: zip_cells(
                                headers,
                                record.iter().map(|s| Cell::Text(s.to_string())),
                            ),
                        })
                    }
                    Err(e) => {
                        let line = e.position().map(|p| p.line());
                        Err(ImportError::parse(line, e))
                    }
                })
            }
            Self::Sheet(rows) => rows.next().map(Ok),
        }
    }
}

/// The csv reader drops empty lines outright. This writes a lone delimiter
/// into every empty line after the first content so it comes back as a blank
/// record instead. Newlines inside quoted fields are left alone and no line
/// breaks are added, so record line numbers still match the input.
pub(crate) struct KeepBlankLines<R> {
    inner: BufReader<R>,
    delimiter: u8,
    held: Option<u8>,
    in_quotes: bool,
    line_start: bool,
    seen_content: bool,
}

impl<R: Read> KeepBlankLines<R> {
    fn new(inner: R, delimiter: u8) -> Self {
        Self {
            inner: BufReader::new(inner),
            delimiter,
            held: None,
            in_quotes: false,
            line_start: false,
            seen_content: false,
        }
    }

    /// Track `byte` and return whether a delimiter goes in front of it.
    fn fill_before(&mut self, byte: u8) -> bool {
        match byte {
            b'\r' | b'\n' if self.in_quotes => false,
            b'\r' if self.line_start && self.seen_content => {
                self.line_start = false;
                true
            }
            b'\r' => false,
            b'\n' => {
                let fill = self.line_start && self.seen_content;
                self.line_start = true;
                fill
            }
            _ => {
                if byte == b'"' {
                    self.in_quotes = !self.in_quotes;
                }
                self.line_start = false;
                self.seen_content = true;
                false
            }
        }
    }
}

impl<R: Read> Read for KeepBlankLines<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut written = 0;
        while written < buf.len() {
            if let Some(byte) = self.held.take() {
                buf[written] = byte;
                written += 1;
                continue;
            }
            let byte = match self.inner.fill_buf()?.first() {
                Some(&byte) => byte,
                None => break,
            };
            self.inner.consume(1);
            if self.fill_before(byte) {
                buf[written] = self.delimiter;
                self.held = Some(byte);
            } else {
                buf[written] = byte;
            }
            written += 1;
        }
        Ok(written)
    }
}

pub(crate) fn read_table<R: Read + Seek>(
    format: Format,
    content: R,
) -> Result<Rows<R>, ImportError> {
    match format {
        Format::DelimitedText { delimiter } => read_delimited(content, delimiter),
        Format::Spreadsheet => {
            read_spreadsheet(content).map(|rows| Rows::Sheet(rows.into_iter()))
        }
    }
}

fn read_delimited<R: Read>(content: R, delimiter: u8) -> Result<Rows<R>, ImportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(true)
        .from_reader(KeepBlankLines::new(content, delimiter));

    let headers = rdr
        .headers()
        .map_err(|e| ImportError::parse(Some(1), e))?
        .iter()
        .map(column_key)
        .collect();

    Ok(Rows::Delimited {
        headers,
        records: rdr.into_records(),
    })
}

/// The first worksheet, with its first non-empty row as the header.
fn read_spreadsheet<R: Read + Seek>(content: R) -> Result<Vec<RawRow>, ImportError> {
    let mut workbook: Xlsx<R> = Xlsx::new(content).map_err(|e| ImportError::parse(None, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::parse(None, ParseFailure::NoWorksheet))?
        .map_err(|e| ImportError::parse(None, e))?;

    Ok(sheet_rows(&range))
}

fn sheet_rows(range: &Range<Data>) -> Vec<RawRow> {
    let first_row = range.start().map_or(0, |(row, _)| u64::from(row));
    let mut rows = range.rows().enumerate();

    let headers: Vec<String> = match rows
        .by_ref()
        .find(|(_, row)| row.iter().any(|c| !matches!(c, Data::Empty)))
    {
        Some((_, row)) => row.iter().map(|c| column_key(&cell_to_header(c))).collect(),
        None => return Vec::new(),
    };

    rows.map(|(idx, row)| RawRow {
        line: first_row + idx as u64 + 1,
        cells: zip_cells(&headers, row.iter().map(convert_cell))
            .into_iter()
            .filter_map(|(column, cell)| cell.map(|c| (column, c)))
            .collect(),
    })
    .collect()
}

fn zip_cells<C>(headers: &[String], cells: impl Iterator<Item = C>) -> HashMap<String, C> {
    let mut map = HashMap::with_capacity(headers.len());
    for (header, cell) in headers.iter().zip(cells) {
        if header.is_empty() {
            continue;
        }
        map.entry(header.clone()).or_insert(cell);
    }
    map
}

fn column_key(label: &str) -> String {
    label.trim_start_matches('\u{feff}').trim().to_lowercase()
}

fn cell_to_header(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn convert_cell(c: &Data) -> Option<Cell> {
    match c {
        Data::Empty => None,
        Data::String(s) => Some(Cell::Text(s.clone())),
        Data::Int(i) => Some(Cell::Number(*i as f64)),
        Data::Float(f) => Some(Cell::Number(*f)),
        Data::Bool(b) => Some(Cell::Text(b.to_string())),
        Data::DateTime(dt) => Some(Cell::Text(excel_serial_to_date(dt.as_f64()).map_or_else(
            || dt.as_f64().to_string(),
            |d| d.format("%Y-%m-%d").to_string(),
        ))),
        Data::DateTimeIso(s) => Some(Cell::Text(s.clone())),
        Data::DurationIso(s) => Some(Cell::Text(s.clone())),
        Data::Error(e) => Some(Cell::Text(format!("{e:?}"))),
    }
}

/// Excel stores dates as days since 1899-12-30 (the 1900 leap-year bug is
/// baked into that epoch).
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(Days::new(serial.trunc() as u64))
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;

// src/grid.rs
//
// Tabular ingest: turns raw spreadsheet/CSV bytes into a normalized grid of
// cells. No schema knowledge lives here; the sheet parsers decide what the
// rows mean.

use std::io::Cursor;

use calamine::{Data, Reader};
use tracing::{debug, info};

use crate::PipelineError;

/// A single cell value, resolved once at ingest. Downstream code pattern
/// matches instead of re-guessing string vs number per access.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    /// Trimmed textual content, `None` for empty/whitespace-only cells.
    /// Numbers stringify the way they would display.
    pub fn text(&self) -> Option<String> {
        match self {
            Cell::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Cell::Number(n) => Some(format_number(*n)),
            Cell::Empty => None,
        }
    }

    /// Numeric content. Text cells get a `parseFloat`-style leading-prefix
    /// parse so values like "1500.50 " or "350/day" still yield a number.
    pub fn number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => parse_float_prefix(s),
            Cell::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Parses the longest leading float out of a string, like JS `parseFloat`.
/// Returns `None` when the string does not start with a number.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let s = s.trim();
    let bytes = s.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, b) in bytes.iter().enumerate() {
        match b {
            b'+' | b'-' if i == 0 => {}
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + 1;
    }
    if !seen_digit {
        return None;
    }
    s[..end].parse::<f64>().ok()
}

/// Leading-integer parse, like JS `parseInt` with base 10.
pub fn parse_int_prefix(s: &str) -> Option<i32> {
    let s = s.trim();
    let bytes = s.as_bytes();
    let mut end = 0;
    let mut seen_digit = false;
    for (i, b) in bytes.iter().enumerate() {
        match b {
            b'+' | b'-' if i == 0 => {}
            b'0'..=b'9' => seen_digit = true,
            _ => break,
        }
        end = i + 1;
    }
    if !seen_digit {
        return None;
    }
    s[..end].parse::<i32>().ok()
}

/// One ingested sheet: the declared file name plus its rows. Rows are not
/// guaranteed rectangular; missing trailing cells simply are not there.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub file_name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&Cell::Empty)
    }
}

const CSV_EXTENSIONS: &[&str] = &["csv"];
const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xls"];

/// Decodes raw file bytes into a [`Sheet`]. The extension of `file_name`
/// picks the decoder; only the first worksheet of a workbook is read.
pub fn read_sheet(bytes: &[u8], file_name: &str) -> Result<Sheet, PipelineError> {
    let extension = file_name
        .rsplit('.')
        .next()
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let rows = if CSV_EXTENSIONS.contains(&extension.as_str()) {
        read_csv_rows(bytes, file_name)?
    } else if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
        read_workbook_rows(bytes, file_name)?
    } else {
        return Err(PipelineError::Ingest {
            file: file_name.to_string(),
            reason: format!("unsupported file type '.{}'", extension),
        });
    };

    info!("Parsed {}: {} rows", file_name, rows.len());
    Ok(Sheet {
        file_name: file_name.to_string(),
        rows,
    })
}

fn read_csv_rows(bytes: &[u8], file_name: &str) -> Result<Vec<Vec<Cell>>, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| PipelineError::Ingest {
            file: file_name.to_string(),
            reason: format!("CSV decode failed: {}", e),
        })?;
        let cells: Vec<Cell> = record.iter().map(cell_from_field).collect();
        if cells.iter().all(Cell::is_empty) {
            continue; // blank row
        }
        rows.push(cells);
    }
    debug!("CSV {}: {} non-blank rows", file_name, rows.len());
    Ok(rows)
}

fn cell_from_field(field: &str) -> Cell {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Cell::Empty;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Cell::Number(n),
        _ => Cell::Text(field.to_string()),
    }
}

fn read_workbook_rows(bytes: &[u8], file_name: &str) -> Result<Vec<Vec<Cell>>, PipelineError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook =
        calamine::open_workbook_auto_from_rs(cursor).map_err(|e| PipelineError::Ingest {
            file: file_name.to_string(),
            reason: format!("workbook open failed: {}", e),
        })?;

    // First sheet only; later sheets are ignored.
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PipelineError::Ingest {
            file: file_name.to_string(),
            reason: "workbook contains no sheets".to_string(),
        })?
        .map_err(|e| PipelineError::Ingest {
            file: file_name.to_string(),
            reason: format!("worksheet read failed: {}", e),
        })?;

    let mut rows = Vec::new();
    for row in range.rows() {
        let cells: Vec<Cell> = row.iter().map(cell_from_data).collect();
        if cells.iter().all(Cell::is_empty) {
            continue;
        }
        rows.push(cells);
    }
    debug!("Workbook {}: {} non-blank rows", file_name, rows.len());
    Ok(rows)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => {
            if s.trim().is_empty() {
                Cell::Empty
            } else {
                Cell::Text(s.clone())
            }
        }
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}

// src/sales.rs
//
// Sales sheet normalization: per-date revenue-channel figures and the net
// sales basis used for incentive slabs. Online revenue counts at 40%.

use serde::Serialize;
use tracing::info;

use crate::dates::{
    from_serial_code, parse_dash_date, parse_slash_date, CanonicalDate, DateOrderPolicy,
};
use crate::grid::{Cell, Sheet};
use crate::PipelineError;

const HEADER_SCAN_ROWS: usize = 10;

/// Weight of the online channel toward incentive-eligible revenue.
pub const ONLINE_SALES_FACTOR: f64 = 0.4;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesRow {
    pub date: CanonicalDate,
    pub cash: f64,
    pub card: f64,
    pub other: f64,
    pub online: f64,
    pub net_sales: f64,
}

#[derive(Debug, Clone)]
pub struct SalesSheet {
    pub rows: Vec<SalesRow>,
    pub month: u32,
    pub year: i32,
}

struct SalesColumns {
    date: Option<usize>,
    cash: Option<usize>,
    card: Option<usize>,
    other: Option<usize>,
    online: Option<usize>,
}

struct ResolvedColumns {
    date: usize,
    cash: usize,
    card: usize,
    other: usize,
    online: usize,
}

impl SalesColumns {
    fn resolved(&self) -> Option<ResolvedColumns> {
        Some(ResolvedColumns {
            date: self.date?,
            cash: self.cash?,
            card: self.card?,
            other: self.other?,
            online: self.online?,
        })
    }

    fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.date.is_none() {
            missing.push("Date");
        }
        if self.cash.is_none() {
            missing.push("Cash");
        }
        if self.card.is_none() {
            missing.push("Card");
        }
        if self.other.is_none() {
            missing.push("Other");
        }
        if self.online.is_none() {
            missing.push("Online");
        }
        missing
    }
}

/// Parses a sales sheet. Column headers match exactly (case-insensitive,
/// trimmed) on "date", "cash", "card", "other", "online", order-independent;
/// first match wins per column.
pub fn parse_sales_sheet(sheet: &Sheet) -> Result<SalesSheet, PipelineError> {
    if sheet.rows.len() < 2 {
        return Err(PipelineError::NoData {
            source_name: sheet.file_name.clone(),
            reason: "sales sheet is empty or invalid".to_string(),
        });
    }

    let mut cols = SalesColumns {
        date: None,
        cash: None,
        card: None,
        other: None,
        online: None,
    };
    let mut found: Option<(usize, ResolvedColumns)> = None;

    for (i, row) in sheet.rows.iter().take(HEADER_SCAN_ROWS).enumerate() {
        for (j, cell) in row.iter().enumerate() {
            let lowered = cell.text().map(|t| t.to_lowercase()).unwrap_or_default();
            match lowered.as_str() {
                "date" if cols.date.is_none() => cols.date = Some(j),
                "cash" if cols.cash.is_none() => cols.cash = Some(j),
                "card" if cols.card.is_none() => cols.card = Some(j),
                "other" if cols.other.is_none() => cols.other = Some(j),
                "online" if cols.online.is_none() => cols.online = Some(j),
                _ => {}
            }
        }
        if let Some(resolved) = cols.resolved() {
            found = Some((i, resolved));
            break;
        }
    }

    let Some((header_index, cols)) = found else {
        return Err(PipelineError::Schema {
            source_name: sheet.file_name.clone(),
            reason: format!(
                "could not find required columns in sales sheet: {}",
                cols.missing().join(", ")
            ),
        });
    };

    let mut rows: Vec<SalesRow> = Vec::new();
    let mut detected: Option<(u32, i32)> = None;

    for row in &sheet.rows[header_index + 1..] {
        let date_cell = row.get(cols.date).unwrap_or(&Cell::Empty);
        let Some(date_text_or_code) = classify_date_cell(date_cell) else {
            continue; // empty date cell
        };

        // Subtotal rows carry "total"/"sub" in the date column.
        if let DateCell::Text(ref text) = date_text_or_code {
            let lowered = text.to_lowercase();
            if lowered.contains("total") || lowered.contains("sub") {
                continue;
            }
        }

        let Some(date) = parse_sales_date(&date_text_or_code) else {
            continue; // unparsable dates are skipped, not fatal
        };

        if detected.is_none() {
            detected = Some((date.month, date.year));
        }

        let cash = numeric_at(row, cols.cash);
        let card = numeric_at(row, cols.card);
        let other = numeric_at(row, cols.other);
        let online = numeric_at(row, cols.online);
        let net_sales = cash + card + other + online * ONLINE_SALES_FACTOR;

        rows.push(SalesRow {
            date,
            cash,
            card,
            other,
            online,
            net_sales,
        });
    }

    let Some((month, year)) = detected else {
        return Err(PipelineError::NoData {
            source_name: sheet.file_name.clone(),
            reason: "no valid sales data found in the sheet".to_string(),
        });
    };

    info!(
        "Sales {}: {} day rows ({} {})",
        sheet.file_name,
        rows.len(),
        crate::dates::month_name(month),
        year
    );
    Ok(SalesSheet { rows, month, year })
}

enum DateCell {
    Text(String),
    Code(f64),
}

fn classify_date_cell(cell: &Cell) -> Option<DateCell> {
    match cell {
        Cell::Number(code) => Some(DateCell::Code(*code)),
        Cell::Text(_) => cell.text().map(DateCell::Text),
        Cell::Empty => None,
    }
}

fn parse_sales_date(cell: &DateCell) -> Option<CanonicalDate> {
    match cell {
        DateCell::Code(code) => from_serial_code(*code),
        DateCell::Text(text) => {
            if text.contains('-') {
                parse_dash_date(text)
            } else if text.contains('/') {
                parse_slash_date(text, DateOrderPolicy::DetectPreferMonthFirst)
            } else {
                None
            }
        }
    }
}

fn numeric_at(row: &[Cell], col: usize) -> f64 {
    row.get(col).and_then(Cell::number).unwrap_or(0.0)
}

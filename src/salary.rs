// src/salary.rs
//
// Salary sheet normalization: a row holding a "Name" cell and a "Salary"
// cell heads the table, rows below map employee -> base monthly salary.

use tracing::{info, warn};

use crate::grid::{Cell, Sheet};
use crate::PipelineError;

const HEADER_SCAN_ROWS: usize = 10;

/// Employee -> base salary, in sheet row order. An ordered pair list rather
/// than a map: downstream tables display employees in this order.
#[derive(Debug, Clone, Default)]
pub struct SalaryBook {
    pub entries: Vec<(String, f64)>,
}

impl SalaryBook {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, salary)| *salary)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    fn upsert(&mut self, name: String, salary: f64) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = salary,
            None => self.entries.push((name, salary)),
        }
    }
}

/// Parses a salary sheet. The "name" and "salary" header cells are searched
/// cell by cell across the first 10 rows, first match winning per kind; the
/// header row is the row at which both have been seen.
pub fn parse_salary_sheet(sheet: &Sheet) -> Result<SalaryBook, PipelineError> {
    if sheet.rows.len() < 2 {
        return Err(PipelineError::NoData {
            source_name: sheet.file_name.clone(),
            reason: "salary sheet is empty or invalid".to_string(),
        });
    }

    let mut name_col: Option<usize> = None;
    let mut salary_col: Option<usize> = None;
    let mut header_index: Option<usize> = None;

    for (i, row) in sheet.rows.iter().take(HEADER_SCAN_ROWS).enumerate() {
        for (j, cell) in row.iter().enumerate() {
            let lowered = cell.text().map(|t| t.to_lowercase()).unwrap_or_default();
            if lowered.contains("name") && name_col.is_none() {
                name_col = Some(j);
            }
            if lowered.contains("salary") && salary_col.is_none() {
                salary_col = Some(j);
            }
        }
        if name_col.is_some() && salary_col.is_some() {
            header_index = Some(i);
            break;
        }
    }

    let (Some(name_col), Some(salary_col), Some(header_index)) =
        (name_col, salary_col, header_index)
    else {
        return Err(PipelineError::Schema {
            source_name: sheet.file_name.clone(),
            reason: "could not find \"Name\" and \"Salary\" columns".to_string(),
        });
    };

    let mut book = SalaryBook::default();
    for row in &sheet.rows[header_index + 1..] {
        let Some(name) = row.get(name_col).and_then(Cell::text) else {
            continue;
        };
        let salary = row
            .get(salary_col)
            .and_then(Cell::number)
            .unwrap_or_else(|| {
                warn!("Unparsable salary for {}; treating as 0", name);
                0.0
            });
        book.upsert(name, salary);
    }

    if book.entries.is_empty() {
        return Err(PipelineError::Validation {
            errors: vec!["No employees found in salary sheet".to_string()],
        });
    }

    info!(
        "Salary {}: {} employees",
        sheet.file_name,
        book.entries.len()
    );
    Ok(book)
}

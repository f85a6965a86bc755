// src/attendance.rs
//
// Attendance sheet normalization and the marker table. Two sheet shapes are
// handled: the payroll shape (`Day, Date, <employee>...`, strict DD/MM/YYYY
// dates) and the incentive shape (`Date, <employee>...`, ambiguous dates).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::dates::{from_serial_code, parse_slash_date, CanonicalDate, DateOrderPolicy};
use crate::grid::{Cell, Sheet};
use crate::PipelineError;

/// Header cells that are empty or read like "x", "XX", "xxxx" are unused
/// column placeholders, not employees.
static PLACEHOLDER_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^x+$").expect("placeholder regex is valid"));

const HEADER_SCAN_ROWS: usize = 10;

/// Whether a marker deducts from, adds to, or leaves the salary untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerEffect {
    Neutral,
    Deduction,
    Addition,
}

/// Day-equivalent and effect of one attendance marker code.
#[derive(Debug, Clone, Copy)]
pub struct MarkerInfo {
    pub label: &'static str,
    pub days: f64,
    pub effect: MarkerEffect,
}

/// The recognized marker codes. Anything else is silently ignored: no
/// deduction, no addition, no warning.
pub fn marker_info(code: &str) -> Option<MarkerInfo> {
    let info = match code {
        "P" => MarkerInfo {
            label: "Present",
            days: 0.0,
            effect: MarkerEffect::Neutral,
        },
        "A" => MarkerInfo {
            label: "Leave/Absent",
            days: 1.0,
            effect: MarkerEffect::Deduction,
        },
        "X" => MarkerInfo {
            label: "Week Off",
            days: 0.0,
            effect: MarkerEffect::Neutral,
        },
        "H" => MarkerInfo {
            label: "Half Day",
            days: 0.5,
            effect: MarkerEffect::Deduction,
        },
        "W" => MarkerInfo {
            label: "Weekend worked",
            days: 2.0,
            effect: MarkerEffect::Deduction,
        },
        "N" => MarkerInfo {
            label: "No Show",
            days: 1.5,
            effect: MarkerEffect::Deduction,
        },
        "O" => MarkerInfo {
            label: "Overtime",
            days: 1.0,
            effect: MarkerEffect::Addition,
        },
        _ => return None,
    };
    Some(info)
}

/// One marker applied to one employee on one date. The code is stored
/// trimmed and uppercased; blank cells default to "A".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceEntry {
    pub date: CanonicalDate,
    pub marker: String,
}

/// A normalized attendance sheet. Employees keep their column order and
/// dates keep their row order; nothing is re-sorted here.
#[derive(Debug, Clone)]
pub struct AttendanceSheet {
    pub employees: Vec<(String, Vec<AttendanceEntry>)>,
    pub dates: Vec<CanonicalDate>,
    pub month: u32,
    pub year: i32,
}

impl AttendanceSheet {
    pub fn employee_names(&self) -> impl Iterator<Item = &str> {
        self.employees.iter().map(|(name, _)| name.as_str())
    }

    pub fn entries_for(&self, name: &str) -> Option<&[AttendanceEntry]> {
        self.employees
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, entries)| entries.as_slice())
    }
}

enum SheetShape {
    /// `Day, Date, <employee>...` — employees from column 2, date in
    /// column 1, dates always day-first.
    Payroll,
    /// `Date, <employee>...` — employees from column 1, date in column 0,
    /// dates under the detection policy.
    Incentive,
}

impl SheetShape {
    fn date_column(&self) -> usize {
        match self {
            SheetShape::Payroll => 1,
            SheetShape::Incentive => 0,
        }
    }

    fn first_employee_column(&self) -> usize {
        match self {
            SheetShape::Payroll => 2,
            SheetShape::Incentive => 1,
        }
    }

    fn date_policy(&self) -> DateOrderPolicy {
        match self {
            SheetShape::Payroll => DateOrderPolicy::DayFirst,
            SheetShape::Incentive => DateOrderPolicy::DetectPreferMonthFirst,
        }
    }

    fn header_matches(&self, row: &[Cell]) -> bool {
        let first = row
            .first()
            .and_then(Cell::text)
            .map(|t| t.to_lowercase())
            .unwrap_or_default();
        match self {
            SheetShape::Payroll => {
                let second = row
                    .get(1)
                    .and_then(Cell::text)
                    .map(|t| t.to_lowercase())
                    .unwrap_or_default();
                first.contains("day") && second.contains("date")
            }
            SheetShape::Incentive => first.contains("date"),
        }
    }

    fn header_description(&self) -> &'static str {
        match self {
            SheetShape::Payroll => "header row with \"Day\" and \"Date\" columns",
            SheetShape::Incentive => "header row with \"Date\" column",
        }
    }
}

/// Parses a payroll attendance sheet (`Day, Date, <employee>...`).
pub fn parse_attendance_sheet(sheet: &Sheet) -> Result<AttendanceSheet, PipelineError> {
    parse_with_shape(sheet, SheetShape::Payroll)
}

/// Parses an incentive attendance sheet (`Date, <employee>...`).
pub fn parse_incentive_attendance_sheet(sheet: &Sheet) -> Result<AttendanceSheet, PipelineError> {
    parse_with_shape(sheet, SheetShape::Incentive)
}

fn parse_with_shape(sheet: &Sheet, shape: SheetShape) -> Result<AttendanceSheet, PipelineError> {
    if sheet.rows.len() < 2 {
        return Err(PipelineError::NoData {
            source_name: sheet.file_name.clone(),
            reason: "attendance sheet is empty or invalid".to_string(),
        });
    }

    let header_index = sheet
        .rows
        .iter()
        .take(HEADER_SCAN_ROWS)
        .position(|row| shape.header_matches(row))
        .ok_or_else(|| PipelineError::Schema {
            source_name: sheet.file_name.clone(),
            reason: format!("could not find {}", shape.header_description()),
        })?;

    let header_row = &sheet.rows[header_index];

    // Candidate employee columns, skipping placeholders.
    let mut columns: Vec<(String, usize)> = Vec::new();
    for (col, cell) in header_row
        .iter()
        .enumerate()
        .skip(shape.first_employee_column())
    {
        let Some(name) = cell.text() else { continue };
        if PLACEHOLDER_HEADER.is_match(&name) {
            continue;
        }
        columns.push((name, col));
    }

    let mut employees: Vec<(String, Vec<AttendanceEntry>)> = columns
        .iter()
        .map(|(name, _)| (name.clone(), Vec::new()))
        .collect();
    let mut dates: Vec<CanonicalDate> = Vec::new();
    let mut detected: Option<(u32, i32)> = None;

    for row in &sheet.rows[header_index + 1..] {
        let date_cell = row.get(shape.date_column()).unwrap_or(&Cell::Empty);
        let Some(date) = parse_attendance_date(date_cell, shape.date_policy()) else {
            continue;
        };

        // Month/year come from the first parsed date; later rows are not
        // cross-checked against it.
        if detected.is_none() {
            detected = Some((date.month, date.year));
        }
        dates.push(date);

        for (slot, (_, col)) in columns.iter().enumerate() {
            let marker = row
                .get(*col)
                .and_then(Cell::text)
                .map(|t| t.to_uppercase())
                .unwrap_or_else(|| "A".to_string());
            employees[slot].1.push(AttendanceEntry { date, marker });
        }
    }

    let mut problems = Vec::new();
    if employees.is_empty() {
        problems.push("No employees found in attendance sheet".to_string());
    }
    if dates.is_empty() {
        problems.push("No dates found in attendance sheet".to_string());
    }
    let Some((month, year)) = detected else {
        problems.push("Could not detect month/year from attendance sheet".to_string());
        return Err(PipelineError::Validation { errors: problems });
    };
    if !problems.is_empty() {
        return Err(PipelineError::Validation { errors: problems });
    }

    info!(
        "Attendance {}: {} employees, {} dates ({} {})",
        sheet.file_name,
        employees.len(),
        dates.len(),
        crate::dates::month_name(month),
        year
    );
    Ok(AttendanceSheet {
        employees,
        dates,
        month,
        year,
    })
}

fn parse_attendance_date(cell: &Cell, policy: DateOrderPolicy) -> Option<CanonicalDate> {
    match cell {
        Cell::Number(code) => from_serial_code(*code),
        Cell::Text(_) => {
            let text = cell.text()?;
            parse_slash_date(&text, policy)
        }
        Cell::Empty => None,
    }
}

/// Sums deduction and addition day-equivalents for a marker sequence.
/// Breakdown rows exist only for markers with a nonzero day effect.
#[derive(Debug, Clone, Serialize)]
pub struct BreakdownItem {
    pub date: CanonicalDate,
    pub marker: String,
    pub days: f64,
    #[serde(rename = "type")]
    pub effect: MarkerEffect,
    pub label: String,
}

#[derive(Debug, Clone, Default)]
pub struct AttendanceTotals {
    pub deduction_days: f64,
    pub addition_days: f64,
    pub breakdown: Vec<BreakdownItem>,
}

pub fn calculate_attendance_days(entries: &[AttendanceEntry]) -> AttendanceTotals {
    let mut totals = AttendanceTotals::default();

    for entry in entries {
        let code = entry.marker.to_uppercase();
        let Some(info) = marker_info(&code) else {
            debug!("Ignoring unknown marker '{}' on {}", entry.marker, entry.date);
            continue;
        };

        match info.effect {
            MarkerEffect::Deduction if info.days > 0.0 => {
                totals.deduction_days += info.days;
            }
            MarkerEffect::Addition if info.days > 0.0 => {
                totals.addition_days += info.days;
            }
            _ => continue,
        }

        totals.breakdown.push(BreakdownItem {
            date: entry.date,
            marker: code,
            days: info.days,
            effect: info.effect,
            label: info.label.to_string(),
        });
    }

    totals
}

/// Merges per-outlet attendance into one chronological sequence. The sort is
/// stable, so entries on the same date keep their outlet order.
pub fn merge_attendance(outlets: &[&[AttendanceEntry]]) -> Vec<AttendanceEntry> {
    let mut combined: Vec<AttendanceEntry> = Vec::new();
    for outlet in outlets {
        combined.extend_from_slice(outlet);
    }
    combined.sort_by_key(|entry| entry.date);
    combined
}

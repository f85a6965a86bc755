// src/roster.rs
//
// Cross-validation of employee identity sets across sheets, plus the small
// input validators (manual entries, uploaded file sets). Mismatches here are
// advisory: they produce warnings, never errors.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningKind {
    Warning,
    Info,
}

/// Advisory note produced while reconciling inputs. Never blocks a
/// calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterWarning {
    #[serde(rename = "type")]
    pub kind: WarningKind,
    pub message: String,
}

impl RosterWarning {
    pub fn warning(message: impl Into<String>) -> Self {
        RosterWarning {
            kind: WarningKind::Warning,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        RosterWarning {
            kind: WarningKind::Info,
            message: message.into(),
        }
    }
}

/// Reconciles the attendance and salary employee sets. The roster is the
/// sorted union; one-sided names only produce warnings.
pub fn cross_validate_employees(
    attendance_names: &BTreeSet<String>,
    salary_names: &BTreeSet<String>,
) -> (Vec<String>, Vec<RosterWarning>) {
    let mut warnings = Vec::new();

    for name in attendance_names {
        if !salary_names.contains(name) {
            warnings.push(RosterWarning::warning(format!(
                "{} appears in attendance but not in salary sheet. Base salary will be 0.",
                name
            )));
        }
    }
    for name in salary_names {
        if !attendance_names.contains(name) {
            warnings.push(RosterWarning::info(format!(
                "{} appears in salary sheet but not in attendance. No deductions will apply.",
                name
            )));
        }
    }

    let roster: Vec<String> = attendance_names.union(salary_names).cloned().collect();
    info!(
        "Roster: {} employees, {} reconciliation notes",
        roster.len(),
        warnings.len()
    );
    (roster, warnings)
}

static ENTRY_DATE_DDMMYYYY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("entry date regex is valid"));
static ENTRY_DATE_YYYYMMDD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("entry date regex is valid"));

/// Validates a manual advance/bonus entry. Invalid entries are excluded from
/// totals, not raised.
pub fn validate_entry(date: &str, amount: f64) -> Vec<String> {
    let mut errors = Vec::new();

    let date = date.trim();
    if date.is_empty() {
        errors.push("Date is required".to_string());
    } else if !ENTRY_DATE_DDMMYYYY.is_match(date) && !ENTRY_DATE_YYYYMMDD.is_match(date) {
        errors.push("Date must be in DD/MM/YYYY format".to_string());
    }

    if !amount.is_finite() || amount <= 0.0 {
        errors.push("Amount must be a positive number".to_string());
    }

    errors
}

const VALID_EXTENSIONS: &[&str] = &[".csv", ".xlsx", ".xls"];

/// Checks a set of declared input files for presence and extension. Each
/// entry is (slot label, optional file name).
pub fn validate_files(files: &[(&str, Option<&str>)]) -> Vec<String> {
    let mut errors = Vec::new();

    for (slot, file) in files {
        match file {
            None => errors.push(format!("Please upload {}", slot)),
            Some(name) => {
                let lowered = name.to_lowercase();
                if !VALID_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext)) {
                    errors.push(format!(
                        "{}: Invalid file type. Please upload CSV or Excel file",
                        slot
                    ));
                }
            }
        }
    }

    errors
}

// src/payroll.rs
//
// Payroll calculation: merges multi-outlet attendance, converts markers and
// manual entries into monetary deltas and derives the net salary. Results
// are computed fresh per run; nothing is cached between runs.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::attendance::{
    calculate_attendance_days, merge_attendance, AttendanceEntry, AttendanceSheet, BreakdownItem,
};
use crate::dates::{days_in_month, month_name};
use crate::roster::{cross_validate_employees, validate_entry, RosterWarning};
use crate::salary::SalaryBook;
use crate::PipelineError;

/// A user-supplied advance or bonus against one employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualEntry {
    pub date: String,
    pub amount: f64,
}

/// Per-employee payroll outcome. Superseded wholesale on recalculation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollResult {
    pub employee_name: String,
    pub base_salary: f64,
    pub daily_rate: f64,
    pub days_in_month: u32,
    pub deduction_days: f64,
    pub addition_days: f64,
    pub attendance_deduction: f64,
    pub attendance_addition: f64,
    pub attendance_breakdown: Vec<BreakdownItem>,
    pub advances: Vec<ManualEntry>,
    pub total_advances: f64,
    pub bonuses: Vec<ManualEntry>,
    pub total_bonuses: f64,
    pub net_salary: f64,
    pub month: u32,
    pub year: i32,
}

pub struct EmployeeCalcInput<'a> {
    pub employee_name: &'a str,
    pub base_salary: f64,
    pub attendance_outlet1: &'a [AttendanceEntry],
    pub attendance_outlet2: &'a [AttendanceEntry],
    pub advances: Vec<ManualEntry>,
    pub bonuses: Vec<ManualEntry>,
    pub month: u32,
    pub year: i32,
}

/// Computes one employee's payroll.
///
/// `netSalary = baseSalary - attendanceDeduction - totalAdvances
///            + attendanceAddition + totalBonuses`
///
/// No clamping: the result may go negative when deductions exceed pay, and
/// that is surfaced rather than rejected.
pub fn calculate_net_salary(input: EmployeeCalcInput<'_>) -> PayrollResult {
    let days = days_in_month(input.month, input.year);
    let daily_rate = input.base_salary / days as f64;

    let combined = merge_attendance(&[input.attendance_outlet1, input.attendance_outlet2]);
    let totals = calculate_attendance_days(&combined);

    let attendance_deduction = daily_rate * totals.deduction_days;
    let attendance_addition = daily_rate * totals.addition_days;

    let advances = retain_valid_entries(input.employee_name, "advance", input.advances);
    let bonuses = retain_valid_entries(input.employee_name, "bonus", input.bonuses);
    let total_advances: f64 = advances.iter().map(|e| e.amount).sum();
    let total_bonuses: f64 = bonuses.iter().map(|e| e.amount).sum();

    let net_salary = input.base_salary - attendance_deduction - total_advances
        + attendance_addition
        + total_bonuses;

    PayrollResult {
        employee_name: input.employee_name.to_string(),
        base_salary: input.base_salary,
        daily_rate,
        days_in_month: days,
        deduction_days: totals.deduction_days,
        addition_days: totals.addition_days,
        attendance_deduction,
        attendance_addition,
        attendance_breakdown: totals.breakdown,
        advances,
        total_advances,
        bonuses,
        total_bonuses,
        net_salary,
        month: input.month,
        year: input.year,
    }
}

/// Malformed manual entries are excluded from totals, not raised.
fn retain_valid_entries(employee: &str, label: &str, entries: Vec<ManualEntry>) -> Vec<ManualEntry> {
    let mut kept = Vec::with_capacity(entries.len());
    for entry in entries {
        let problems = validate_entry(&entry.date, entry.amount);
        if problems.is_empty() {
            kept.push(entry);
        } else {
            warn!(
                "Dropping {} entry for {} ({} / {}): {}",
                label,
                employee,
                entry.date,
                entry.amount,
                problems.join("; ")
            );
        }
    }
    kept
}

/// Manual entries keyed by employee name.
pub type ManualEntryBook = HashMap<String, Vec<ManualEntry>>;

/// The three parsed payroll inputs for one month.
pub struct PayrollInputs {
    pub outlet1: AttendanceSheet,
    pub outlet2: AttendanceSheet,
    pub salary: SalaryBook,
}

/// Runs the full payroll pipeline: period gate, roster reconciliation, then
/// one calculation per roster employee. Results come back in roster
/// (alphabetical) order together with the reconciliation warnings.
pub fn run_payroll(
    inputs: &PayrollInputs,
    advances: &ManualEntryBook,
    bonuses: &ManualEntryBook,
) -> Result<(Vec<PayrollResult>, Vec<RosterWarning>), PipelineError> {
    let (outlet1, outlet2) = (&inputs.outlet1, &inputs.outlet2);

    // Both outlets must report the same month.
    if outlet1.month != outlet2.month || outlet1.year != outlet2.year {
        return Err(PipelineError::PeriodMismatch {
            left: format!("{} {}", month_name(outlet1.month), outlet1.year),
            right: format!("{} {}", month_name(outlet2.month), outlet2.year),
        });
    }
    let (month, year) = (outlet1.month, outlet1.year);

    // Serial-code typos can land a sheet centuries away; refuse to pay those.
    if !(2000..=2100).contains(&year) {
        return Err(PipelineError::Validation {
            errors: vec![format!("Year must be between 2000 and 2100 (got {})", year)],
        });
    }

    let attendance_names: BTreeSet<String> = outlet1
        .employee_names()
        .chain(outlet2.employee_names())
        .map(str::to_string)
        .collect();
    let salary_names: BTreeSet<String> = inputs.salary.names().map(str::to_string).collect();

    let (roster, warnings) = cross_validate_employees(&attendance_names, &salary_names);
    if roster.is_empty() {
        return Err(PipelineError::Validation {
            errors: vec!["No employees found in any input sheet".to_string()],
        });
    }

    let mut results = Vec::with_capacity(roster.len());
    for name in &roster {
        let base_salary = inputs.salary.get(name).unwrap_or(0.0);
        let result = calculate_net_salary(EmployeeCalcInput {
            employee_name: name,
            base_salary,
            attendance_outlet1: outlet1.entries_for(name).unwrap_or(&[]),
            attendance_outlet2: outlet2.entries_for(name).unwrap_or(&[]),
            advances: advances.get(name).cloned().unwrap_or_default(),
            bonuses: bonuses.get(name).cloned().unwrap_or_default(),
            month,
            year,
        });
        results.push(result);
    }

    info!(
        "Payroll computed for {} employees ({} {})",
        results.len(),
        month_name(month),
        year
    );
    Ok((results, warnings))
}

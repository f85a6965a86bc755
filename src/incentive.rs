// src/incentive.rs
//
// Sales-slab incentive pools: matches sales days against attendance days,
// applies the slab thresholds to produce a daily pool and splits the pool
// among employees marked present.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::attendance::AttendanceSheet;
use crate::dates::{month_name, CanonicalDate};
use crate::roster::RosterWarning;
use crate::sales::SalesSheet;
use crate::PipelineError;

/// Slab thresholds and pool amounts for one calculation run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlabConfig {
    pub slab1_amount: f64,
    pub slab1_incentive: f64,
    pub slab2_amount: f64,
    pub slab2_incentive: f64,
}

/// Pre-calculation gate: all values non-negative, slab 2 strictly above
/// slab 1. Returns every violated rule, not just the first.
pub fn validate_slabs(slabs: &SlabConfig) -> Vec<String> {
    let mut errors = Vec::new();

    let fields = [
        ("Slab 1 Amount", slabs.slab1_amount),
        ("Slab 1 Incentive", slabs.slab1_incentive),
        ("Slab 2 Amount", slabs.slab2_amount),
        ("Slab 2 Incentive", slabs.slab2_incentive),
    ];
    for (label, value) in fields {
        if !value.is_finite() {
            errors.push(format!("{} is required", label));
        } else if value < 0.0 {
            errors.push(format!("{} must be a positive number", label));
        }
    }

    if slabs.slab2_amount <= slabs.slab1_amount {
        errors.push("Slab 2 Amount must be greater than Slab 1 Amount".to_string());
    }

    errors
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SlabApplied {
    #[serde(rename = "None")]
    None,
    #[serde(rename = "Slab 1")]
    Slab1,
    #[serde(rename = "Slab 2")]
    Slab2,
}

impl std::fmt::Display for SlabApplied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SlabApplied::None => "None",
            SlabApplied::Slab1 => "Slab 1",
            SlabApplied::Slab2 => "Slab 2",
        };
        write!(f, "{}", label)
    }
}

/// One employee's share of one day's pool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeShare {
    pub employee: String,
    pub amount: f64,
}

/// One matched day: its pool and how it was split. The breakdown lists every
/// sheet employee, zero for anyone who received nothing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncentiveDailyResult {
    pub date: CanonicalDate,
    pub net_sales: f64,
    pub slab_applied: SlabApplied,
    pub pool: f64,
    pub present_count: usize,
    pub per_person: f64,
    pub employee_breakdown: Vec<EmployeeShare>,
}

/// Monthly accumulation per employee; `days_present` counts only days with a
/// nonzero pool share.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncentiveMonthlyResult {
    pub employee: String,
    pub days_present: u32,
    pub total_incentive: f64,
}

#[derive(Debug)]
pub struct IncentiveOutcome {
    pub daily: Vec<IncentiveDailyResult>,
    pub monthly: Vec<IncentiveMonthlyResult>,
    pub warnings: Vec<RosterWarning>,
    /// Employee names in attendance sheet (column) order, for table layout.
    pub employee_names: Vec<String>,
}

/// Runs the incentive pipeline: slab gate, period note, day matching and
/// pool distribution.
pub fn run_incentive(
    sales: &SalesSheet,
    attendance: &AttendanceSheet,
    slabs: &SlabConfig,
) -> Result<IncentiveOutcome, PipelineError> {
    let slab_errors = validate_slabs(slabs);
    if !slab_errors.is_empty() {
        return Err(PipelineError::Validation {
            errors: slab_errors,
        });
    }

    let mut warnings = Vec::new();

    // Unlike payroll, a period disagreement is tolerated here: matching is
    // per-date, so a partial overlap still produces results.
    if sales.month != attendance.month || sales.year != attendance.year {
        let message = format!(
            "Sales sheet is for {} {} but attendance sheet is for {} {}. \
             Only matching dates will be used.",
            month_name(sales.month),
            sales.year,
            month_name(attendance.month),
            attendance.year
        );
        warn!("{}", message);
        warnings.push(RosterWarning::warning(message));
    }

    let mut outcome = calculate_incentives(sales, attendance, slabs)?;
    warnings.append(&mut outcome.warnings);
    outcome.warnings = warnings;
    Ok(outcome)
}

/// The matching and arithmetic core. Only dates present in both the sales
/// and attendance maps produce a daily row; one-sided dates are counted and
/// reported in aggregate.
pub fn calculate_incentives(
    sales: &SalesSheet,
    attendance: &AttendanceSheet,
    slabs: &SlabConfig,
) -> Result<IncentiveOutcome, PipelineError> {
    let employee_names: Vec<String> = attendance
        .employee_names()
        .map(str::to_string)
        .collect();

    // Per-date lookup maps. Re-recording a date overwrites, mirroring how a
    // duplicate row in the sheet would supersede the earlier one.
    let mut sales_by_date: BTreeMap<CanonicalDate, f64> = BTreeMap::new();
    for row in &sales.rows {
        sales_by_date.insert(row.date, row.net_sales);
    }

    let mut attendance_by_date: BTreeMap<CanonicalDate, Vec<(String, String)>> = BTreeMap::new();
    for (name, entries) in &attendance.employees {
        for entry in entries {
            let day = attendance_by_date.entry(entry.date).or_default();
            match day.iter_mut().find(|(n, _)| n == name) {
                Some((_, marker)) => *marker = entry.marker.clone(),
                None => day.push((name.clone(), entry.marker.clone())),
            }
        }
    }

    let all_dates: BTreeSet<CanonicalDate> = sales_by_date
        .keys()
        .chain(attendance_by_date.keys())
        .copied()
        .collect();

    let mut tally: Vec<IncentiveMonthlyResult> = employee_names
        .iter()
        .map(|name| IncentiveMonthlyResult {
            employee: name.clone(),
            days_present: 0,
            total_incentive: 0.0,
        })
        .collect();

    let mut daily = Vec::new();
    let mut sales_only_dates = 0usize;
    let mut attendance_only_dates = 0usize;

    for date in all_dates {
        let (net_sales, day_markers) =
            match (sales_by_date.get(&date), attendance_by_date.get(&date)) {
                (Some(net), Some(markers)) => (*net, markers),
                (Some(_), None) => {
                    sales_only_dates += 1;
                    continue;
                }
                (None, Some(_)) => {
                    attendance_only_dates += 1;
                    continue;
                }
                (None, None) => continue,
            };

        // Only an exact "P" counts as present for incentive purposes;
        // payroll's broader marker set does not apply here.
        let present: Vec<&str> = day_markers
            .iter()
            .filter(|(_, marker)| marker == "P")
            .map(|(name, _)| name.as_str())
            .collect();
        let present_count = present.len();

        let (pool, slab_applied) = if net_sales >= slabs.slab2_amount {
            (slabs.slab2_incentive, SlabApplied::Slab2)
        } else if net_sales >= slabs.slab1_amount {
            (slabs.slab1_incentive, SlabApplied::Slab1)
        } else {
            (0.0, SlabApplied::None)
        };

        let mut per_person = 0.0;
        let mut shares: Vec<EmployeeShare> = Vec::with_capacity(employee_names.len());
        if present_count > 0 && pool > 0.0 {
            per_person = pool / present_count as f64;
            for entry in tally.iter_mut() {
                if present.contains(&entry.employee.as_str()) {
                    entry.days_present += 1;
                    entry.total_incentive += per_person;
                }
            }
        }
        for name in &employee_names {
            let amount = if per_person > 0.0 && present.contains(&name.as_str()) {
                per_person
            } else {
                0.0
            };
            shares.push(EmployeeShare {
                employee: name.clone(),
                amount,
            });
        }

        daily.push(IncentiveDailyResult {
            date,
            net_sales,
            slab_applied,
            pool,
            present_count,
            per_person,
            employee_breakdown: shares,
        });
    }

    let mut warnings = Vec::new();
    if sales_only_dates > 0 {
        warnings.push(RosterWarning::warning(format!(
            "{} date(s) found in sales sheet but not in attendance sheet. \
             These dates were skipped.",
            sales_only_dates
        )));
    }
    if attendance_only_dates > 0 {
        warnings.push(RosterWarning::warning(format!(
            "{} date(s) found in attendance sheet but not in sales sheet. \
             These dates were skipped.",
            attendance_only_dates
        )));
    }

    if daily.is_empty() {
        return Err(PipelineError::NoOverlap);
    }

    let mut monthly = tally;
    monthly.sort_by(|a, b| a.employee.cmp(&b.employee));

    info!(
        "Incentives: {} matched days, {} employees",
        daily.len(),
        monthly.len()
    );
    Ok(IncentiveOutcome {
        daily,
        monthly,
        warnings,
        employee_names,
    })
}

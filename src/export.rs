// src/export.rs
//
// CSV renditions of the result tables. These consume the calculation
// outputs as-is; nothing here feeds back into the pipeline.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::incentive::{IncentiveDailyResult, IncentiveMonthlyResult};
use crate::payroll::PayrollResult;

fn open_writer(path: &Path) -> Result<csv::Writer<File>> {
    let file = File::create(path)
        .with_context(|| format!("could not create export file {}", path.display()))?;
    Ok(csv::Writer::from_writer(file))
}

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

/// Writes the payroll summary table, one row per employee.
pub fn write_payroll_summary(results: &[PayrollResult], path: &Path) -> Result<()> {
    let mut writer = open_writer(path)?;

    writer.write_record([
        "Employee",
        "Base Salary",
        "Daily Rate",
        "Deduction Days",
        "Attendance Deduction",
        "Addition Days",
        "Attendance Addition",
        "Total Advances",
        "Total Bonuses",
        "Net Salary",
    ])?;

    for r in results {
        writer.write_record([
            r.employee_name.clone(),
            money(r.base_salary),
            money(r.daily_rate),
            r.deduction_days.to_string(),
            money(r.attendance_deduction),
            r.addition_days.to_string(),
            money(r.attendance_addition),
            money(r.total_advances),
            money(r.total_bonuses),
            money(r.net_salary),
        ])?;
    }

    writer.flush()?;
    info!("Wrote payroll summary to {}", path.display());
    Ok(())
}

/// Writes the daily incentive table: fixed columns, then one share column
/// per employee, then a trailing TOTAL row.
pub fn write_incentive_daily(
    daily: &[IncentiveDailyResult],
    employee_names: &[String],
    path: &Path,
) -> Result<()> {
    let mut writer = open_writer(path)?;

    let mut header: Vec<String> = [
        "Date",
        "Net Sales",
        "Slab Applied",
        "Pool Amount",
        "Present Count",
        "Per Person Incentive",
    ]
    .map(str::to_string)
    .to_vec();
    header.extend(employee_names.iter().cloned());
    writer.write_record(&header)?;

    for day in daily {
        let mut record = vec![
            day.date.to_string(),
            money(day.net_sales),
            day.slab_applied.to_string(),
            money(day.pool),
            day.present_count.to_string(),
            money(day.per_person),
        ];
        for name in employee_names {
            let share = day
                .employee_breakdown
                .iter()
                .find(|s| &s.employee == name)
                .map(|s| s.amount)
                .unwrap_or(0.0);
            record.push(money(share));
        }
        writer.write_record(&record)?;
    }

    let total_net: f64 = daily.iter().map(|d| d.net_sales).sum();
    let total_pool: f64 = daily.iter().map(|d| d.pool).sum();
    let total_present: usize = daily.iter().map(|d| d.present_count).sum();
    let mut totals = vec![
        "TOTAL".to_string(),
        money(total_net),
        String::new(),
        money(total_pool),
        total_present.to_string(),
        String::new(),
    ];
    for name in employee_names {
        let earned: f64 = daily
            .iter()
            .flat_map(|d| &d.employee_breakdown)
            .filter(|s| &s.employee == name)
            .map(|s| s.amount)
            .sum();
        totals.push(money(earned));
    }
    writer.write_record(&totals)?;

    writer.flush()?;
    info!("Wrote daily incentives to {}", path.display());
    Ok(())
}

/// Writes the monthly per-employee incentive summary with a TOTAL row.
pub fn write_incentive_monthly(monthly: &[IncentiveMonthlyResult], path: &Path) -> Result<()> {
    let mut writer = open_writer(path)?;

    writer.write_record(["Employee", "Total Days Present", "Total Incentive Earned"])?;

    for emp in monthly {
        writer.write_record([
            emp.employee.clone(),
            emp.days_present.to_string(),
            money(emp.total_incentive),
        ])?;
    }

    let total_days: u32 = monthly.iter().map(|e| e.days_present).sum();
    let total_incentive: f64 = monthly.iter().map(|e| e.total_incentive).sum();
    writer.write_record([
        "TOTAL".to_string(),
        total_days.to_string(),
        money(total_incentive),
    ])?;

    writer.flush()?;
    info!("Wrote monthly incentive summary to {}", path.display());
    Ok(())
}

// src/main.rs
//
// payrun: computes monthly payroll and sales-based incentive pools for a
// small multi-outlet business from spreadsheet inputs. One synchronous batch
// per invocation; results go to stdout as JSON or to CSV files.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use serde::Serialize;
use thiserror::Error;
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

mod attendance;
mod dates;
mod export;
mod grid;
mod incentive;
mod payroll;
mod roster;
mod salary;
mod sales;

#[cfg(test)]
mod payroll_tests;

use incentive::SlabConfig;
use payroll::{ManualEntry, ManualEntryBook, PayrollInputs};
use roster::RosterWarning;

/// Errors the pipeline can raise. Each one aborts only the sheet or
/// calculation being handled; the caller can correct the input and resubmit.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Failed to parse {file}: {reason}")]
    Ingest { file: String, reason: String },
    #[error("{source_name}: {reason}")]
    Schema { source_name: String, reason: String },
    #[error("{source_name}: {reason}")]
    NoData { source_name: String, reason: String },
    #[error("Attendance sheets must be for the same month and year (got {left} and {right})")]
    PeriodMismatch { left: String, right: String },
    #[error("Validation failed: {}", errors.join("; "))]
    Validation { errors: Vec<String> },
    #[error(
        "No matching dates found between sales and attendance sheets. \
         Please verify the date formats and ranges."
    )]
    NoOverlap,
}

/// Uploaded files are capped at 10MB.
const MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Parser)]
#[command(
    name = "payrun",
    about = "Monthly payroll and sales incentive calculator for multi-outlet retail"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute per-employee net salaries from two outlet attendance sheets
    /// and a salary sheet.
    Payroll {
        /// Attendance sheet for outlet 1 (.csv/.xlsx/.xls)
        #[arg(long)]
        outlet1: PathBuf,
        /// Attendance sheet for outlet 2 (.csv/.xlsx/.xls)
        #[arg(long)]
        outlet2: PathBuf,
        /// Salary sheet (.csv/.xlsx/.xls)
        #[arg(long)]
        salary: PathBuf,
        /// JSON file mapping employee name to a list of {date, amount} advances
        #[arg(long)]
        advances: Option<PathBuf>,
        /// JSON file mapping employee name to a list of {date, amount} bonuses
        #[arg(long)]
        bonuses: Option<PathBuf>,
        /// Directory to write CSV summaries into (JSON goes to stdout otherwise)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Compute daily incentive pools and monthly per-employee totals from a
    /// sales sheet and an attendance sheet.
    Incentive {
        /// Sales sheet with Date/Cash/Card/Other/Online columns
        #[arg(long)]
        sales: PathBuf,
        /// Attendance sheet with Date plus one column per employee
        #[arg(long)]
        attendance: PathBuf,
        /// Net sales threshold for slab 1
        #[arg(long)]
        slab1_amount: f64,
        /// Daily pool paid when slab 1 is reached
        #[arg(long)]
        slab1_incentive: f64,
        /// Net sales threshold for slab 2
        #[arg(long)]
        slab2_amount: f64,
        /// Daily pool paid when slab 2 is reached
        #[arg(long)]
        slab2_incentive: f64,
        /// Directory to write CSV summaries into (JSON goes to stdout otherwise)
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenv().ok();
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let cli = Cli::parse();
    match cli.command {
        Command::Payroll {
            outlet1,
            outlet2,
            salary,
            advances,
            bonuses,
            out_dir,
        } => run_payroll_command(
            &outlet1,
            &outlet2,
            &salary,
            advances.as_deref(),
            bonuses.as_deref(),
            out_dir.as_deref(),
        ),
        Command::Incentive {
            sales,
            attendance,
            slab1_amount,
            slab1_incentive,
            slab2_amount,
            slab2_incentive,
            out_dir,
        } => run_incentive_command(
            &sales,
            &attendance,
            SlabConfig {
                slab1_amount,
                slab1_incentive,
                slab2_amount,
                slab2_incentive,
            },
            out_dir.as_deref(),
        ),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PayrollReport {
    results: Vec<payroll::PayrollResult>,
    warnings: Vec<RosterWarning>,
}

fn run_payroll_command(
    outlet1: &Path,
    outlet2: &Path,
    salary: &Path,
    advances: Option<&Path>,
    bonuses: Option<&Path>,
    out_dir: Option<&Path>,
) -> Result<()> {
    check_file_set(&[
        ("attendance sheet for Outlet 1", outlet1),
        ("attendance sheet for Outlet 2", outlet2),
        ("salary sheet", salary),
    ])?;

    let outlet1_sheet = attendance::parse_attendance_sheet(&load_sheet(outlet1)?)?;
    let outlet2_sheet = attendance::parse_attendance_sheet(&load_sheet(outlet2)?)?;
    let salary_book = salary::parse_salary_sheet(&load_sheet(salary)?)?;

    let advances = load_entry_book(advances)?;
    let bonuses = load_entry_book(bonuses)?;

    let inputs = PayrollInputs {
        outlet1: outlet1_sheet,
        outlet2: outlet2_sheet,
        salary: salary_book,
    };
    let (results, warnings) = payroll::run_payroll(&inputs, &advances, &bonuses)?;
    for warning in &warnings {
        warn!("{}", warning.message);
    }

    if let Some(dir) = out_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("could not create output directory {}", dir.display()))?;
        export::write_payroll_summary(&results, &dir.join("payroll_summary.csv"))?;
    } else {
        let report = PayrollReport { results, warnings };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IncentiveReport {
    daily: Vec<incentive::IncentiveDailyResult>,
    monthly: Vec<incentive::IncentiveMonthlyResult>,
    warnings: Vec<RosterWarning>,
    employee_names: Vec<String>,
}

fn run_incentive_command(
    sales: &Path,
    attendance: &Path,
    slabs: SlabConfig,
    out_dir: Option<&Path>,
) -> Result<()> {
    check_file_set(&[("sales sheet", sales), ("attendance sheet", attendance)])?;

    let sales_sheet = sales::parse_sales_sheet(&load_sheet(sales)?)?;
    let attendance_sheet = attendance::parse_incentive_attendance_sheet(&load_sheet(attendance)?)?;

    let outcome = incentive::run_incentive(&sales_sheet, &attendance_sheet, &slabs)?;
    for warning in &outcome.warnings {
        warn!("{}", warning.message);
    }

    if let Some(dir) = out_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("could not create output directory {}", dir.display()))?;
        export::write_incentive_daily(
            &outcome.daily,
            &outcome.employee_names,
            &dir.join("incentive_daily.csv"),
        )?;
        export::write_incentive_monthly(&outcome.monthly, &dir.join("incentive_monthly.csv"))?;
    } else {
        let report = IncentiveReport {
            daily: outcome.daily,
            monthly: outcome.monthly,
            warnings: outcome.warnings,
            employee_names: outcome.employee_names,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn check_file_set(slots: &[(&str, &Path)]) -> Result<()> {
    let declared: Vec<(&str, Option<&str>)> = slots
        .iter()
        .map(|(slot, path)| (*slot, path.file_name().and_then(|n| n.to_str())))
        .collect();
    let errors = roster::validate_files(&declared);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::Validation { errors }.into())
    }
}

fn load_sheet(path: &Path) -> Result<grid::Sheet> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("could not stat input file {}", path.display()))?;
    if metadata.len() > MAX_INPUT_BYTES {
        return Err(PipelineError::Ingest {
            file: path.display().to_string(),
            reason: "file exceeds the 10MB input limit".to_string(),
        }
        .into());
    }

    let bytes =
        fs::read(path).with_context(|| format!("could not read input file {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("input")
        .to_string();
    Ok(grid::read_sheet(&bytes, &file_name)?)
}

/// Loads a JSON file mapping employee name -> manual entries. A missing path
/// means no entries at all.
fn load_entry_book(path: Option<&Path>) -> Result<ManualEntryBook> {
    let Some(path) = path else {
        return Ok(HashMap::new());
    };
    let bytes =
        fs::read(path).with_context(|| format!("could not read entries file {}", path.display()))?;
    let book: HashMap<String, Vec<ManualEntry>> = serde_json::from_slice(&bytes)
        .with_context(|| format!("could not parse entries file {}", path.display()))?;
    Ok(book)
}

// src/payroll_tests.rs

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};

    use crate::attendance::{AttendanceEntry, AttendanceSheet};
    use crate::dates::CanonicalDate;
    use crate::grid::{Cell, Sheet};
    use crate::payroll::*;
    use crate::roster::{cross_validate_employees, validate_entry, WarningKind};
    use crate::salary::{parse_salary_sheet, SalaryBook};
    use crate::PipelineError;

    fn cell(value: &str) -> Cell {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Cell::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(n) => Cell::Number(n),
            Err(_) => Cell::Text(value.to_string()),
        }
    }

    fn sheet_from(name: &str, rows: &[&[&str]]) -> Sheet {
        Sheet {
            file_name: name.to_string(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|v| cell(v)).collect())
                .collect(),
        }
    }

    fn date(day: u32, month: u32, year: i32) -> CanonicalDate {
        CanonicalDate::new(day, month, year).unwrap()
    }

    fn entry(day: u32, month: u32, year: i32, marker: &str) -> AttendanceEntry {
        AttendanceEntry {
            date: date(day, month, year),
            marker: marker.to_string(),
        }
    }

    /// Builds a one-month attendance sheet from (employee, markers) pairs.
    /// Day `i + 1` of the month carries `markers[i]`.
    fn attendance_sheet(
        month: u32,
        year: i32,
        employees: &[(&str, &[&str])],
    ) -> AttendanceSheet {
        let day_count = employees
            .first()
            .map(|(_, markers)| markers.len())
            .unwrap_or(0);
        let dates: Vec<CanonicalDate> = (1..=day_count as u32)
            .map(|d| date(d, month, year))
            .collect();
        AttendanceSheet {
            employees: employees
                .iter()
                .map(|(name, markers)| {
                    let entries = markers
                        .iter()
                        .enumerate()
                        .map(|(i, m)| entry(i as u32 + 1, month, year, m))
                        .collect();
                    (name.to_string(), entries)
                })
                .collect(),
            dates,
            month,
            year,
        }
    }

    fn empty_sheet(month: u32, year: i32) -> AttendanceSheet {
        AttendanceSheet {
            employees: Vec::new(),
            dates: Vec::new(),
            month,
            year,
        }
    }

    fn salary_book(entries: &[(&str, f64)]) -> SalaryBook {
        SalaryBook {
            entries: entries
                .iter()
                .map(|(name, salary)| (name.to_string(), *salary))
                .collect(),
        }
    }

    fn no_entries() -> ManualEntryBook {
        HashMap::new()
    }

    #[test]
    fn one_absence_in_a_31_day_month() {
        let outlet1 = vec![entry(10, 1, 2026, "A")];
        let result = calculate_net_salary(EmployeeCalcInput {
            employee_name: "Mohan",
            base_salary: 17000.0,
            attendance_outlet1: &outlet1,
            attendance_outlet2: &[],
            advances: Vec::new(),
            bonuses: Vec::new(),
            month: 1,
            year: 2026,
        });

        let daily_rate = 17000.0 / 31.0;
        assert_eq!(result.days_in_month, 31);
        assert!((result.daily_rate - daily_rate).abs() < 1e-6);
        assert!((result.attendance_deduction - daily_rate).abs() < 1e-6);
        assert!((result.net_salary - (17000.0 - daily_rate)).abs() < 1e-6);
        assert!((result.net_salary - 16451.61).abs() < 0.01);
    }

    #[test]
    fn net_salary_identity_holds_with_all_components() {
        let outlet1 = vec![entry(3, 2, 2026, "A"), entry(4, 2, 2026, "O")];
        let outlet2 = vec![entry(10, 2, 2026, "H")];
        let result = calculate_net_salary(EmployeeCalcInput {
            employee_name: "Priya",
            base_salary: 28000.0,
            attendance_outlet1: &outlet1,
            attendance_outlet2: &outlet2,
            advances: vec![ManualEntry {
                date: "05/02/2026".to_string(),
                amount: 2000.0,
            }],
            bonuses: vec![ManualEntry {
                date: "2026-02-20".to_string(),
                amount: 1500.0,
            }],
            month: 2,
            year: 2026,
        });

        let expected = result.base_salary - result.attendance_deduction - result.total_advances
            + result.attendance_addition
            + result.total_bonuses;
        assert!((result.net_salary - expected).abs() < 1e-6);
        assert!((result.total_advances - 2000.0).abs() < 1e-6);
        assert!((result.total_bonuses - 1500.0).abs() < 1e-6);
        // 1 (A) + 0.5 (H) deduction days, 1 (O) addition day.
        assert!((result.deduction_days - 1.5).abs() < 1e-9);
        assert!((result.addition_days - 1.0).abs() < 1e-9);
    }

    #[test]
    fn daily_rate_is_leap_year_aware() {
        let result = calculate_net_salary(EmployeeCalcInput {
            employee_name: "Mohan",
            base_salary: 29000.0,
            attendance_outlet1: &[],
            attendance_outlet2: &[],
            advances: Vec::new(),
            bonuses: Vec::new(),
            month: 2,
            year: 2024,
        });

        assert_eq!(result.days_in_month, 29);
        assert!((result.daily_rate - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn malformed_manual_entries_are_dropped_silently() {
        let result = calculate_net_salary(EmployeeCalcInput {
            employee_name: "Mohan",
            base_salary: 10000.0,
            attendance_outlet1: &[],
            attendance_outlet2: &[],
            advances: vec![
                ManualEntry {
                    date: "05/01/2026".to_string(),
                    amount: 500.0,
                },
                ManualEntry {
                    date: "05/01/2026".to_string(),
                    amount: -100.0, // non-positive
                },
                ManualEntry {
                    date: "5/1/26".to_string(), // wrong date shape
                    amount: 300.0,
                },
                ManualEntry {
                    date: String::new(),
                    amount: 200.0,
                },
            ],
            bonuses: Vec::new(),
            month: 1,
            year: 2026,
        });

        assert_eq!(result.advances.len(), 1);
        assert!((result.total_advances - 500.0).abs() < 1e-6);
        assert!((result.net_salary - 9500.0).abs() < 1e-6);
    }

    #[test]
    fn net_salary_may_go_negative() {
        let outlet1: Vec<AttendanceEntry> =
            (1..=20).map(|d| entry(d, 1, 2026, "W")).collect();
        let result = calculate_net_salary(EmployeeCalcInput {
            employee_name: "Mohan",
            base_salary: 3100.0,
            attendance_outlet1: &outlet1,
            attendance_outlet2: &[],
            advances: Vec::new(),
            bonuses: Vec::new(),
            month: 1,
            year: 2026,
        });

        // 40 deduction days at 100/day against a 3100 salary.
        assert!(result.net_salary < 0.0, "deductions exceed pay, no clamping");
        assert!((result.net_salary - (3100.0 - 4000.0)).abs() < 1e-6);
    }

    #[test]
    fn attendance_from_both_outlets_is_merged_chronologically() {
        let outlet1 = vec![entry(15, 1, 2026, "A")];
        let outlet2 = vec![entry(2, 1, 2026, "H")];
        let result = calculate_net_salary(EmployeeCalcInput {
            employee_name: "Mohan",
            base_salary: 31000.0,
            attendance_outlet1: &outlet1,
            attendance_outlet2: &outlet2,
            advances: Vec::new(),
            bonuses: Vec::new(),
            month: 1,
            year: 2026,
        });

        let breakdown_dates: Vec<String> = result
            .attendance_breakdown
            .iter()
            .map(|b| b.date.to_string())
            .collect();
        assert_eq!(breakdown_dates, vec!["02/01/2026", "15/01/2026"]);
        assert!((result.deduction_days - 1.5).abs() < 1e-9);
    }

    #[test]
    fn run_payroll_covers_the_union_roster_in_sorted_order() {
        let outlet1 = attendance_sheet(1, 2026, &[("Mohan", &["A", "P"])]);
        let outlet2 = attendance_sheet(1, 2026, &[("Zara", &["P", "P"])]);
        let salary = salary_book(&[("Priya", 20000.0), ("Mohan", 17000.0)]);

        let (results, warnings) =
            run_payroll(&PayrollInputs { outlet1, outlet2, salary }, &no_entries(), &no_entries())
                .unwrap();

        let names: Vec<&str> = results.iter().map(|r| r.employee_name.as_str()).collect();
        assert_eq!(names, vec!["Mohan", "Priya", "Zara"]);

        // Zara has no salary row: warned, paid from base 0.
        let zara = &results[2];
        assert!((zara.base_salary - 0.0).abs() < 1e-9);
        assert!(warnings.iter().any(|w| {
            w.kind == WarningKind::Warning && w.message.contains("Zara")
        }));

        // Priya has no attendance: informational note, no adjustment.
        let priya = &results[1];
        assert!((priya.attendance_deduction - 0.0).abs() < 1e-9);
        assert!((priya.net_salary - 20000.0).abs() < 1e-6);
        assert!(warnings.iter().any(|w| {
            w.kind == WarningKind::Info && w.message.contains("Priya")
        }));
    }

    #[test]
    fn outlets_reporting_different_months_is_fatal() {
        let outlet1 = attendance_sheet(1, 2026, &[("Mohan", &["P"])]);
        let outlet2 = attendance_sheet(2, 2026, &[("Mohan", &["P"])]);
        let salary = salary_book(&[("Mohan", 17000.0)]);

        let err = run_payroll(
            &PayrollInputs { outlet1, outlet2, salary },
            &no_entries(),
            &no_entries(),
        )
        .unwrap_err();
        match err {
            PipelineError::PeriodMismatch { left, right } => {
                assert!(left.contains("January"), "left was: {}", left);
                assert!(right.contains("February"), "right was: {}", right);
            }
            other => panic!("expected period mismatch, got {:?}", other),
        }
    }

    #[test]
    fn recalculation_is_idempotent() {
        let inputs = PayrollInputs {
            outlet1: attendance_sheet(1, 2026, &[("Mohan", &["A", "O", "P"])]),
            outlet2: attendance_sheet(1, 2026, &[("Mohan", &["H", "P", "W"])]),
            salary: salary_book(&[("Mohan", 17000.0)]),
        };
        let mut advances = HashMap::new();
        advances.insert(
            "Mohan".to_string(),
            vec![ManualEntry {
                date: "10/01/2026".to_string(),
                amount: 1000.0,
            }],
        );

        let (first, _) = run_payroll(&inputs, &advances, &no_entries()).unwrap();
        let (second, _) = run_payroll(&inputs, &advances, &no_entries()).unwrap();
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap(),
            "identical inputs must give identical results"
        );
    }

    #[test]
    fn roster_is_the_sorted_union_without_duplicates() {
        let attendance: BTreeSet<String> = ["Mohan", "Zara", "Priya"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let salary: BTreeSet<String> =
            ["Priya", "Amit"].iter().map(|s| s.to_string()).collect();

        let (roster, warnings) = cross_validate_employees(&attendance, &salary);
        assert_eq!(roster, vec!["Amit", "Mohan", "Priya", "Zara"]);
        // Two attendance-only warnings, one salary-only info.
        assert_eq!(
            warnings
                .iter()
                .filter(|w| w.kind == WarningKind::Warning)
                .count(),
            2
        );
        assert_eq!(
            warnings
                .iter()
                .filter(|w| w.kind == WarningKind::Info)
                .count(),
            1
        );
    }

    #[test]
    fn matching_rosters_produce_no_warnings() {
        let names: BTreeSet<String> =
            ["Mohan", "Priya"].iter().map(|s| s.to_string()).collect();
        let (roster, warnings) = cross_validate_employees(&names, &names);
        assert_eq!(roster.len(), 2);
        assert!(warnings.is_empty());
    }

    #[test]
    fn manual_entry_validation_requires_date_and_positive_amount() {
        assert!(validate_entry("05/01/2026", 100.0).is_empty());
        assert!(validate_entry("2026-01-05", 100.0).is_empty());
        assert!(!validate_entry("", 100.0).is_empty());
        assert!(!validate_entry("5/1/2026", 100.0).is_empty());
        assert!(!validate_entry("05/01/2026", 0.0).is_empty());
        assert!(!validate_entry("05/01/2026", -5.0).is_empty());
        assert!(!validate_entry("05/01/2026", f64::NAN).is_empty());
    }

    #[test]
    fn salary_sheet_header_may_sit_below_preamble() {
        let sheet = sheet_from(
            "salary.csv",
            &[
                &["Spice Garden payroll"],
                &["Employee Name", "Monthly Salary"],
                &["Mohan", "17000"],
                &["Priya", "20000.50"],
            ],
        );

        let book = parse_salary_sheet(&sheet).unwrap();
        assert_eq!(book.get("Mohan"), Some(17000.0));
        assert_eq!(book.get("Priya"), Some(20000.5));
    }

    #[test]
    fn unparsable_salary_values_become_zero() {
        let sheet = sheet_from(
            "salary.csv",
            &[
                &["Name", "Salary"],
                &["Mohan", "TBD"],
                &["Priya", "15k"],
            ],
        );

        let book = parse_salary_sheet(&sheet).unwrap();
        assert_eq!(book.get("Mohan"), Some(0.0));
        // parseFloat-style prefix parse.
        assert_eq!(book.get("Priya"), Some(15.0));
    }

    #[test]
    fn duplicate_salary_rows_keep_the_last_value() {
        let sheet = sheet_from(
            "salary.csv",
            &[
                &["Name", "Salary"],
                &["Mohan", "17000"],
                &["Mohan", "18000"],
            ],
        );

        let book = parse_salary_sheet(&sheet).unwrap();
        assert_eq!(book.entries.len(), 1);
        assert_eq!(book.get("Mohan"), Some(18000.0));
    }

    #[test]
    fn salary_sheet_without_headers_is_a_schema_error() {
        let sheet = sheet_from(
            "salary.csv",
            &[&["Employee", "Pay"], &["Mohan", "17000"]],
        );
        assert!(matches!(
            parse_salary_sheet(&sheet),
            Err(PipelineError::Schema { .. })
        ));
    }

    #[test]
    fn out_of_range_years_are_rejected() {
        let inputs = PayrollInputs {
            outlet1: attendance_sheet(1, 1900, &[("Mohan", &["P"])]),
            outlet2: attendance_sheet(1, 1900, &[("Mohan", &["P"])]),
            salary: salary_book(&[("Mohan", 17000.0)]),
        };
        match run_payroll(&inputs, &no_entries(), &no_entries()).unwrap_err() {
            PipelineError::Validation { errors } => {
                assert!(errors[0].contains("2000"), "errors were: {:?}", errors);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn empty_roster_is_rejected() {
        let inputs = PayrollInputs {
            outlet1: empty_sheet(1, 2026),
            outlet2: empty_sheet(1, 2026),
            salary: SalaryBook::default(),
        };
        assert!(matches!(
            run_payroll(&inputs, &no_entries(), &no_entries()),
            Err(PipelineError::Validation { .. })
        ));
    }
}

// src/dates.rs
//
// Canonical dates and the slash-date ambiguity policy. Sheets arrive with
// dates as DD/MM/YYYY strings, MM/DD/YYYY strings, YYYY-MM-DD strings or
// Excel serial numbers; everything is normalized to a (day, month, year)
// triple rendered as DD/MM/YYYY.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::grid::parse_int_prefix;

/// A normalized calendar date. Only range-checked (day 1..=31, month
/// 1..=12); no day-count/leap cross-check is performed, so 31/02 passes.
/// That looseness matches the sheets this tool accepts.
///
/// Field order gives a chronological `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl CanonicalDate {
    pub fn new(day: u32, month: u32, year: i32) -> Option<Self> {
        if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
            return None;
        }
        Some(CanonicalDate { year, month, day })
    }
}

impl std::fmt::Display for CanonicalDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}/{:02}/{}", self.day, self.month, self.year)
    }
}

impl Serialize for CanonicalDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// How to read a slash date whose day/month slots are ambiguous.
///
/// Payroll attendance sheets are always DD/MM/YYYY. Incentive attendance and
/// sales sheets guess: a component above 12 disambiguates, otherwise
/// month-first wins. The two behaviors are intentionally kept separate; do
/// not unify them without checking with the sheet owners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrderPolicy {
    /// First component is always the day.
    DayFirst,
    /// `first > 12` means day-first, `second > 12` means month-first,
    /// otherwise assume month-first (US-style).
    DetectPreferMonthFirst,
}

impl DateOrderPolicy {
    fn resolve(self, first: i32, second: i32) -> (i32, i32) {
        match self {
            DateOrderPolicy::DayFirst => (first, second),
            DateOrderPolicy::DetectPreferMonthFirst => {
                if first > 12 {
                    (first, second)
                } else {
                    // second > 12 forces month-first; ambiguous defaults to
                    // month-first as well, so both arms read the same.
                    (second, first)
                }
            }
        }
    }
}

/// Parses a `a/b/yyyy` string under the given ambiguity policy.
pub fn parse_slash_date(s: &str, policy: DateOrderPolicy) -> Option<CanonicalDate> {
    let parts: Vec<&str> = s.trim().split('/').collect();
    if parts.len() != 3 {
        return None;
    }
    let first = parse_int_prefix(parts[0])?;
    let second = parse_int_prefix(parts[1])?;
    let year = parse_int_prefix(parts[2])?;
    let (day, month) = policy.resolve(first, second);
    if day < 0 || month < 0 {
        return None;
    }
    CanonicalDate::new(day as u32, month as u32, year)
}

/// Parses a `YYYY-MM-DD` string.
pub fn parse_dash_date(s: &str) -> Option<CanonicalDate> {
    let parts: Vec<&str> = s.trim().split('-').collect();
    if parts.len() != 3 {
        return None;
    }
    let year = parse_int_prefix(parts[0])?;
    let month = parse_int_prefix(parts[1])?;
    let day = parse_int_prefix(parts[2])?;
    if day < 0 || month < 0 {
        return None;
    }
    CanonicalDate::new(day as u32, month as u32, year)
}

/// Converts an Excel 1900-system serial date code to a date. Serial 60 is
/// the fictitious 1900-02-29, so codes past it sit one day off the naive
/// epoch arithmetic.
pub fn from_serial_code(code: f64) -> Option<CanonicalDate> {
    if !code.is_finite() || code < 1.0 {
        return None;
    }
    let days = code.floor() as i64;
    let base = if days < 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    let date = base.checked_add_signed(chrono::Duration::days(days))?;
    use chrono::Datelike;
    CanonicalDate::new(date.day(), date.month(), date.year())
}

/// Actual day count of a (month, year), leap-year aware. Callers validate
/// `month` to 1..=12 first; out-of-range input falls back to 30.
pub fn days_in_month(month: u32, year: i32) -> u32 {
    use chrono::Datelike;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(30)
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get(month.wrapping_sub(1) as usize)
        .copied()
        .unwrap_or("")
}

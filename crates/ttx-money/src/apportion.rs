//! Residency apportionment.
//!
//! One pure function turns a residency window into the fraction of the tax
//! year a filer was resident.  Every jurisdiction module calls
//! [`compute_apportionment_ratio`]; none keeps its own day-counting copy.
//!
//! # Algorithm
//!
//! - `full-year` -> 1, `nonresident` -> 0.
//! - `part-year`: the year spans Jan 1..=Dec 31 of `tax_year` (366 days in a
//!   leap year).  Move-in/move-out default to the year bounds when absent or
//!   unparsable, are clamped inside the year, and the resident interval
//!   counts both endpoints.  An interval that ends before it starts is zero.
//!
//! The ratio is kept as an exact `resident_days / days_in_year` fraction so
//! applying it to an amount rounds exactly once.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::Cents;

/// How a filer relates to a jurisdiction for the tax year.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResidencyType {
    FullYear,
    PartYear,
    Nonresident,
}

impl ResidencyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResidencyType::FullYear => "full-year",
            ResidencyType::PartYear => "part-year",
            ResidencyType::Nonresident => "nonresident",
        }
    }
}

impl std::fmt::Display for ResidencyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Residency type plus optional move dates, as supplied by intake.
///
/// Dates stay as text here; [`validate_residency_window`] is the strict gate
/// and [`compute_apportionment_ratio`] the lenient, total evaluator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResidencyWindow {
    pub residency_type: ResidencyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_in_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_out_date: Option<String>,
}

impl ResidencyWindow {
    pub fn full_year() -> Self {
        Self {
            residency_type: ResidencyType::FullYear,
            move_in_date: None,
            move_out_date: None,
        }
    }

    pub fn nonresident() -> Self {
        Self {
            residency_type: ResidencyType::Nonresident,
            move_in_date: None,
            move_out_date: None,
        }
    }

    pub fn part_year(move_in: Option<&str>, move_out: Option<&str>) -> Self {
        Self {
            residency_type: ResidencyType::PartYear,
            move_in_date: move_in.map(str::to_string),
            move_out_date: move_out.map(str::to_string),
        }
    }
}

/// A residency date that is present but cannot be read as a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApportionmentError {
    #[error("{field} '{value}' is not a valid calendar date (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },
}

// ---------------------------------------------------------------------------
// Ratio
// ---------------------------------------------------------------------------

/// Exact fraction of the tax year attributed to residency, in `[0, 1]`.
#[derive(Copy, Clone, Debug, Eq, Serialize, Deserialize)]
pub struct ApportionmentRatio {
    pub resident_days: u32,
    pub days_in_year: u32,
}

impl ApportionmentRatio {
    /// Ratio of exactly 1.
    pub const FULL: ApportionmentRatio = ApportionmentRatio {
        resident_days: 1,
        days_in_year: 1,
    };

    /// Ratio of exactly 0.
    pub const NONE: ApportionmentRatio = ApportionmentRatio {
        resident_days: 0,
        days_in_year: 1,
    };

    /// Build a ratio, clamping the numerator into `[0, days_in_year]`.
    pub fn new(resident_days: u32, days_in_year: u32) -> Self {
        debug_assert!(days_in_year > 0, "days_in_year must be positive");
        Self {
            resident_days: resident_days.min(days_in_year),
            days_in_year: days_in_year.max(1),
        }
    }

    pub fn is_full(&self) -> bool {
        self.resident_days == self.days_in_year
    }

    pub fn is_zero(&self) -> bool {
        self.resident_days == 0
    }

    /// Display-only floating view.  Never feed this back into money math.
    pub fn as_f64(&self) -> f64 {
        f64::from(self.resident_days) / f64::from(self.days_in_year)
    }

    /// Scale a full-year amount, rounding half away from zero to the cent.
    pub fn apply(&self, amount: Cents) -> Cents {
        if self.is_full() {
            return amount;
        }
        amount.mul_ratio(i64::from(self.resident_days), i64::from(self.days_in_year))
    }
}

impl PartialEq for ApportionmentRatio {
    fn eq(&self, other: &Self) -> bool {
        u64::from(self.resident_days) * u64::from(other.days_in_year)
            == u64::from(other.resident_days) * u64::from(self.days_in_year)
    }
}

impl PartialOrd for ApportionmentRatio {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ApportionmentRatio {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (u64::from(self.resident_days) * u64::from(other.days_in_year))
            .cmp(&(u64::from(other.resident_days) * u64::from(self.days_in_year)))
    }
}

impl std::fmt::Display for ApportionmentRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.resident_days, self.days_in_year)
    }
}

// ---------------------------------------------------------------------------
// Calendar helpers
// ---------------------------------------------------------------------------

/// Gregorian leap-year rule.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_year(year: i32) -> u32 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

/// Parse a residency date as a local calendar date.
///
/// Accepts ISO `YYYY-MM-DD` (the intake format) and US `MM/DD/YYYY`.
pub fn parse_residency_date(raw: &str) -> Option<NaiveDate> {
    let t = raw.trim();
    NaiveDate::parse_from_str(t, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(t, "%m/%d/%Y"))
        .ok()
}

/// Strict check used at dispatch: a date that is present must parse.
pub fn validate_residency_window(window: &ResidencyWindow) -> Result<(), ApportionmentError> {
    let checks = [
        ("move_in_date", window.move_in_date.as_deref()),
        ("move_out_date", window.move_out_date.as_deref()),
    ];
    for (field, value) in checks {
        if let Some(v) = value {
            if !v.trim().is_empty() && parse_residency_date(v).is_none() {
                return Err(ApportionmentError::InvalidDate {
                    field,
                    value: v.to_string(),
                });
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// The apportionment primitive
// ---------------------------------------------------------------------------

/// Fraction of `tax_year` the filer was resident.  Pure and total.
pub fn compute_apportionment_ratio(window: &ResidencyWindow, tax_year: i32) -> ApportionmentRatio {
    let year_days = days_in_year(tax_year);
    match window.residency_type {
        ResidencyType::FullYear => ApportionmentRatio::new(year_days, year_days),
        ResidencyType::Nonresident => ApportionmentRatio::new(0, year_days),
        ResidencyType::PartYear => {
            let (Some(year_start), Some(year_end)) = (
                NaiveDate::from_ymd_opt(tax_year, 1, 1),
                NaiveDate::from_ymd_opt(tax_year, 12, 31),
            ) else {
                return ApportionmentRatio::new(0, year_days);
            };

            let start = window
                .move_in_date
                .as_deref()
                .and_then(parse_residency_date)
                .unwrap_or(year_start)
                .clamp(year_start, year_end);
            let end = window
                .move_out_date
                .as_deref()
                .and_then(parse_residency_date)
                .unwrap_or(year_end)
                .clamp(year_start, year_end);

            if end < start {
                return ApportionmentRatio::new(0, year_days);
            }

            let resident = (end - start).num_days() + 1;
            debug_assert_eq!(start.year(), tax_year);
            ApportionmentRatio::new(u32::try_from(resident).unwrap_or(0), year_days)
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

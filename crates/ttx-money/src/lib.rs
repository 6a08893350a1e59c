//! ttx-money
//!
//! Money and apportionment primitives shared by every computation module.
//! - Integer-cents amounts (`Cents`) with explicit rounding at each rate application
//! - Exact parts-per-million rates (`Rate`)
//! - The single day-counted residency apportionment ratio
//!
//! Pure deterministic logic. No IO, no wall-clock.

mod apportion;
mod fixedpoint;

pub use apportion::{
    compute_apportionment_ratio, days_in_year, is_leap_year, parse_residency_date,
    validate_residency_window, ApportionmentError, ApportionmentRatio, ResidencyType,
    ResidencyWindow,
};
pub use fixedpoint::{Cents, Rate, RateParseError, CENTS_PER_DOLLAR, PPM_SCALE};

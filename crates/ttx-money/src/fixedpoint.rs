//! Fixed-point money type.
//!
//! # Motivation
//!
//! Every monetary line on a return is an integer number of cents stored as
//! `i64`.  Using raw `i64` for money invites accidental arithmetic with
//! unrelated integers (day counts, dependent counts, parts-per-million rates)
//! without any compile-time signal.
//!
//! `Cents` wraps the raw `i64` so the type system prevents:
//! - Implicit construction from raw `i64` (no `From<i64>` impl).
//! - Mixing `Cents` with unrelated `i64` values in arithmetic.
//!
//! # Rounding
//!
//! Rate applications round to the nearest cent, half away from zero, at the
//! point of computation.  The rounded value is what gets traced and what feeds
//! later lines, so the audit trail never drifts from the arithmetic.
//!
//! # Rates
//!
//! [`Rate`] is an exact parts-per-million fraction.  Configuration supplies
//! rates as decimal text (`"0.0519"`) which parses without touching `f64`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// Cents per whole dollar.
pub const CENTS_PER_DOLLAR: i64 = 100;

/// Scale of [`Rate`]: 1.0 == `PPM_SCALE`.
pub const PPM_SCALE: i64 = 1_000_000;

// ---------------------------------------------------------------------------
// Cents newtype
// ---------------------------------------------------------------------------

/// A monetary amount in integer cents.
///
/// 1 USD = `Cents(100)`.
///
/// No `From<i64>`: construct with [`Cents::new`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cents(i64);

impl Cents {
    /// Zero monetary amount.
    pub const ZERO: Cents = Cents(0);

    /// Maximum representable value.
    pub const MAX: Cents = Cents(i64::MAX);

    /// Minimum representable value.
    pub const MIN: Cents = Cents(i64::MIN);

    /// Construct from a raw cents count.
    #[inline]
    pub const fn new(raw: i64) -> Self {
        Cents(raw)
    }

    /// Construct from whole dollars.
    #[inline]
    pub const fn from_dollars(dollars: i64) -> Self {
        Cents(dollars * CENTS_PER_DOLLAR)
    }

    /// Extract the underlying raw `i64`.
    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Clamp at zero.  Every tax-base floor on a return goes through here.
    #[inline]
    pub fn floor_zero(self) -> Cents {
        Cents(self.0.max(0))
    }

    /// Saturating addition; clamps at [`Cents::MAX`] on overflow.
    #[inline]
    pub fn saturating_add(self, rhs: Cents) -> Cents {
        Cents(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction; clamps at [`Cents::MIN`] on underflow.
    #[inline]
    pub fn saturating_sub(self, rhs: Cents) -> Cents {
        Cents(self.0.saturating_sub(rhs.0))
    }

    /// Multiply by an integer count (dependents, exemptions).
    #[inline]
    pub fn times(self, count: i64) -> Cents {
        Cents(self.0.saturating_mul(count))
    }

    /// Apply a rate, rounding half away from zero to the nearest cent.
    pub fn apply_rate(self, rate: Rate) -> Cents {
        self.mul_ratio(rate.ppm(), PPM_SCALE)
    }

    /// Multiply by `num / den`, rounding half away from zero.
    ///
    /// `den` must be positive.  Intermediates are `i128`, so the product
    /// never overflows; the result saturates at the `i64` range.
    pub fn mul_ratio(self, num: i64, den: i64) -> Cents {
        debug_assert!(den > 0, "mul_ratio denominator must be positive");
        let n = i128::from(self.0) * i128::from(num);
        let q = div_round_half_away(n, i128::from(den));
        Cents(q.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64)
    }
}

/// Integer division rounding half away from zero.  `d` must be positive.
fn div_round_half_away(n: i128, d: i128) -> i128 {
    let q = n / d;
    let r = n % d;
    if 2 * r.abs() >= d {
        q + n.signum()
    } else {
        q
    }
}

// ---------------------------------------------------------------------------
// Arithmetic operators (closed over Cents)
//
// All of them saturate at the i64 range; amounts arrive from JSON unchecked.
// ---------------------------------------------------------------------------

impl Add for Cents {
    type Output = Cents;
    #[inline]
    fn add(self, rhs: Cents) -> Cents {
        Cents(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Cents {
    type Output = Cents;
    #[inline]
    fn sub(self, rhs: Cents) -> Cents {
        Cents(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for Cents {
    type Output = Cents;
    #[inline]
    fn neg(self) -> Cents {
        Cents(self.0.saturating_neg())
    }
}

impl AddAssign for Cents {
    #[inline]
    fn add_assign(&mut self, rhs: Cents) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl SubAssign for Cents {
    #[inline]
    fn sub_assign(&mut self, rhs: Cents) {
        self.0 = self.0.saturating_sub(rhs.0);
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Cents>>(iter: I) -> Cents {
        iter.fold(Cents::ZERO, |acc, c| acc + c)
    }
}

impl<'a> Sum<&'a Cents> for Cents {
    fn sum<I: Iterator<Item = &'a Cents>>(iter: I) -> Cents {
        iter.fold(Cents::ZERO, |acc, c| acc + *c)
    }
}

// ---------------------------------------------------------------------------
// Display / serde
// ---------------------------------------------------------------------------

impl std::fmt::Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dollars = self.0 / CENTS_PER_DOLLAR;
        let frac = (self.0 % CENTS_PER_DOLLAR).abs();
        // Amounts in (-1.00, 0) truncate to 0 dollars and lose the sign.
        if self.0 < 0 && dollars == 0 {
            write!(f, "-{dollars}.{frac:02}")
        } else {
            write!(f, "{dollars}.{frac:02}")
        }
    }
}

impl Serialize for Cents {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for Cents {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Cents)
    }
}

// ---------------------------------------------------------------------------
// Rate
// ---------------------------------------------------------------------------

/// An exact non-negative rate in parts per million (`1.0 == 1_000_000`).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rate(i64);

impl Rate {
    pub const ZERO: Rate = Rate(0);
    pub const ONE: Rate = Rate(PPM_SCALE);

    #[inline]
    pub const fn from_ppm(ppm: i64) -> Self {
        Rate(ppm)
    }

    #[inline]
    pub const fn ppm(self) -> i64 {
        self.0
    }
}

/// Error parsing decimal rate text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateParseError {
    #[error("rate must not be empty")]
    Empty,
    #[error("rate '{0}' is not a non-negative decimal")]
    NotDecimal(String),
    #[error("rate '{0}' has more than 6 significant fractional digits")]
    TooPrecise(String),
}

impl FromStr for Rate {
    type Err = RateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if t.is_empty() {
            return Err(RateParseError::Empty);
        }
        let (whole, frac) = match t.split_once('.') {
            Some((w, f)) => (w, f),
            None => (t, ""),
        };
        let digits_ok = |p: &str| p.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !digits_ok(whole) || !digits_ok(frac) {
            return Err(RateParseError::NotDecimal(t.to_string()));
        }
        let frac = frac.trim_end_matches('0');
        if frac.len() > 6 {
            return Err(RateParseError::TooPrecise(t.to_string()));
        }
        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| RateParseError::NotDecimal(t.to_string()))?
        };
        let mut frac_ppm: i64 = 0;
        for (i, c) in frac.chars().enumerate() {
            let digit = i64::from(c as u8 - b'0');
            frac_ppm += digit * 10_i64.pow(5 - i as u32);
        }
        whole
            .checked_mul(PPM_SCALE)
            .and_then(|w| w.checked_add(frac_ppm))
            .map(Rate)
            .ok_or_else(|| RateParseError::NotDecimal(t.to_string()))
    }
}

impl std::fmt::Display for Rate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let whole = self.0 / PPM_SCALE;
        let frac = self.0 % PPM_SCALE;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let text = format!("{frac:06}");
        write!(f, "{whole}.{}", text.trim_end_matches('0'))
    }
}

impl Serialize for Rate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Rate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

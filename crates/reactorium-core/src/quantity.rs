//! Saturating fixed-point quantities with four decimal digits of precision.
//!
//! A [`Quantity`] stores a whole-number `magnitude` in `[0, i64::MAX]` and a
//! `fraction` in ten-thousandths (`[0, 9999]`). All arithmetic is defined on
//! those two parts directly so results are identical on every platform.
//!
//! # Overflow policy
//!
//! The `checked_*` primitives report overflow as `None`. The `saturating_*`
//! operations (and the operator traits) apply the policy: results above
//! [`Quantity::MAX`] become `MAX`, results below zero become [`Quantity::ZERO`].
//! Neither case is an error.

use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, MulAssign, Sub, SubAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Number of decimal digits carried by the fraction.
pub const DECIMAL_DIGITS: usize = 4;

/// Largest fraction value (0.9999).
pub const MAX_FRACTION: u16 = 9_999;

/// One whole unit expressed in fraction units.
pub const SINGLE_UNIT: u16 = MAX_FRACTION + 1;

/// Largest whole-number part. Matches the signed 64-bit range of the wire and
/// record formats.
pub const MAX_MAGNITUDE: u64 = i64::MAX as u64;

const UNIT: u128 = SINGLE_UNIT as u128;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced by quantity construction and arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuantityError {
    /// A plain scalar operand was negative. Quantities are never negative.
    #[error("{operation} called with a negative operand; quantities are always positive")]
    NegativeOperand { operation: &'static str },
    /// Text could not be parsed as a quantity.
    #[error("invalid quantity '{input}': {reason}")]
    InvalidFormat { input: String, reason: &'static str },
    /// The divisor was zero.
    #[error("division by zero")]
    DivisionByZero,
}

// ---------------------------------------------------------------------------
// Quantity
// ---------------------------------------------------------------------------

/// An immutable, non-negative fixed-point value.
///
/// `Quantity` is `Copy`; every operation returns a new value. Constants such
/// as [`Quantity::ZERO`] can be shared freely between threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "QuantityRecord", into = "QuantityRecord")]
pub struct Quantity {
    magnitude: u64,
    fraction: u16,
}

impl Quantity {
    pub const ZERO: Quantity = Quantity::from_raw(0, 0);
    pub const ONE: Quantity = Quantity::from_raw(1, 0);
    pub const MAX: Quantity = Quantity::from_raw(MAX_MAGNITUDE, MAX_FRACTION);

    /// Build a quantity from raw parts, clamping each into its valid range.
    pub const fn from_raw(magnitude: u64, fraction: u16) -> Self {
        let magnitude = if magnitude > MAX_MAGNITUDE {
            MAX_MAGNITUDE
        } else {
            magnitude
        };
        let fraction = if fraction > MAX_FRACTION {
            MAX_FRACTION
        } else {
            fraction
        };
        Self {
            magnitude,
            fraction,
        }
    }

    /// Build a quantity from a signed magnitude and fraction.
    ///
    /// A negative magnitude becomes zero; the fraction is clamped to
    /// `[0, 9999]`. Neither case is an error.
    pub fn new(magnitude: i64, fraction: i32) -> Self {
        Self::from_raw(
            magnitude.max(0) as u64,
            fraction.clamp(0, i32::from(MAX_FRACTION)) as u16,
        )
    }

    /// A whole-number quantity. Negative input becomes zero.
    pub fn from_integer(value: i64) -> Self {
        Self::new(value, 0)
    }

    /// Convert a float, keeping the first four decimal digits of its shortest
    /// decimal representation.
    ///
    /// Negative and NaN input become zero; values past the magnitude range
    /// saturate.
    pub fn from_f64(value: f64) -> Self {
        if !(value > 0.0) {
            return Self::ZERO;
        }
        // f64's Display never switches to exponent notation.
        let text = value.to_string();
        let fraction = text
            .split_once('.')
            .and_then(|(_, digits)| parse_fraction(digits))
            .unwrap_or(0);
        Self::from_raw(value.trunc() as u64, fraction)
    }

    /// Whole-number part.
    pub fn magnitude(&self) -> u64 {
        self.magnitude
    }

    /// Fractional part in ten-thousandths.
    pub fn fraction(&self) -> u16 {
        self.fraction
    }

    pub fn is_empty(&self) -> bool {
        self.magnitude == 0 && self.fraction == 0
    }

    /// The value in fraction units (`magnitude * 10000 + fraction`).
    fn units(&self) -> u128 {
        u128::from(self.magnitude) * UNIT + u128::from(self.fraction)
    }

    fn from_units(units: u128) -> Option<Self> {
        let magnitude = units / UNIT;
        if magnitude > u128::from(MAX_MAGNITUDE) {
            return None;
        }
        Some(Self {
            magnitude: magnitude as u64,
            fraction: (units % UNIT) as u16,
        })
    }

    // -- Checked primitives --

    /// Add two quantities, returning `None` if the result exceeds [`Quantity::MAX`].
    pub fn checked_add(self, other: Quantity) -> Option<Quantity> {
        let mut magnitude = self.magnitude.checked_add(other.magnitude)?;
        let mut fraction = self.fraction + other.fraction;
        if fraction >= SINGLE_UNIT {
            fraction -= SINGLE_UNIT;
            magnitude = magnitude.checked_add(1)?;
        }
        (magnitude <= MAX_MAGNITUDE).then_some(Self {
            magnitude,
            fraction,
        })
    }

    /// Subtract, returning `None` if the result would be negative.
    pub fn checked_sub(self, other: Quantity) -> Option<Quantity> {
        let mut magnitude = self.magnitude.checked_sub(other.magnitude)?;
        let fraction = if self.fraction >= other.fraction {
            self.fraction - other.fraction
        } else {
            magnitude = magnitude.checked_sub(1)?;
            self.fraction + SINGLE_UNIT - other.fraction
        };
        Some(Self {
            magnitude,
            fraction,
        })
    }

    /// Multiply, returning `None` if any partial product overflows.
    ///
    /// `(a + b) * (c + d)` is expanded into four cross terms where `a`, `c`
    /// are magnitudes and `b`, `d` fractions. The fraction-by-fraction term
    /// is truncated to four digits.
    pub fn checked_mul(self, other: Quantity) -> Option<Quantity> {
        let whole = self
            .magnitude
            .checked_mul(other.magnitude)
            .filter(|m| *m <= MAX_MAGNITUDE)?;
        Self::from_raw(whole, 0)
            .checked_add(magnitude_times_fraction(self.magnitude, other.fraction))?
            .checked_add(magnitude_times_fraction(other.magnitude, self.fraction))?
            .checked_add(fraction_times_fraction(self.fraction, other.fraction))
    }

    /// Divide, rounding to four decimal digits with round-half-to-even.
    ///
    /// Results larger than [`Quantity::MAX`] saturate.
    pub fn checked_div(self, divisor: Quantity) -> Result<Quantity, QuantityError> {
        if divisor.is_empty() {
            return Err(QuantityError::DivisionByZero);
        }
        let numerator = self.units() * UNIT;
        let denominator = divisor.units();
        let mut quotient = numerator / denominator;
        let remainder = numerator % denominator;
        match (remainder * 2).cmp(&denominator) {
            Ordering::Greater => quotient += 1,
            Ordering::Equal if quotient % 2 == 1 => quotient += 1,
            _ => {}
        }
        Ok(Self::from_units(quotient).unwrap_or_else(|| {
            trace!(dividend = %self, divisor = %divisor, "quantity division saturated");
            Self::MAX
        }))
    }

    // -- Saturating operations --

    pub fn saturating_add(self, other: Quantity) -> Quantity {
        self.checked_add(other).unwrap_or_else(|| {
            trace!(lhs = %self, rhs = %other, "quantity addition saturated");
            Self::MAX
        })
    }

    /// Subtract, clamping to zero when `other` is larger than `self`.
    pub fn saturating_sub(self, other: Quantity) -> Quantity {
        self.checked_sub(other).unwrap_or_else(|| {
            debug!(lhs = %self, rhs = %other, "quantity subtraction clamped to zero");
            Self::ZERO
        })
    }

    /// Multiply with saturation applied per cross term.
    ///
    /// An overflowing whole-number product saturates the magnitude first; the
    /// remaining terms are then added with the usual carry handling.
    pub fn saturating_mul(self, other: Quantity) -> Quantity {
        let whole = match self.magnitude.checked_mul(other.magnitude) {
            Some(m) if m <= MAX_MAGNITUDE => m,
            _ => {
                trace!(lhs = %self, rhs = %other, "quantity multiplication saturated");
                MAX_MAGNITUDE
            }
        };
        Self::from_raw(whole, 0)
            .saturating_add(magnitude_times_fraction(self.magnitude, other.fraction))
            .saturating_add(magnitude_times_fraction(other.magnitude, self.fraction))
            .saturating_add(fraction_times_fraction(self.fraction, other.fraction))
    }

    // -- Scalar operations --

    /// Add a quantity or a non-negative scalar.
    pub fn try_add<T: Operand>(self, rhs: T) -> Result<Quantity, QuantityError> {
        Ok(self.saturating_add(rhs.to_quantity("addition")?))
    }

    /// Subtract a quantity or a non-negative scalar, clamping at zero.
    pub fn try_sub<T: Operand>(self, rhs: T) -> Result<Quantity, QuantityError> {
        Ok(self.saturating_sub(rhs.to_quantity("subtraction")?))
    }

    /// Multiply by a quantity or a non-negative scalar.
    pub fn try_mul<T: Operand>(self, rhs: T) -> Result<Quantity, QuantityError> {
        Ok(self.saturating_mul(rhs.to_quantity("multiplication")?))
    }

    /// Divide by a quantity or a non-negative scalar.
    pub fn try_div<T: Operand>(self, rhs: T) -> Result<Quantity, QuantityError> {
        self.checked_div(rhs.to_quantity("division")?)
    }

    /// Ratio of `self` to `other` as a float, or `1.0` when `other` is empty.
    pub fn divide_to_level(self, other: Quantity) -> f64 {
        match self.checked_div(other) {
            Ok(ratio) => ratio.to_f64(),
            Err(_) => 1.0,
        }
    }

    // -- Comparison --

    /// Ranked comparison: `+-2` when the magnitudes differ, `+-1` when only the
    /// fractions differ, `0` when equal.
    pub(crate) fn rank(&self, other: &Quantity) -> i8 {
        match self.magnitude.cmp(&other.magnitude) {
            Ordering::Less => -2,
            Ordering::Greater => 2,
            Ordering::Equal => match self.fraction.cmp(&other.fraction) {
                Ordering::Less => -1,
                Ordering::Greater => 1,
                Ordering::Equal => 0,
            },
        }
    }

    pub fn less_than(&self, other: &Quantity) -> bool {
        self.rank(other) < 0
    }

    pub fn greater_than(&self, other: &Quantity) -> bool {
        self.rank(other) > 0
    }

    // -- Conversions --

    /// Whole-number part clamped into `i32`.
    pub fn to_i32_saturating(&self) -> i32 {
        i32::try_from(self.magnitude).unwrap_or(i32::MAX)
    }

    /// Whole-number part. Always fits because magnitude never exceeds `i64::MAX`.
    pub fn to_i64(&self) -> i64 {
        self.magnitude as i64
    }

    pub fn to_f64(&self) -> f64 {
        self.magnitude as f64 + f64::from(self.fraction) / f64::from(SINGLE_UNIT)
    }

    pub fn to_f32(&self) -> f32 {
        self.magnitude as f32 + f32::from(self.fraction) / f32::from(SINGLE_UNIT)
    }

    /// Render with at most `places` decimal digits (capped at four).
    ///
    /// Digits past `places` are truncated, not rounded. A zero fraction is
    /// rendered without a decimal point.
    pub fn to_string_with_places(&self, places: usize) -> String {
        let places = places.min(DECIMAL_DIGITS);
        if self.fraction == 0 || places == 0 {
            return self.magnitude.to_string();
        }
        let digits = format!("{:04}", self.fraction);
        format!("{}.{}", self.magnitude, &digits[..places])
    }

    // -- Persisted record --

    pub fn to_record(&self) -> QuantityRecord {
        QuantityRecord::from(*self)
    }

    /// Read a persisted record. An absent record is [`Quantity::ZERO`].
    pub fn from_record(record: Option<&QuantityRecord>) -> Quantity {
        record.map_or(Self::ZERO, |r| Quantity::from(*r))
    }
}

/// `magnitude * fraction / 10000`, exact in 128 bits.
fn magnitude_times_fraction(magnitude: u64, fraction: u16) -> Quantity {
    let product = u128::from(magnitude) * u128::from(fraction);
    Quantity {
        magnitude: (product / UNIT) as u64,
        fraction: (product % UNIT) as u16,
    }
}

/// Fraction-by-fraction product, truncated to four digits.
fn fraction_times_fraction(a: u16, b: u16) -> Quantity {
    let product = u32::from(a) * u32::from(b) / u32::from(SINGLE_UNIT);
    Quantity {
        magnitude: 0,
        fraction: product as u16,
    }
}

/// Read fraction digits: right-padded with zeros or truncated to four digits.
fn parse_fraction(digits: &str) -> Option<u16> {
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value = digits
        .bytes()
        .chain(std::iter::repeat(b'0'))
        .take(DECIMAL_DIGITS)
        .fold(0u16, |acc, b| acc * 10 + u16::from(b - b'0'));
    Some(value)
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank(other).cmp(&0)
    }
}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with_places(DECIMAL_DIGITS))
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    /// Parse `"<digits>"` or `"<digits>.<digits>"`. Signs, whitespace and
    /// exponents are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| QuantityError::InvalidFormat {
            input: s.to_owned(),
            reason,
        };
        let (whole, decimals) = match s.split_once('.') {
            Some((whole, decimals)) => (whole, Some(decimals)),
            None => (s, None),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected decimal digits before the point"));
        }
        let magnitude = whole
            .parse::<u64>()
            .ok()
            .filter(|m| *m <= MAX_MAGNITUDE)
            .ok_or_else(|| invalid("magnitude out of range"))?;
        let fraction = match decimals {
            Some(digits) => {
                parse_fraction(digits).ok_or_else(|| invalid("expected decimal digits after the point"))?
            }
            None => 0,
        };
        Ok(Self {
            magnitude,
            fraction,
        })
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        self.saturating_add(rhs)
    }
}

impl Sub for Quantity {
    type Output = Quantity;

    fn sub(self, rhs: Quantity) -> Quantity {
        self.saturating_sub(rhs)
    }
}

impl Mul for Quantity {
    type Output = Quantity;

    fn mul(self, rhs: Quantity) -> Quantity {
        self.saturating_mul(rhs)
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Quantity {
        iter.fold(Quantity::ZERO, Quantity::saturating_add)
    }
}

impl<'a> Sum<&'a Quantity> for Quantity {
    fn sum<I: Iterator<Item = &'a Quantity>>(iter: I) -> Quantity {
        iter.copied().sum()
    }
}

// ---------------------------------------------------------------------------
// Scalar operands
// ---------------------------------------------------------------------------

/// A value that can take part in quantity arithmetic.
///
/// Quantities always convert. Plain numbers convert only when non-negative;
/// `operation` names the arithmetic in the error.
pub trait Operand: Copy {
    fn to_quantity(self, operation: &'static str) -> Result<Quantity, QuantityError>;
}

impl Operand for Quantity {
    fn to_quantity(self, _operation: &'static str) -> Result<Quantity, QuantityError> {
        Ok(self)
    }
}

macro_rules! integer_operand {
    ($($ty:ty),*) => {
        $(
            impl Operand for $ty {
                #[allow(unused_comparisons)]
                fn to_quantity(self, operation: &'static str) -> Result<Quantity, QuantityError> {
                    if self < 0 {
                        return Err(QuantityError::NegativeOperand { operation });
                    }
                    Ok(Quantity::from_raw(u64::try_from(self).unwrap_or(u64::MAX), 0))
                }
            }
        )*
    };
}

integer_operand!(i32, i64, u32, u64);

impl Operand for f64 {
    fn to_quantity(self, operation: &'static str) -> Result<Quantity, QuantityError> {
        if self < 0.0 {
            return Err(QuantityError::NegativeOperand { operation });
        }
        Ok(Quantity::from_f64(self))
    }
}

impl Operand for f32 {
    fn to_quantity(self, operation: &'static str) -> Result<Quantity, QuantityError> {
        f64::from(self).to_quantity(operation)
    }
}

// ---------------------------------------------------------------------------
// Persisted record
// ---------------------------------------------------------------------------

/// The persisted key-value form: a 64-bit `value` and a 16-bit `decimal`.
///
/// Missing fields read as zero; out-of-range fields are clamped on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantityRecord {
    pub value: i64,
    pub decimal: i16,
}

impl From<Quantity> for QuantityRecord {
    fn from(q: Quantity) -> Self {
        Self {
            value: q.magnitude as i64,
            decimal: q.fraction as i16,
        }
    }
}

impl From<QuantityRecord> for Quantity {
    fn from(record: QuantityRecord) -> Self {
        Quantity::new(record.value, i32::from(record.decimal))
    }
}

// ---------------------------------------------------------------------------
// Accumulator
// ---------------------------------------------------------------------------

/// A mutable running total.
///
/// The accumulator is the only way to change a quantity in place. It is not
/// `Copy`; cloning produces an independent total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QuantityAccumulator {
    value: Quantity,
}

impl QuantityAccumulator {
    /// Start a running total at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> Quantity {
        self.value
    }

    pub fn set(&mut self, value: Quantity) {
        self.value = value;
    }

    pub fn into_value(self) -> Quantity {
        self.value
    }

    pub fn add_in_place(&mut self, other: Quantity) {
        self.value = self.value.saturating_add(other);
    }

    pub fn subtract_in_place(&mut self, other: Quantity) {
        self.value = self.value.saturating_sub(other);
    }

    pub fn multiply_in_place(&mut self, other: Quantity) {
        self.value = self.value.saturating_mul(other);
    }

    /// Divide in place. On error the total is left unchanged.
    pub fn divide_in_place(&mut self, divisor: Quantity) -> Result<(), QuantityError> {
        self.value = self.value.checked_div(divisor)?;
        Ok(())
    }

    /// Add a scalar in place. Negative scalars are rejected and leave the
    /// total unchanged.
    pub fn try_add_in_place<T: Operand>(&mut self, rhs: T) -> Result<(), QuantityError> {
        self.value = self.value.try_add(rhs)?;
        Ok(())
    }

    pub fn try_subtract_in_place<T: Operand>(&mut self, rhs: T) -> Result<(), QuantityError> {
        self.value = self.value.try_sub(rhs)?;
        Ok(())
    }

    pub fn try_multiply_in_place<T: Operand>(&mut self, rhs: T) -> Result<(), QuantityError> {
        self.value = self.value.try_mul(rhs)?;
        Ok(())
    }

    pub fn try_divide_in_place<T: Operand>(&mut self, rhs: T) -> Result<(), QuantityError> {
        self.value = self.value.try_div(rhs)?;
        Ok(())
    }
}

impl From<Quantity> for QuantityAccumulator {
    fn from(value: Quantity) -> Self {
        Self { value }
    }
}

impl AddAssign<Quantity> for QuantityAccumulator {
    fn add_assign(&mut self, rhs: Quantity) {
        self.add_in_place(rhs);
    }
}

impl SubAssign<Quantity> for QuantityAccumulator {
    fn sub_assign(&mut self, rhs: Quantity) {
        self.subtract_in_place(rhs);
    }
}

impl MulAssign<Quantity> for QuantityAccumulator {
    fn mul_assign(&mut self, rhs: Quantity) {
        self.multiply_in_place(rhs);
    }
}

// ===========================================================================
// Tests
// ===========================================================================

//! Interop with the engine's Q32.32 fixed-point type.

use fixed::types::I32F32;

use crate::quantity::{Quantity, SINGLE_UNIT};

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Convert an f64 to Fixed64, saturating at the type bounds.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::saturating_from_num(v)
}

/// Convert Fixed64 to f64 for display.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

impl Quantity {
    /// Convert to Q32.32, saturating at [`Fixed64::MAX`].
    ///
    /// The fraction is converted exactly as `fraction / 10000`, without going
    /// through floating point.
    pub fn to_fixed64(&self) -> Fixed64 {
        let Ok(whole) = i32::try_from(self.magnitude()) else {
            return Fixed64::MAX;
        };
        let fraction = Fixed64::from_num(self.fraction()) / Fixed64::from_num(SINGLE_UNIT);
        Fixed64::from_num(whole).saturating_add(fraction)
    }

    /// Convert from Q32.32. Negative values become zero; fractional bits
    /// beyond four decimal digits are truncated.
    pub fn from_fixed64(value: Fixed64) -> Quantity {
        if value <= Fixed64::ZERO {
            return Quantity::ZERO;
        }
        let whole = value.to_num::<i64>();
        let fraction = (value.frac() * Fixed64::from_num(SINGLE_UNIT)).to_num::<i32>();
        Quantity::new(whole, fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_to_fixed64() {
        let q = Quantity::new(3, 2_500);
        assert_eq!(fixed64_to_f64(q.to_fixed64()), 3.25);
    }

    #[test]
    fn large_quantity_saturates_fixed64() {
        assert_eq!(Quantity::MAX.to_fixed64(), Fixed64::MAX);
        assert_eq!(Quantity::from_integer(1 << 40).to_fixed64(), Fixed64::MAX);
    }

    #[test]
    fn fixed64_to_quantity() {
        assert_eq!(
            Quantity::from_fixed64(f64_to_fixed64(12.5)),
            Quantity::new(12, 5_000)
        );
        assert_eq!(Quantity::from_fixed64(f64_to_fixed64(-4.0)), Quantity::ZERO);
    }

    #[test]
    fn fixed64_round_trip_keeps_whole_and_quarter_values() {
        for q in [Quantity::ZERO, Quantity::ONE, Quantity::new(7, 7_500)] {
            assert_eq!(Quantity::from_fixed64(q.to_fixed64()), q);
        }
    }

    #[test]
    fn fixed64_ordering_matches_quantity_ordering() {
        let a = Quantity::new(1, 9_999);
        let b = Quantity::new(2, 0);
        assert!(a < b);
        assert!(a.to_fixed64() < b.to_fixed64());
    }
}

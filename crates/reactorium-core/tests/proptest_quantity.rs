//! Property-based tests for quantity arithmetic.
//!
//! Uses proptest to generate arbitrary quantities and verify the algebraic
//! and formatting invariants hold across the whole value range.

use proptest::prelude::*;
use reactorium_core::quantity::{MAX_FRACTION, MAX_MAGNITUDE};
use reactorium_core::{Quantity, QuantityAccumulator, QuantityRecord};

// ===========================================================================
// Generators
// ===========================================================================

fn arb_quantity() -> impl Strategy<Value = Quantity> {
    (0..=MAX_MAGNITUDE, 0..=MAX_FRACTION).prop_map(|(m, f)| Quantity::from_raw(m, f))
}

/// Quantities small enough that sums and products never saturate.
fn arb_small_quantity() -> impl Strategy<Value = Quantity> {
    (0..1_000_000u64, 0..=MAX_FRACTION).prop_map(|(m, f)| Quantity::from_raw(m, f))
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Adding then subtracting the same value restores the original.
    #[test]
    fn add_then_subtract_round_trips(a in arb_quantity(), b in arb_quantity()) {
        if let Some(sum) = a.checked_add(b) {
            prop_assert_eq!(sum - b, a);
        }
    }

    /// Every result stays inside the representable range.
    #[test]
    fn results_stay_in_range(a in arb_quantity(), b in arb_quantity()) {
        for result in [a + b, a - b, a * b] {
            prop_assert!(result.magnitude() <= MAX_MAGNITUDE);
            prop_assert!(result.fraction() <= MAX_FRACTION);
        }
    }

    /// Saturating addition never returns less than either operand.
    #[test]
    fn addition_is_monotonic(a in arb_quantity(), b in arb_quantity()) {
        let sum = a + b;
        prop_assert!(sum >= a);
        prop_assert!(sum >= b);
    }

    #[test]
    fn addition_commutes(a in arb_quantity(), b in arb_quantity()) {
        prop_assert_eq!(a + b, b + a);
    }

    #[test]
    fn multiplication_commutes(a in arb_quantity(), b in arb_quantity()) {
        prop_assert_eq!(a * b, b * a);
    }

    /// Multiplying by one is the identity.
    #[test]
    fn one_is_multiplicative_identity(a in arb_quantity()) {
        prop_assert_eq!(a * Quantity::ONE, a);
    }

    /// Dividing a product by a whole-number factor recovers the original.
    #[test]
    fn divide_undoes_whole_multiplication(a in arb_small_quantity(), k in 1..1_000i64) {
        let factor = Quantity::from_integer(k);
        prop_assert_eq!((a * factor).checked_div(factor).unwrap(), a);
    }

    /// Ordering agrees with the float conversion for small values.
    #[test]
    fn ordering_matches_f64(a in arb_small_quantity(), b in arb_small_quantity()) {
        prop_assert_eq!(a < b, a.to_f64() < b.to_f64());
    }

    /// Display output parses back to the same value.
    #[test]
    fn display_parses_back(a in arb_quantity()) {
        let text = a.to_string();
        prop_assert_eq!(text.parse::<Quantity>().unwrap(), a);
    }

    /// The wire form decodes to the encoded value and consumes every byte.
    #[test]
    fn wire_form_decodes(a in arb_quantity()) {
        let mut buf = Vec::new();
        a.write_to(&mut buf);
        prop_assert_eq!(buf.len(), a.encoded_len());
        let mut input = buf.as_slice();
        prop_assert_eq!(Quantity::read_from(&mut input).unwrap(), a);
        prop_assert!(input.is_empty());
    }

    /// Records with arbitrary field values always load as valid quantities.
    #[test]
    fn any_record_loads(value in any::<i64>(), decimal in any::<i16>()) {
        let q = Quantity::from(QuantityRecord { value, decimal });
        prop_assert!(q.fraction() <= MAX_FRACTION);
        prop_assert_eq!(q.magnitude(), value.max(0) as u64);
    }

    /// An accumulator sees the same result as the pure operations.
    #[test]
    fn accumulator_matches_pure_ops(a in arb_quantity(), b in arb_quantity(), c in arb_quantity()) {
        let mut acc = QuantityAccumulator::from(a);
        acc += b;
        acc -= c;
        prop_assert_eq!(acc.value(), (a + b) - c);
    }
}

// ===========================================================================
// Serde formats
// ===========================================================================

#[test]
fn json_record_uses_value_and_decimal_fields() {
    let json = serde_json::to_string(&Quantity::new(12, 345)).unwrap();
    assert_eq!(json, r#"{"value":12,"decimal":345}"#);
    let back: Quantity = serde_json::from_str(&json).unwrap();
    assert_eq!(back, Quantity::new(12, 345));
}

#[test]
fn json_missing_fields_read_as_zero() {
    let q: Quantity = serde_json::from_str("{}").unwrap();
    assert_eq!(q, Quantity::ZERO);
    let q: Quantity = serde_json::from_str(r#"{"value":-5,"decimal":5}"#).unwrap();
    assert_eq!(q, Quantity::new(0, 5));
}

#[test]
fn bitcode_snapshot_keeps_quantities() {
    let stored = vec![Quantity::ZERO, Quantity::new(1, 1), Quantity::MAX];
    let bytes = bitcode::serialize(&stored).unwrap();
    let back: Vec<Quantity> = bitcode::deserialize(&bytes).unwrap();
    assert_eq!(back, stored);
}

//! Reactorium Core -- quantity accounting for machines, energy and heat.
//!
//! Every energy buffer, heat capacitor and fluid tank in a Reactorium game
//! measures its contents with the same saturating fixed-point type. This
//! crate owns that type and the small amount of plumbing around it.
//!
//! # Quantities
//!
//! A [`quantity::Quantity`] is a non-negative number with a 63-bit whole part
//! and four decimal digits of fraction. Arithmetic never panics and never
//! wraps: overflow saturates to [`quantity::Quantity::MAX`] and subtraction
//! below zero clamps to [`quantity::Quantity::ZERO`].
//!
//! Values are immutable and `Copy`. Code that accumulates in place uses a
//! [`quantity::QuantityAccumulator`], which can only be mutated through
//! `&mut`, so shared constants can never be modified.
//!
//! ```rust,ignore
//! let mut stored = QuantityAccumulator::new();
//! stored += Quantity::new(5, 9_999);
//! stored += Quantity::new(0, 1);
//! assert_eq!(stored.value(), Quantity::from_integer(6));
//! ```
//!
//! # Key Types
//!
//! - [`quantity::Quantity`] -- Immutable saturating fixed-point value.
//! - [`quantity::QuantityAccumulator`] -- Mutable running total.
//! - [`quantity::QuantityRecord`] -- Persisted key-value form (serde).
//! - [`codec`] -- Compact binary wire form (varint magnitude + 16-bit fraction).
//! - [`fixed::Fixed64`] -- Q32.32 interop type for deterministic engine math.
//! - [`heat::HeatHandler`] -- Heat capacitor accounting built on quantities.

pub mod codec;
pub mod fixed;
pub mod heat;
pub mod quantity;

pub use quantity::{Operand, Quantity, QuantityAccumulator, QuantityError, QuantityRecord};

//! Shared test helpers for unit tests, integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests and, via the `test-utils` feature, to other
//! crates.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use crate::coord::Coord;
use crate::fission::{AlwaysAlive, FissionValidator, Role, ScanOutcome};

pub fn coord(x: i32, y: i32, z: i32) -> Coord {
    Coord::new(x, y, z)
}

/// Builds a reactor interior and the matching classifier.
///
/// Positions keep their insertion order so tests can control scan order.
#[derive(Debug, Clone, Default)]
pub struct InteriorBuilder {
    order: Vec<Coord>,
    roles: HashMap<Coord, Role>,
}

impl InteriorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn place(&mut self, at: Coord, role: Role) -> &mut Self {
        if self.roles.insert(at, role).is_none() {
            self.order.push(at);
        }
        self
    }

    pub fn fuel(&mut self, x: i32, y: i32, z: i32) -> &mut Self {
        self.place(coord(x, y, z), Role::FuelAssembly)
    }

    pub fn control_rod(&mut self, x: i32, y: i32, z: i32) -> &mut Self {
        self.place(coord(x, y, z), Role::ControlRod)
    }

    pub fn other(&mut self, x: i32, y: i32, z: i32) -> &mut Self {
        self.place(coord(x, y, z), Role::Other)
    }

    /// A well-formed column: fuel at every height in `heights`, control rod
    /// directly above.
    pub fn column(&mut self, x: i32, z: i32, heights: Range<i32>) -> &mut Self {
        let top = heights.end;
        for y in heights {
            self.fuel(x, y, z);
        }
        self.control_rod(x, top, z)
    }

    /// Every placed position, in insertion order.
    pub fn interior(&self) -> Vec<Coord> {
        self.order.clone()
    }

    /// A classifier answering from the placed roles.
    pub fn classifier(&self) -> impl Fn(Coord) -> Role + Clone + Send + Sync + 'static {
        let roles = Arc::new(self.roles.clone());
        move |at| roles.get(&at).copied().unwrap_or_default()
    }

    /// Validate with default config and a structure that never goes away.
    pub fn validate(&self) -> ScanOutcome {
        FissionValidator::new(self.classifier()).validate(self.interior(), &AlwaysAlive)
    }
}

/// A square reactor core: `size x size` columns of fuel `height` tall,
/// each capped with a control rod.
pub fn square_core(size: i32, height: i32) -> InteriorBuilder {
    let mut interior = InteriorBuilder::new();
    for x in 0..size {
        for z in 0..size {
            interior.column(x, z, 0..height);
        }
    }
    interior
}

//! Heat accounting on top of [`Quantity`].
//!
//! A heat handler exposes one or more capacitors. Each capacitor has a heat
//! capacity, a temperature and two inverse coefficients (conduction to
//! neighbours, insulation to the environment). Incoming heat is split across
//! capacitors in proportion to their heat capacity.

use serde::{Deserialize, Serialize};

use crate::quantity::{Quantity, QuantityAccumulator};

// ---------------------------------------------------------------------------
// Heat packets
// ---------------------------------------------------------------------------

/// Direction of a heat transfer relative to the receiving capacitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TransferKind {
    /// The capacitor gains heat.
    #[default]
    Absorb,
    /// The capacitor loses heat.
    Emit,
}

/// An amount of heat moving into or out of a capacitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HeatPacket {
    pub kind: TransferKind,
    pub amount: Quantity,
}

impl HeatPacket {
    pub fn absorb(amount: Quantity) -> Self {
        Self {
            kind: TransferKind::Absorb,
            amount,
        }
    }

    pub fn emit(amount: Quantity) -> Self {
        Self {
            kind: TransferKind::Emit,
            amount,
        }
    }

    /// A packet of the same kind carrying `ratio` of this packet's heat.
    /// Negative and NaN ratios yield an empty packet.
    pub fn split(&self, ratio: f64) -> HeatPacket {
        Self {
            kind: self.kind,
            amount: self.amount.saturating_mul(Quantity::from_f64(ratio)),
        }
    }
}

// ---------------------------------------------------------------------------
// HeatHandler
// ---------------------------------------------------------------------------

/// Anything that stores heat in one or more capacitors.
pub trait HeatHandler {
    fn capacitor_count(&self) -> usize;

    fn temperature(&self, capacitor: usize) -> Quantity;

    fn inverse_conduction(&self, capacitor: usize) -> Quantity;

    fn inverse_insulation(&self, capacitor: usize) -> Quantity;

    fn heat_capacity(&self, capacitor: usize) -> Quantity;

    fn handle_heat(&mut self, capacitor: usize, packet: HeatPacket);

    /// Capacity-weighted mean temperature across all capacitors.
    fn total_temperature(&self) -> Quantity {
        let total_capacity = self.total_heat_capacity();
        let weighted: Quantity = (0..self.capacitor_count())
            .map(|c| self.temperature(c) * self.heat_capacity(c))
            .sum();
        weighted
            .checked_div(total_capacity)
            .unwrap_or(Quantity::ZERO)
    }

    fn total_inverse_conduction(&self) -> Quantity {
        (0..self.capacitor_count())
            .map(|c| self.inverse_conduction(c))
            .sum()
    }

    fn total_inverse_insulation(&self) -> Quantity {
        (0..self.capacitor_count())
            .map(|c| self.inverse_insulation(c))
            .sum()
    }

    fn total_heat_capacity(&self) -> Quantity {
        (0..self.capacitor_count())
            .map(|c| self.heat_capacity(c))
            .sum()
    }

    /// Distribute a packet over every capacitor by share of heat capacity.
    /// With no capacity anywhere the packet is split evenly.
    fn handle_heat_change(&mut self, packet: HeatPacket) {
        let count = self.capacitor_count();
        let total_capacity = self.total_heat_capacity();
        for capacitor in 0..count {
            let share = if total_capacity.is_empty() {
                1.0 / count as f64
            } else {
                self.heat_capacity(capacitor).divide_to_level(total_capacity)
            };
            self.handle_heat(capacitor, packet.split(share));
        }
    }
}

// ---------------------------------------------------------------------------
// HeatCapacitor
// ---------------------------------------------------------------------------

/// A single capacitor. Stored heat is tracked directly; temperature is
/// `stored heat / heat capacity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatCapacitor {
    heat: QuantityAccumulator,
    heat_capacity: Quantity,
    inverse_conduction: Quantity,
    inverse_insulation: Quantity,
}

impl HeatCapacitor {
    pub fn new(heat_capacity: Quantity, inverse_conduction: Quantity, inverse_insulation: Quantity) -> Self {
        Self {
            heat: QuantityAccumulator::new(),
            heat_capacity,
            inverse_conduction,
            inverse_insulation,
        }
    }

    /// Start at `temperature` instead of absolute zero.
    pub fn with_temperature(mut self, temperature: Quantity) -> Self {
        self.heat.set(temperature * self.heat_capacity);
        self
    }

    pub fn stored_heat(&self) -> Quantity {
        self.heat.value()
    }
}

impl HeatHandler for HeatCapacitor {
    fn capacitor_count(&self) -> usize {
        1
    }

    fn temperature(&self, _capacitor: usize) -> Quantity {
        self.heat
            .value()
            .checked_div(self.heat_capacity)
            .unwrap_or(Quantity::ZERO)
    }

    fn inverse_conduction(&self, _capacitor: usize) -> Quantity {
        self.inverse_conduction
    }

    fn inverse_insulation(&self, _capacitor: usize) -> Quantity {
        self.inverse_insulation
    }

    fn heat_capacity(&self, _capacitor: usize) -> Quantity {
        self.heat_capacity
    }

    fn handle_heat(&mut self, _capacitor: usize, packet: HeatPacket) {
        match packet.kind {
            TransferKind::Absorb => self.heat += packet.amount,
            TransferKind::Emit => self.heat -= packet.amount,
        }
    }
}

/// A handler backed by several independent capacitors.
impl HeatHandler for Vec<HeatCapacitor> {
    fn capacitor_count(&self) -> usize {
        self.len()
    }

    fn temperature(&self, capacitor: usize) -> Quantity {
        self.get(capacitor)
            .map_or(Quantity::ZERO, |c| c.temperature(0))
    }

    fn inverse_conduction(&self, capacitor: usize) -> Quantity {
        self.get(capacitor)
            .map_or(Quantity::ZERO, |c| c.inverse_conduction)
    }

    fn inverse_insulation(&self, capacitor: usize) -> Quantity {
        self.get(capacitor)
            .map_or(Quantity::ZERO, |c| c.inverse_insulation)
    }

    fn heat_capacity(&self, capacitor: usize) -> Quantity {
        self.get(capacitor).map_or(Quantity::ZERO, |c| c.heat_capacity)
    }

    fn handle_heat(&mut self, capacitor: usize, packet: HeatPacket) {
        if let Some(c) = self.get_mut(capacitor) {
            c.handle_heat(0, packet);
        }
    }
}

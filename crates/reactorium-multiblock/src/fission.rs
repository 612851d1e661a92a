//! Fuel-assembly validation for fission reactor interiors.
//!
//! Every interior position is classified as a fuel assembly, a control rod,
//! or anything else. Positions are grouped by `(x, z)` column into
//! [`AssemblyColumn`]s. A reactor forms when every column holds a gap-free
//! vertical run of fuel assemblies with one control rod directly on top.
//!
//! Columns live in a single [`SlotMap`] arena for the duration of one scan,
//! indexed by column key, and are dropped when validation finishes.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};
use tracing::debug;

use crate::config::ScanConfig;
use crate::coord::{ColumnKey, Coord, Face};

new_key_type! {
    /// Identifies an assembly column within one scan.
    pub struct AssemblyId;
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// What occupies an interior position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    FuelAssembly,
    ControlRod,
    /// Air, coolant, or anything else the validator ignores.
    #[default]
    Other,
}

/// Looks up the role of an interior position (block type lookup in the game
/// layer).
pub trait Classifier {
    fn classify(&self, coord: Coord) -> Role;
}

impl<F> Classifier for F
where
    F: Fn(Coord) -> Role,
{
    fn classify(&self, coord: Coord) -> Role {
        self(coord)
    }
}

/// Reports whether the structure being scanned still exists.
pub trait Liveness {
    fn is_alive(&self) -> bool;
}

impl Liveness for AtomicBool {
    fn is_alive(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

/// A liveness source that never goes away, for synchronous validation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAlive;

impl Liveness for AlwaysAlive {
    fn is_alive(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Why an interior failed to form a reactor. These are expected outcomes
/// shown to the player, not internal faults.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormationError {
    /// A column holds a second control rod.
    #[error("extra control rod at {at}; each fuel assembly column takes one")]
    ExtraControlRod { at: Coord },
    /// No fuel assemblies or control rods anywhere in the interior.
    #[error("reactor interior has no fuel assemblies")]
    MissingFuelAssembly,
    /// A column lacks fuel assemblies or a control rod.
    #[error("fuel assembly column {column} needs fuel assemblies and a control rod")]
    BadFuelAssembly { column: ColumnKey },
    /// A column's fuel assemblies are not contiguous.
    #[error("fuel assembly at {at} is not directly above the one below it")]
    MalformedFuelAssembly { at: Coord },
    /// A control rod is not directly above its column's top fuel assembly.
    #[error("control rod at {at} must sit directly on top of its fuel assemblies")]
    BadControlRod { at: Coord },
    /// The interior exceeds the configured scan limit.
    #[error("reactor interior exceeds the scan limit of {limit} positions")]
    InteriorTooLarge { limit: usize },
}

impl FormationError {
    /// Stable translation key for the player-facing message.
    pub fn reason_key(&self) -> &'static str {
        match self {
            FormationError::ExtraControlRod { .. } => "fission_reactor.invalid.extra_control_rod",
            FormationError::MissingFuelAssembly => "fission_reactor.invalid.missing_fuel_assembly",
            FormationError::BadFuelAssembly { .. } => "fission_reactor.invalid.bad_fuel_assembly",
            FormationError::MalformedFuelAssembly { .. } => {
                "fission_reactor.invalid.malformed_fuel_assembly"
            }
            FormationError::BadControlRod { .. } => "fission_reactor.invalid.bad_control_rod",
            FormationError::InteriorTooLarge { .. } => "fission_reactor.invalid.too_large",
        }
    }

    /// The offending position, when the failure has one.
    pub fn coordinate(&self) -> Option<Coord> {
        match self {
            FormationError::ExtraControlRod { at }
            | FormationError::MalformedFuelAssembly { at }
            | FormationError::BadControlRod { at } => Some(*at),
            FormationError::MissingFuelAssembly
            | FormationError::BadFuelAssembly { .. }
            | FormationError::InteriorTooLarge { .. } => None,
        }
    }
}

/// Aggregates for a successfully formed reactor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormedReactor {
    /// Total fuel assemblies across all columns.
    pub fuel_assemblies: usize,
    /// Exposed fuel surface, in block faces under the default weights.
    pub surface_area: i64,
    /// Fuel assembly positions in scan order.
    pub internal_locations: Vec<Coord>,
}

/// How a scan ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Formed(FormedReactor),
    Failed(FormationError),
    /// The structure went away mid-scan; nothing was produced.
    Aborted,
}

impl ScanOutcome {
    pub fn is_formed(&self) -> bool {
        matches!(self, ScanOutcome::Formed(_))
    }

    /// `None` for an aborted scan.
    pub fn into_result(self) -> Option<Result<FormedReactor, FormationError>> {
        match self {
            ScanOutcome::Formed(reactor) => Some(Ok(reactor)),
            ScanOutcome::Failed(err) => Some(Err(err)),
            ScanOutcome::Aborted => None,
        }
    }
}

// ---------------------------------------------------------------------------
// AssemblyColumn
// ---------------------------------------------------------------------------

/// The fuel assemblies and control rod found in one `(x, z)` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyColumn {
    key: ColumnKey,
    /// Fuel assembly heights, ascending.
    fuel: BTreeSet<i32>,
    control_rod: Option<i32>,
}

impl AssemblyColumn {
    fn new(key: ColumnKey) -> Self {
        Self {
            key,
            fuel: BTreeSet::new(),
            control_rod: None,
        }
    }

    pub fn key(&self) -> ColumnKey {
        self.key
    }

    /// Check the column shape: at least one fuel assembly, no gaps, control
    /// rod exactly one above the top fuel assembly.
    pub fn validate(&self) -> Result<(), FormationError> {
        let (Some(&bottom), Some(rod)) = (self.fuel.first(), self.control_rod) else {
            return Err(FormationError::BadFuelAssembly { column: self.key });
        };
        let mut expected = bottom;
        for &y in &self.fuel {
            if y != expected {
                return Err(FormationError::MalformedFuelAssembly {
                    at: self.key.at(y),
                });
            }
            expected = y.saturating_add(1);
        }
        if rod != expected {
            return Err(FormationError::BadControlRod {
                at: self.key.at(rod),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FissionValidator
// ---------------------------------------------------------------------------

/// Validates reactor interiors using a caller-supplied classifier.
#[derive(Debug, Clone)]
pub struct FissionValidator<C> {
    classifier: C,
    config: ScanConfig,
}

impl<C: Classifier> FissionValidator<C> {
    pub fn new(classifier: C) -> Self {
        Self::with_config(classifier, ScanConfig::default())
    }

    pub fn with_config(classifier: C, config: ScanConfig) -> Self {
        Self { classifier, config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Classify and validate an interior in a single pass.
    ///
    /// `liveness` is checked before every `liveness_check_interval`-th
    /// position; if the structure is gone the scan stops with
    /// [`ScanOutcome::Aborted`]. A second control rod in a column fails
    /// immediately. Columns are validated in the order they were first seen,
    /// so the first failing column reported is deterministic for a given
    /// input order.
    pub fn validate<I, L>(&self, interior: I, liveness: &L) -> ScanOutcome
    where
        I: IntoIterator<Item = Coord>,
        L: Liveness + ?Sized,
    {
        let interval = self.config.liveness_interval();
        let weights = self.config.surface;

        let mut columns: SlotMap<AssemblyId, AssemblyColumn> = SlotMap::with_key();
        let mut by_key: HashMap<ColumnKey, AssemblyId> = HashMap::new();
        let mut fuel_coords: HashSet<Coord> = HashSet::new();
        let mut internal_locations = Vec::new();
        let mut surface_area: i64 = 0;

        for (step, coord) in interior.into_iter().enumerate() {
            if step % interval == 0 && !liveness.is_alive() {
                debug!(step, "fission scan aborted: structure no longer alive");
                return ScanOutcome::Aborted;
            }
            if let Some(limit) = self.config.max_interior_nodes {
                if step >= limit {
                    debug!(limit, "fission scan stopped: interior too large");
                    return ScanOutcome::Failed(FormationError::InteriorTooLarge { limit });
                }
            }

            let role = self.classifier.classify(coord);
            if role == Role::Other {
                continue;
            }
            let key = coord.column();
            let id = match by_key.entry(key) {
                Entry::Occupied(entry) => *entry.get(),
                Entry::Vacant(entry) => *entry.insert(columns.insert(AssemblyColumn::new(key))),
            };
            let column = &mut columns[id];

            match role {
                Role::FuelAssembly => {
                    if fuel_coords.contains(&coord) {
                        continue;
                    }
                    column.fuel.insert(coord.y);
                    surface_area += i64::from(weights.per_element);
                    for neighbour in Face::ALL.into_iter().filter_map(|face| coord.offset(face)) {
                        if fuel_coords.contains(&neighbour) {
                            surface_area -= i64::from(weights.per_shared_face);
                        }
                    }
                    fuel_coords.insert(coord);
                    internal_locations.push(coord);
                }
                Role::ControlRod => match column.control_rod {
                    None => column.control_rod = Some(coord.y),
                    Some(existing) if existing == coord.y => {}
                    Some(_) => {
                        let err = FormationError::ExtraControlRod { at: coord };
                        debug!(reason = err.reason_key(), at = %coord, "fission reactor failed to form");
                        return ScanOutcome::Failed(err);
                    }
                },
                Role::Other => {}
            }
        }

        if columns.is_empty() {
            debug!("fission reactor failed to form: no fuel assemblies");
            return ScanOutcome::Failed(FormationError::MissingFuelAssembly);
        }

        // Slot order is insertion order: nothing is removed during a scan.
        for column in columns.values() {
            if let Err(err) = column.validate() {
                debug!(reason = err.reason_key(), column = %column.key(), "fission reactor failed to form");
                return ScanOutcome::Failed(err);
            }
        }

        ScanOutcome::Formed(FormedReactor {
            fuel_assemblies: fuel_coords.len(),
            surface_area,
            internal_locations,
        })
    }
}

// ===========================================================================
// Tests
// ===========================================================================

//! Multiblock structure validation for Reactorium.
//!
//! A multiblock is a shell of casing blocks enclosing an interior. Frame
//! detection (finding the shell and collecting interior coordinates) happens
//! in the game layer; this crate takes the interior and decides whether it
//! forms a working structure.
//!
//! # Fission reactors
//!
//! Reactor interiors hold fuel assemblies stacked in vertical columns, each
//! column topped by exactly one control rod. [`fission::FissionValidator`]
//! groups interior coordinates by `(x, z)` column, checks every column, and
//! reports the fuel count and exposed fuel surface area.
//!
//! # Scanning
//!
//! Validation runs off the main loop. [`scan::ScanScheduler`] starts scans on
//! the rayon pool and commits a result only if it came from the newest scan;
//! older results are discarded. A shared liveness flag lets the owner abort
//! scans that are still running when the structure is destroyed.
//!
//! # Key Types
//!
//! - [`coord::Coord`] / [`coord::Face`] -- Block positions and the six faces.
//! - [`fission::FissionValidator`] -- Fuel-assembly column validation.
//! - [`fission::FormationError`] -- Recoverable reasons a structure failed.
//! - [`ports::derive_ports`] -- Which shell face each port opens onto.
//! - [`scan::ScanScheduler`] -- Background scans with latest-wins commits.
//! - [`config::ScanConfig`] -- Tunables loaded from RON, TOML or JSON.

pub mod config;
pub mod coord;
pub mod fission;
pub mod ports;
pub mod scan;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use coord::{ColumnKey, Coord, Face};
pub use fission::{FissionValidator, FormationError, FormedReactor, Role, ScanOutcome};
pub use ports::{Bounds, PortData, derive_ports};
pub use scan::{ScanScheduler, ScanState, ScanToken};

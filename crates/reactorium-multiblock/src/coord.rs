//! Block coordinates, vertical columns and the six block faces.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Coord
// ---------------------------------------------------------------------------

/// A block position. `y` is the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The neighbouring position across `face`, or `None` past the edge of
    /// the `i32` grid.
    pub fn offset(&self, face: Face) -> Option<Coord> {
        let (dx, dy, dz) = face.offset();
        Some(Coord::new(
            self.x.checked_add(dx)?,
            self.y.checked_add(dy)?,
            self.z.checked_add(dz)?,
        ))
    }

    /// The vertical column this position belongs to.
    pub fn column(&self) -> ColumnKey {
        ColumnKey {
            x: self.x,
            z: self.z,
        }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// ColumnKey
// ---------------------------------------------------------------------------

/// Identifies a vertical column by its `(x, z)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnKey {
    pub x: i32,
    pub z: i32,
}

impl ColumnKey {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The position at height `y` in this column.
    pub fn at(&self, y: i32) -> Coord {
        Coord::new(self.x, y, self.z)
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

// ---------------------------------------------------------------------------
// Face
// ---------------------------------------------------------------------------

/// The six faces of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    Down,
    Up,
    North,
    South,
    West,
    East,
}

impl Face {
    /// All six faces.
    pub const ALL: [Face; 6] = [
        Face::Down,
        Face::Up,
        Face::North,
        Face::South,
        Face::West,
        Face::East,
    ];

    /// Unit offset `(dx, dy, dz)` toward this face. North is `-z`.
    pub fn offset(&self) -> (i32, i32, i32) {
        match self {
            Face::Down => (0, -1, 0),
            Face::Up => (0, 1, 0),
            Face::North => (0, 0, -1),
            Face::South => (0, 0, 1),
            Face::West => (-1, 0, 0),
            Face::East => (1, 0, 0),
        }
    }

    pub fn opposite(&self) -> Face {
        match self {
            Face::Down => Face::Up,
            Face::Up => Face::Down,
            Face::North => Face::South,
            Face::South => Face::North,
            Face::West => Face::East,
            Face::East => Face::West,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_unit_vectors() {
        for face in Face::ALL {
            let (dx, dy, dz) = face.offset();
            assert_eq!(dx.abs() + dy.abs() + dz.abs(), 1);
        }
    }

    #[test]
    fn opposite_faces_cancel() {
        let origin = Coord::new(4, 5, 6);
        for face in Face::ALL {
            let back = origin.offset(face).and_then(|n| n.offset(face.opposite()));
            assert_eq!(back, Some(origin));
            assert_ne!(face, face.opposite());
        }
    }

    #[test]
    fn offset_past_grid_edge_is_none() {
        let corner = Coord::new(i32::MAX, i32::MIN, i32::MAX);
        assert_eq!(corner.offset(Face::East), None);
        assert_eq!(corner.offset(Face::Down), None);
        assert_eq!(corner.offset(Face::South), None);
        assert_eq!(corner.offset(Face::West), Some(Coord::new(i32::MAX - 1, i32::MIN, i32::MAX)));
    }

    #[test]
    fn column_ignores_height() {
        let a = Coord::new(1, 0, 2);
        let b = Coord::new(1, 9, 2);
        assert_eq!(a.column(), b.column());
        assert_eq!(a.column().at(9), b);
    }

    #[test]
    fn display_formats() {
        assert_eq!(Coord::new(1, -2, 3).to_string(), "(1, -2, 3)");
        assert_eq!(ColumnKey::new(4, 5).to_string(), "(4, 5)");
    }
}

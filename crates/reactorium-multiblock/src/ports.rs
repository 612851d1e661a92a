//! Boundary port derivation.
//!
//! Once a structure forms, its port blocks (where fluids and heat move in and
//! out) need to know which outer face of the shell they sit on.

use serde::{Deserialize, Serialize};

use crate::coord::{Coord, Face};

/// An inclusive axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Coord,
    pub max: Coord,
}

impl Bounds {
    /// The box spanned by two corners, in any order.
    pub fn new(a: Coord, b: Coord) -> Self {
        Self {
            min: Coord::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Coord::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// The smallest box containing every position, or `None` if empty.
    pub fn enclosing<I: IntoIterator<Item = Coord>>(positions: I) -> Option<Self> {
        positions.into_iter().fold(None, |acc, c| match acc {
            None => Some(Bounds::new(c, c)),
            Some(b) => Some(Bounds::new(
                Coord::new(b.min.x.min(c.x), b.min.y.min(c.y), b.min.z.min(c.z)),
                Coord::new(b.max.x.max(c.x), b.max.y.max(c.y), b.max.z.max(c.z)),
            )),
        })
    }

    pub fn contains(&self, c: Coord) -> bool {
        (self.min.x..=self.max.x).contains(&c.x)
            && (self.min.y..=self.max.y).contains(&c.y)
            && (self.min.z..=self.max.z).contains(&c.z)
    }

    /// The shell face a position lies on.
    ///
    /// Edges and corners belong to more than one face; the first match in
    /// West, East, Down, Up, North, South order wins. Positions inside the
    /// box or outside it have no side.
    pub fn side_of(&self, c: Coord) -> Option<Face> {
        if !self.contains(c) {
            return None;
        }
        if c.x == self.min.x {
            Some(Face::West)
        } else if c.x == self.max.x {
            Some(Face::East)
        } else if c.y == self.min.y {
            Some(Face::Down)
        } else if c.y == self.max.y {
            Some(Face::Up)
        } else if c.z == self.min.z {
            Some(Face::North)
        } else if c.z == self.max.z {
            Some(Face::South)
        } else {
            None
        }
    }
}

/// A port on the structure shell and the face it opens onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortData {
    pub location: Coord,
    pub side: Face,
}

/// Collect every location the caller marks as a port, with its shell face.
/// Marked locations that are not on the shell are skipped.
pub fn derive_ports<I, P>(locations: I, bounds: &Bounds, is_port: P) -> Vec<PortData>
where
    I: IntoIterator<Item = Coord>,
    P: Fn(Coord) -> bool,
{
    locations
        .into_iter()
        .filter(|&c| is_port(c))
        .filter_map(|location| {
            bounds
                .side_of(location)
                .map(|side| PortData { location, side })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Bounds {
        Bounds::new(Coord::new(4, 4, 4), Coord::new(0, 0, 0))
    }

    #[test]
    fn new_normalises_corners() {
        let b = bounds();
        assert_eq!(b.min, Coord::new(0, 0, 0));
        assert_eq!(b.max, Coord::new(4, 4, 4));
    }

    #[test]
    fn enclosing_box() {
        let b = Bounds::enclosing([Coord::new(1, 5, -2), Coord::new(-3, 0, 7)]).unwrap();
        assert_eq!(b.min, Coord::new(-3, 0, -2));
        assert_eq!(b.max, Coord::new(1, 5, 7));
        assert!(Bounds::enclosing(std::iter::empty()).is_none());
    }

    #[test]
    fn face_centres_map_to_their_side() {
        let b = bounds();
        assert_eq!(b.side_of(Coord::new(0, 2, 2)), Some(Face::West));
        assert_eq!(b.side_of(Coord::new(4, 2, 2)), Some(Face::East));
        assert_eq!(b.side_of(Coord::new(2, 0, 2)), Some(Face::Down));
        assert_eq!(b.side_of(Coord::new(2, 4, 2)), Some(Face::Up));
        assert_eq!(b.side_of(Coord::new(2, 2, 0)), Some(Face::North));
        assert_eq!(b.side_of(Coord::new(2, 2, 4)), Some(Face::South));
    }

    #[test]
    fn edges_prefer_x_then_y_then_z() {
        let b = bounds();
        assert_eq!(b.side_of(Coord::new(0, 0, 0)), Some(Face::West));
        assert_eq!(b.side_of(Coord::new(2, 4, 4)), Some(Face::Up));
    }

    #[test]
    fn interior_and_outside_have_no_side() {
        let b = bounds();
        assert_eq!(b.side_of(Coord::new(2, 2, 2)), None);
        assert_eq!(b.side_of(Coord::new(9, 2, 2)), None);
    }

    #[test]
    fn derive_ports_filters_and_labels() {
        let b = bounds();
        let locations = [
            Coord::new(0, 2, 2),
            Coord::new(2, 4, 2),
            Coord::new(2, 2, 0),
            Coord::new(2, 2, 2),
        ];
        let ports = derive_ports(locations, &b, |c| c.z != 0);
        assert_eq!(
            ports,
            vec![
                PortData {
                    location: Coord::new(0, 2, 2),
                    side: Face::West
                },
                PortData {
                    location: Coord::new(2, 4, 2),
                    side: Face::Up
                },
            ]
        );
    }
}

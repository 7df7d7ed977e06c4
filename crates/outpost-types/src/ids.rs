//! Identifiers and coordinates.
//!
//! [`StructureId`] is a generational arena handle: the slot index is reused
//! after a structure is removed, but the generation is bumped so a stale
//! handle never aliases the newcomer. Handles are opaque comparison keys and
//! carry no meaning outside the manager that issued them.

use serde::{Deserialize, Serialize};

/// Opaque handle to a structure registered with the structure manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StructureId {
    /// Slot in the manager's arena.
    pub index: u32,
    /// Number of times the slot has been reused.
    pub generation: u32,
}

impl StructureId {
    /// Build a handle from its raw parts.
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl core::fmt::Display for StructureId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// A column on the surface grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TilePosition {
    /// Column, growing eastward.
    pub x: i32,
    /// Row, growing southward.
    pub y: i32,
}

impl TilePosition {
    /// Create a position.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset by a delta, or `None` if either coordinate overflows.
    pub const fn offset(self, dx: i32, dy: i32) -> Option<Self> {
        match (self.x.checked_add(dx), self.y.checked_add(dy)) {
            (Some(x), Some(y)) => Some(Self { x, y }),
            _ => None,
        }
    }
}

impl core::fmt::Display for TilePosition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A single tile: a surface position plus a depth level (0 is the surface).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileRef {
    /// Surface coordinate.
    pub position: TilePosition,
    /// Depth level, 0 for the surface.
    pub depth: u32,
}

impl TileRef {
    /// Create a tile reference.
    pub const fn new(position: TilePosition, depth: u32) -> Self {
        Self { position, depth }
    }

    /// Shorthand for a surface tile.
    pub const fn surface(x: i32, y: i32) -> Self {
        Self {
            position: TilePosition::new(x, y),
            depth: 0,
        }
    }

    /// The tile one step away in `direction`, or `None` when the step leaves
    /// the representable range (above the surface, coordinate overflow).
    pub fn step(self, direction: Direction) -> Option<Self> {
        match direction {
            Direction::Up => self.depth.checked_sub(1).map(|depth| Self { depth, ..self }),
            Direction::Down => self.depth.checked_add(1).map(|depth| Self { depth, ..self }),
            Direction::North | Direction::East | Direction::South | Direction::West => {
                let (dx, dy) = direction.offset();
                self.position
                    .offset(dx, dy)
                    .map(|position| Self { position, ..self })
            }
        }
    }
}

impl core::fmt::Display for TileRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}@{}", self.position, self.depth)
    }
}

/// One of the six grid directions the connectivity walk can follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Toward smaller `y`.
    North,
    /// Toward larger `x`.
    East,
    /// Toward larger `y`.
    South,
    /// Toward smaller `x`.
    West,
    /// One depth level shallower.
    Up,
    /// One depth level deeper.
    Down,
}

impl Direction {
    /// Every direction, in walk order.
    pub const ALL: [Self; 6] = [
        Self::North,
        Self::East,
        Self::South,
        Self::West,
        Self::Up,
        Self::Down,
    ];

    /// Planar offset of the direction. Vertical directions return `(0, 0)`.
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
            Self::Up | Self::Down => (0, 0),
        }
    }

    /// Whether the direction changes depth rather than position.
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }

    /// Whether the direction runs along the east-west axis.
    pub const fn is_east_west(self) -> bool {
        matches!(self, Self::East | Self::West)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn structure_id_ordering_is_index_then_generation() {
        let a = StructureId::new(1, 0);
        let b = StructureId::new(1, 1);
        let c = StructureId::new(2, 0);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(a.to_string(), "#1v0");
    }

    #[test]
    fn step_up_from_surface_is_none() {
        let tile = TileRef::surface(3, 4);
        assert!(tile.step(Direction::Up).is_none());
        assert_eq!(tile.step(Direction::Down).unwrap().depth, 1);
    }

    #[test]
    fn planar_steps_follow_offsets() {
        let tile = TileRef::surface(3, 4);
        assert_eq!(tile.step(Direction::North).unwrap(), TileRef::surface(3, 3));
        assert_eq!(tile.step(Direction::East).unwrap(), TileRef::surface(4, 4));
        assert_eq!(tile.step(Direction::South).unwrap(), TileRef::surface(3, 5));
        assert_eq!(tile.step(Direction::West).unwrap(), TileRef::surface(2, 4));
    }

    #[test]
    fn overflowing_step_is_none() {
        let tile = TileRef::surface(i32::MAX, 0);
        assert!(tile.step(Direction::East).is_none());
    }

    #[test]
    fn structure_id_serde_roundtrip() {
        let id = StructureId::new(7, 3);
        let json = serde_json::to_string(&id).unwrap();
        let back: StructureId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}

//! A single grid cell.

use serde::{Deserialize, Serialize};

use outpost_types::StructureId;

use crate::mine::Mine;

/// One tile of the colony grid.
///
/// Surface tiles start excavated and unbulldozed. Underground tiles start
/// unexcavated and bulldozed: there is nothing to clear until a digger
/// opens them up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Open space that can hold a structure.
    pub excavated: bool,
    /// Cleared of debris.
    pub bulldozed: bool,
    /// Reached by the last connectivity walk.
    pub connected: bool,
    /// Ore deposit on this tile, surface only.
    pub mine: Option<Mine>,
    /// Structure occupying the tile.
    pub structure: Option<StructureId>,
}

impl Tile {
    /// A fresh surface tile.
    pub const fn surface() -> Self {
        Self {
            excavated: true,
            bulldozed: false,
            connected: false,
            mine: None,
            structure: None,
        }
    }

    /// A fresh underground tile.
    pub const fn underground() -> Self {
        Self {
            excavated: false,
            bulldozed: true,
            connected: false,
            mine: None,
            structure: None,
        }
    }

    /// Nothing is built here.
    pub const fn is_empty(&self) -> bool {
        self.structure.is_none()
    }

    /// Whether a mine sits on the tile.
    pub const fn has_mine(&self) -> bool {
        self.mine.is_some()
    }
}

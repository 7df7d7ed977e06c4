//! Error types for the `outpost-world` crate.

use outpost_types::{StructureId, TilePosition, TileRef};

/// Errors that can occur during tile-grid operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The map dimensions are zero or too large to index.
    #[error("invalid map dimensions {width}x{height} with {max_depth} levels")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
        /// Requested number of underground levels.
        max_depth: u32,
    },

    /// A tile reference falls outside the map.
    #[error("tile {0} is outside the map")]
    OutOfBounds(TileRef),

    /// A structure is already registered on the tile.
    #[error("tile {tile} is already occupied by structure {occupant}")]
    TileOccupied {
        /// The contested tile.
        tile: TileRef,
        /// The structure already on it.
        occupant: StructureId,
    },

    /// A mine already exists at the position.
    #[error("a mine already exists at {0}")]
    MineAlreadyPresent(TilePosition),

    /// No mine exists at the position.
    #[error("no mine at {0}")]
    NoMine(TilePosition),
}

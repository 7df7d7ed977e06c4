//! Tile grid, ore deposits, and tube connectivity for the Outpost colony
//! simulation.
//!
//! The world layer knows nothing about structure behavior. It stores which
//! structure handle sits on each tile and asks a [`MountLookup`] how that
//! structure presents itself to its neighbors when the connectivity walk
//! runs.
//!
//! # Modules
//!
//! - [`tile`] -- Per-tile flags and occupancy
//! - [`tile_map`] -- The layered grid and mine generation
//! - [`mine`] -- Ore deposits dug level by level
//! - [`connectivity`] -- Reachability flood from the command center
//! - [`error`] -- [`WorldError`]

pub mod connectivity;
pub mod error;
pub mod mine;
pub mod tile;
pub mod tile_map;

pub use connectivity::{
    Mount, MountLookup, links, valid_structure_placement, valid_tube_connection, walk,
};
pub use error::WorldError;
pub use mine::Mine;
pub use tile::Tile;
pub use tile_map::TileMap;

//! Shared type definitions for the Outpost colony simulation.
//!
//! Every other crate in the workspace speaks in terms of the identifiers and
//! enumerations defined here, so this crate has no simulation logic of its
//! own.
//!
//! # Modules
//!
//! - [`ids`] -- Arena handles and grid coordinates
//! - [`enums`] -- Structure kinds, lifecycle states, roles, materials

pub mod enums;
pub mod ids;

pub use enums::{
    ConnectorDir, DisabledReason, IdleReason, Material, MineYield, PopulationRole,
    StructureClass, StructureKind, StructureState,
};
pub use ids::{Direction, StructureId, TilePosition, TileRef};

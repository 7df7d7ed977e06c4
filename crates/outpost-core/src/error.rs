//! Error types for the `outpost-core` crate.
//!
//! Everything here is a caller defect: a precondition the calling code was
//! supposed to uphold. Expected runtime conditions (no crew, no room, no
//! money) are reported as values instead, see
//! [`crate::colony::PlacementOutcome`] and the structure reason codes.

use outpost_ledger::PopulationError;
use outpost_types::{StructureId, StructureKind, TileRef};
use outpost_world::WorldError;

use crate::config::ConfigError;

/// Errors raised by the structure manager and component table.
#[derive(Debug, thiserror::Error)]
pub enum StructureError {
    /// The handle does not name a registered structure.
    #[error("structure {0} is not registered")]
    NotRegistered(StructureId),

    /// A component of this type is already attached.
    #[error("structure {structure} already has a {component} component")]
    ComponentAlreadyAttached {
        /// The structure.
        structure: StructureId,
        /// Component type name.
        component: &'static str,
    },

    /// A required facet is absent.
    #[error("structure {structure} has no {facet}")]
    MissingFacet {
        /// The structure.
        structure: StructureId,
        /// Facet type name.
        facet: &'static str,
    },

    /// Every structure handle index is in use.
    #[error("structure arena is full")]
    ArenaFull,

    /// Tile bookkeeping failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// Labor was requested for a role that cannot work.
    #[error("population error: {source}")]
    Population {
        /// The underlying population error.
        #[from]
        source: PopulationError,
    },
}

/// Errors raised by colony-level operations.
#[derive(Debug, thiserror::Error)]
pub enum ColonyError {
    /// Configuration was unusable.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// Tile operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// Structure bookkeeping failed.
    #[error("structure error: {source}")]
    Structure {
        /// The underlying structure error.
        #[from]
        source: StructureError,
    },

    /// A tube was placed with an orientation tubes cannot take.
    #[error("tube on {tile} cannot use a vertical connector; place an air shaft instead")]
    InvalidConnectorDirection {
        /// Where the tube was to go.
        tile: TileRef,
    },

    /// The kind must be placed through its dedicated operation.
    #[error("{kind:?} cannot be placed with place_structure")]
    DedicatedPlacement {
        /// The kind that was passed.
        kind: StructureKind,
    },

    /// The structure is not a mine facility.
    #[error("structure {0} is not a mine facility")]
    NotAMineFacility(StructureId),
}

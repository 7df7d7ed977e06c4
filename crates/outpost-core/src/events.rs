//! Turn events.
//!
//! Events are collected by the turn that produced them and handed back in
//! the [`crate::colony::TurnReport`]. Nothing is queued across turns.

use serde::{Deserialize, Serialize};

use outpost_types::{DisabledReason, IdleReason, StructureId, StructureKind};

/// Something noteworthy that happened during a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColonyEvent {
    /// Construction finished.
    Activated {
        /// The structure.
        structure: StructureId,
        /// Its kind.
        kind: StructureKind,
    },
    /// The structure went idle.
    Idled {
        /// The structure.
        structure: StructureId,
        /// Why.
        reason: IdleReason,
    },
    /// The structure was disabled.
    Disabled {
        /// The structure.
        structure: StructureId,
        /// Why.
        reason: DisabledReason,
    },
    /// The structure reached its maximum age.
    Condemned {
        /// The structure.
        structure: StructureId,
        /// Its kind.
        kind: StructureKind,
    },
    /// A mine shaft extension finished.
    ShaftExtended {
        /// The mine facility.
        structure: StructureId,
        /// New depth.
        depth: u32,
    },
    /// The structure was removed from the colony.
    Removed {
        /// The structure.
        structure: StructureId,
        /// Its kind.
        kind: StructureKind,
    },
}

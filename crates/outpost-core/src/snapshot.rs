//! Serializable view of a colony at the end of a turn.

use serde::Serialize;

use outpost_ledger::{LaborCounters, Population, ResourceStore, StorableResources};
use outpost_types::{
    DisabledReason, IdleReason, StructureId, StructureKind, StructureState, TileRef,
};

use crate::colony::Colony;

/// Energy totals from the last turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnergySnapshot {
    /// Supplied.
    pub produced: u32,
    /// Drawn.
    pub consumed: u32,
    /// Left over.
    pub available: u32,
}

/// One structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructureSnapshot {
    /// Handle.
    pub id: StructureId,
    /// Kind.
    pub kind: StructureKind,
    /// Where it sits.
    pub tile: TileRef,
    /// Lifecycle state.
    pub state: StructureState,
    /// Set while idle.
    pub idle_reason: Option<IdleReason>,
    /// Set while disabled.
    pub disabled_reason: Option<DisabledReason>,
    /// Turns since activation.
    pub age: u32,
    /// Reached by the last connectivity walk.
    pub connected: bool,
    /// Intermediate ore buffer.
    pub production: StorableResources,
    /// Finished-goods buffer.
    pub storage: ResourceStore,
}

/// The whole colony.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColonySnapshot {
    /// Colony name.
    pub name: String,
    /// Turns completed.
    pub turn: u32,
    /// Refined stockpile.
    pub stockpile: StorableResources,
    /// Labor handed out last turn.
    pub labor: LaborCounters,
    /// Energy totals.
    pub energy: EnergySnapshot,
    /// Population by role.
    pub population: Population,
    /// Structures in update order.
    pub structures: Vec<StructureSnapshot>,
}

impl ColonySnapshot {
    /// Render as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error, which does not happen for these types
    /// in practice.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Colony {
    /// Capture the colony's current state.
    pub fn snapshot(&self) -> ColonySnapshot {
        let manager = self.manager();
        let structures = manager
            .update_order()
            .into_iter()
            .filter_map(|id| {
                let s = manager.structure(id)?;
                Some(StructureSnapshot {
                    id,
                    kind: s.kind(),
                    tile: manager.tile_of(id)?,
                    state: s.state(),
                    idle_reason: s.lifecycle().idle_reason(),
                    disabled_reason: s.lifecycle().disabled_reason(),
                    age: s.age(),
                    connected: s.connected(),
                    production: s.production(),
                    storage: *s.storage(),
                })
            })
            .collect();

        ColonySnapshot {
            name: self.name().to_owned(),
            turn: self.turn(),
            stockpile: self.stockpile(),
            labor: self.labor(),
            energy: EnergySnapshot {
                produced: manager.total_energy_production(),
                consumed: manager.total_energy_consumed(),
                available: manager.total_energy_available(),
            },
            population: self.population().clone(),
            structures,
        }
    }
}

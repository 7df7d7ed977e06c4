//! Blueprints: what each structure kind costs and how it is built.
//!
//! Default numbers are defined here; the `structures` section of the config
//! may override any field per kind. The [`Catalogue`] turns a blueprint into
//! a [`Structure`] plus the components that kind carries.

use std::collections::BTreeMap;

use tracing::debug;

use outpost_ledger::StorableResources;
use outpost_types::{ConnectorDir, StructureId, StructureKind, TileRef};
use outpost_world::TileMap;

use crate::components::{EnergyProducer, Housing, LaborRequirement, StorageCapacity};
use crate::config::{BlueprintOverride, ProductionConfig, SimulationConfig};
use crate::error::StructureError;
use crate::manager::StructureManager;
use crate::structure::{Behavior, Structure, StructureSpec};

/// Build parameters for one structure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Blueprint {
    /// Turns under construction.
    pub turns_to_build: u32,
    /// Age at which the structure is condemned, 0 for never.
    pub max_age: u32,
    /// Energy drawn while running.
    pub energy_required: u32,
    /// Energy supplied while running.
    pub energy_produced: u32,
    /// Needs an operational CHAP facility.
    pub requires_chap: bool,
    /// Runs without a tube connection.
    pub self_sustained: bool,
    /// Runs without drawing on the energy budget.
    pub energy_exempt: bool,
    /// Workers in the crew.
    pub workers: u32,
    /// Scientists in the crew.
    pub scientists: u32,
    /// Refined storage added to the colony stockpile.
    pub storage_capacity: u32,
    /// Capacity of the structure's own finished-goods buffer.
    pub internal_capacity: u32,
    /// Colonists housed.
    pub residents: u32,
    /// Refined materials charged on placement.
    pub cost: StorableResources,
    /// Refined materials consumed per operational turn.
    pub resource_input: StorableResources,
}

impl Blueprint {
    /// Overwrite every field the override sets.
    pub fn apply(&mut self, o: &BlueprintOverride) {
        if let Some(v) = o.turns_to_build {
            self.turns_to_build = v;
        }
        if let Some(v) = o.max_age {
            self.max_age = v;
        }
        if let Some(v) = o.energy_required {
            self.energy_required = v;
        }
        if let Some(v) = o.energy_produced {
            self.energy_produced = v;
        }
        if let Some(v) = o.requires_chap {
            self.requires_chap = v;
        }
        if let Some(v) = o.self_sustained {
            self.self_sustained = v;
        }
        if let Some(v) = o.energy_exempt {
            self.energy_exempt = v;
        }
        if let Some(v) = o.workers {
            self.workers = v;
        }
        if let Some(v) = o.scientists {
            self.scientists = v;
        }
        if let Some(v) = o.storage_capacity {
            self.storage_capacity = v;
        }
        if let Some(v) = o.internal_capacity {
            self.internal_capacity = v;
        }
        if let Some(v) = o.residents {
            self.residents = v;
        }
        if let Some(v) = o.cost {
            self.cost = v;
        }
        if let Some(v) = o.resource_input {
            self.resource_input = v;
        }
    }

    /// The fixed attributes handed to [`Structure::new`].
    pub const fn spec(&self) -> StructureSpec {
        StructureSpec {
            turns_to_build: self.turns_to_build,
            max_age: self.max_age,
            energy_required: self.energy_required,
            energy_exempt: self.energy_exempt,
            requires_chap: self.requires_chap,
            self_sustained: self.self_sustained,
            resource_input: self.resource_input,
            internal_capacity: self.internal_capacity,
        }
    }
}

/// Built-in blueprint for a kind.
#[allow(clippy::too_many_lines)]
pub fn default_blueprint(kind: StructureKind) -> Blueprint {
    let base = Blueprint::default();
    match kind {
        StructureKind::CommandCenter => Blueprint {
            turns_to_build: 1,
            self_sustained: true,
            storage_capacity: 1000,
            ..base
        },
        StructureKind::SeedPower => Blueprint {
            turns_to_build: 5,
            energy_produced: 50,
            self_sustained: true,
            ..base
        },
        StructureKind::SeedSmelter => Blueprint {
            turns_to_build: 6,
            energy_required: 5,
            internal_capacity: 400,
            ..base
        },
        StructureKind::SolarPlant => Blueprint {
            turns_to_build: 4,
            energy_produced: 100,
            cost: StorableResources::new(40, 20, 10, 0),
            ..base
        },
        StructureKind::FusionReactor => Blueprint {
            turns_to_build: 10,
            energy_produced: 1000,
            workers: 10,
            scientists: 5,
            cost: StorableResources::new(100, 60, 40, 20),
            ..base
        },
        StructureKind::MineFacility => Blueprint {
            turns_to_build: 2,
            max_age: 1200,
            self_sustained: true,
            internal_capacity: 500,
            cost: StorableResources::new(30, 10, 0, 0),
            ..base
        },
        StructureKind::Smelter => Blueprint {
            turns_to_build: 9,
            max_age: 600,
            energy_required: 5,
            workers: 4,
            internal_capacity: 800,
            cost: StorableResources::new(50, 30, 10, 5),
            ..base
        },
        StructureKind::Chap => Blueprint {
            turns_to_build: 5,
            energy_required: 10,
            workers: 2,
            cost: StorableResources::new(40, 20, 5, 5),
            ..base
        },
        StructureKind::Residence => Blueprint {
            turns_to_build: 2,
            energy_required: 2,
            requires_chap: true,
            residents: 25,
            cost: StorableResources::new(20, 15, 0, 0),
            ..base
        },
        StructureKind::StorageTanks => Blueprint {
            turns_to_build: 2,
            energy_required: 1,
            storage_capacity: 1000,
            cost: StorableResources::new(15, 5, 0, 0),
            ..base
        },
        StructureKind::Laboratory => Blueprint {
            turns_to_build: 6,
            energy_required: 5,
            requires_chap: true,
            scientists: 3,
            cost: StorableResources::new(30, 20, 10, 10),
            ..base
        },
        StructureKind::SurfacePolice => Blueprint {
            turns_to_build: 4,
            max_age: 500,
            energy_required: 5,
            requires_chap: true,
            workers: 2,
            cost: StorableResources::new(25, 15, 5, 0),
            ..base
        },
        StructureKind::Tube | StructureKind::AirShaft => Blueprint {
            energy_exempt: true,
            cost: StorableResources::new(5, 0, 0, 0),
            ..base
        },
    }
}

/// Blueprints for every kind, with config overrides applied.
#[derive(Debug, Clone)]
pub struct Catalogue {
    blueprints: BTreeMap<StructureKind, Blueprint>,
    production: ProductionConfig,
    max_mine_depth: u32,
}

impl Catalogue {
    /// Build the catalogue from configuration.
    pub fn from_config(config: &SimulationConfig) -> Self {
        let blueprints = StructureKind::ALL
            .iter()
            .map(|&kind| {
                let mut blueprint = default_blueprint(kind);
                if let Some(o) = config.structures.get(&kind) {
                    blueprint.apply(o);
                    debug!(?kind, "Blueprint override applied");
                }
                (kind, blueprint)
            })
            .collect();
        Self {
            blueprints,
            production: config.production.clone(),
            max_mine_depth: config.map.max_depth,
        }
    }

    /// Blueprint for `kind`.
    pub fn blueprint(&self, kind: StructureKind) -> Blueprint {
        self.blueprints
            .get(&kind)
            .copied()
            .unwrap_or_else(|| default_blueprint(kind))
    }

    /// Production settings behaviors are built with.
    pub const fn production(&self) -> &ProductionConfig {
        &self.production
    }

    /// A fresh, unregistered structure of `kind`.
    pub fn build(&self, kind: StructureKind, connector: Option<ConnectorDir>) -> Structure {
        let blueprint = self.blueprint(kind);
        Structure::new(
            kind,
            blueprint.spec(),
            connector,
            Behavior::for_kind(kind, &self.production, self.max_mine_depth),
        )
    }

    /// Build a structure of `kind`, register it on `tile` and attach the
    /// components its blueprint calls for. Does not charge the cost.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::World`] if the tile cannot take it.
    pub fn create(
        &self,
        manager: &mut StructureManager,
        map: &mut TileMap,
        kind: StructureKind,
        tile: TileRef,
        connector: Option<ConnectorDir>,
    ) -> Result<StructureId, StructureError> {
        let blueprint = self.blueprint(kind);
        let id = manager.add_structure(map, tile, self.build(kind, connector))?;
        if blueprint.energy_produced > 0 {
            manager.attach(
                id,
                EnergyProducer {
                    output: blueprint.energy_produced,
                },
            )?;
        }
        if blueprint.workers > 0 || blueprint.scientists > 0 {
            manager.attach(
                id,
                LaborRequirement::new(blueprint.workers, blueprint.scientists),
            )?;
        }
        if blueprint.storage_capacity > 0 {
            manager.attach(
                id,
                StorageCapacity {
                    capacity: blueprint.storage_capacity,
                },
            )?;
        }
        if blueprint.residents > 0 {
            manager.attach(
                id,
                Housing {
                    capacity: blueprint.residents,
                    occupants: 0,
                },
            )?;
        }
        Ok(id)
    }
}

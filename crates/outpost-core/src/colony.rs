//! The colony: map, structures, population, and the refined stockpile,
//! advanced one turn at a time.
//!
//! A turn runs in this order:
//!
//! 1. connectivity walk from the command center
//! 2. structure pass ([`StructureManager::update`])
//! 3. ore moves from mine facilities into operational refineries
//! 4. refined output moves into the stockpile, bounded by storage capacity
//! 5. colonists are housed
//! 6. destroyed structures are removed
//!
//! Build actions are checked up front and report why they were refused as
//! a [`PlacementRejection`] value; only misuse of the API is an error.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use outpost_ledger::{LaborCounters, LedgerError, Population, PopulationPool, ResourceStore, StorableResources};
use outpost_types::{
    ConnectorDir, StructureClass, StructureId, StructureKind, TilePosition, TileRef,
};
use outpost_world::{TileMap, valid_structure_placement, valid_tube_connection, walk};

use crate::catalogue::Catalogue;
use crate::config::SimulationConfig;
use crate::error::{ColonyError, StructureError};
use crate::events::ColonyEvent;
use crate::manager::StructureManager;
use crate::structure::Behavior;

/// Why a build action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlacementRejection {
    /// The tile is off the map.
    OutOfBounds,
    /// A mine deposit occupies the tile.
    MineInTheWay,
    /// Another structure occupies the tile.
    TileOccupied,
    /// The tile needs bulldozing first.
    NotBulldozed,
    /// The tile has not been dug out.
    NotExcavated,
    /// No connected tube opens toward the tile.
    NoTubeConnection,
    /// The stockpile cannot pay for it.
    InsufficientResources {
        /// Build cost.
        required: StorableResources,
        /// Stockpile at the time.
        available: StorableResources,
    },
    /// There is no deposit to work.
    NoMine,
    /// The deposit already has a mine facility.
    MineAlreadyWorked,
    /// A command center already exists.
    CommandCenterExists,
}

/// Result of a build action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlacementOutcome {
    /// The structure was registered.
    Placed(StructureId),
    /// Nothing changed.
    Rejected(PlacementRejection),
}

impl PlacementOutcome {
    /// The new structure's handle, if placed.
    pub const fn placed(self) -> Option<StructureId> {
        match self {
            Self::Placed(id) => Some(id),
            Self::Rejected(_) => None,
        }
    }
}

/// What happened during one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnReport {
    /// Turn number, starting at 1.
    pub turn: u32,
    /// Energy supplied.
    pub energy_produced: u32,
    /// Energy drawn.
    pub energy_consumed: u32,
    /// Energy left over.
    pub energy_available: u32,
    /// Labor handed out.
    pub labor: LaborCounters,
    /// Refined stockpile after the turn.
    pub stockpile: StorableResources,
    /// Tiles reached by the connectivity walk.
    pub connected_tiles: usize,
    /// Events raised, in order.
    pub events: Vec<ColonyEvent>,
    /// Structures removed at the end of the turn.
    pub removed: Vec<(StructureId, StructureKind)>,
    /// Colonists without a residence.
    pub unhoused: u32,
}

/// Tile offsets of the seed lander footprint, relative to its center.
const LANDER_FOOTPRINT: [(i32, i32); 9] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (0, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// A colony in progress.
#[derive(Debug)]
pub struct Colony {
    name: String,
    catalogue: Catalogue,
    map: TileMap,
    manager: StructureManager,
    population: Population,
    stockpile: ResourceStore,
    labor: LaborCounters,
    turn: u32,
    command_center: Option<StructureId>,
    overlay: Vec<TileRef>,
}

impl Colony {
    /// Found a colony: build the map, scatter deposits, stock the starting
    /// stockpile and population. No structures exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`ColonyError::Config`] for invalid settings or
    /// [`ColonyError::World`] if the map dimensions are unusable.
    pub fn new(config: &SimulationConfig) -> Result<Self, ColonyError> {
        config.validate()?;
        let mut map = TileMap::new(config.map.width, config.map.height, config.map.max_depth)?;
        let mut rng = StdRng::seed_from_u64(config.colony.seed);
        let yields = &config.mine_yields;
        let mines = map.scatter_mines(config.map.mine_count, &mut rng, |r| yields.vein(r));

        let mut stockpile = ResourceStore::unbounded();
        stockpile.resources = config.colony.starting_resources;

        info!(
            colony = %config.colony.name,
            seed = config.colony.seed,
            width = config.map.width,
            height = config.map.height,
            mines = mines.len(),
            "Colony founded"
        );

        Ok(Self {
            name: config.colony.name.clone(),
            catalogue: Catalogue::from_config(config),
            map,
            manager: StructureManager::new(),
            population: config.colony.population.clone(),
            stockpile,
            labor: LaborCounters::default(),
            turn: 0,
            command_center: None,
            overlay: Vec::new(),
        })
    }

    // -------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------

    /// Colony name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Turns completed.
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// The tile map.
    pub const fn map(&self) -> &TileMap {
        &self.map
    }

    /// The structure registry.
    pub const fn manager(&self) -> &StructureManager {
        &self.manager
    }

    /// Blueprints in use.
    pub const fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Current population.
    pub const fn population(&self) -> &Population {
        &self.population
    }

    /// Replace the population, e.g. after births or deaths.
    pub fn set_population(&mut self, population: Population) {
        self.population = population;
    }

    /// Refined stockpile.
    pub const fn stockpile(&self) -> StorableResources {
        self.stockpile.resources
    }

    /// Labor handed out last turn.
    pub const fn labor(&self) -> LaborCounters {
        self.labor
    }

    /// The command center, once placed.
    pub const fn command_center(&self) -> Option<StructureId> {
        self.command_center
    }

    /// Tiles reached by the last connectivity walk, root first.
    pub fn connectivity_overlay(&self) -> &[TileRef] {
        &self.overlay
    }

    // -------------------------------------------------------------------
    // Turn
    // -------------------------------------------------------------------

    /// Advance the colony by one turn.
    ///
    /// # Errors
    ///
    /// Returns [`ColonyError::Structure`] if the registry is inconsistent.
    pub fn advance_turn(&mut self) -> Result<TurnReport, ColonyError> {
        self.turn = self.turn.saturating_add(1);
        debug!(turn = self.turn, "Turn started");

        self.update_connectivity();

        let mut pool = PopulationPool::new(&self.population);
        pool.clear();
        let mut events =
            self.manager
                .update(&mut self.stockpile.resources, &mut pool, &mut self.map)?;
        self.labor = pool.counters();

        self.transfer_ore();
        self.collect_refined();

        let unhoused = self
            .manager
            .assign_colonists_to_residences(self.population.total());
        if unhoused > 0 {
            debug!(unhoused, "Colonists without housing");
        }

        let removed = self.remove_destroyed()?;
        if !removed.is_empty() {
            self.update_connectivity();
        }
        events.extend(
            removed
                .iter()
                .map(|&(structure, kind)| ColonyEvent::Removed { structure, kind }),
        );

        let report = TurnReport {
            turn: self.turn,
            energy_produced: self.manager.total_energy_production(),
            energy_consumed: self.manager.total_energy_consumed(),
            energy_available: self.manager.total_energy_available(),
            labor: self.labor,
            stockpile: self.stockpile.resources,
            connected_tiles: self.overlay.len(),
            events,
            removed,
            unhoused,
        };
        info!(
            turn = report.turn,
            energy_produced = report.energy_produced,
            energy_consumed = report.energy_consumed,
            workers = report.labor.workers_used,
            scientists = report.labor.scientists_used,
            stockpile = report.stockpile.total_materials(),
            events = report.events.len(),
            "Turn complete"
        );
        Ok(report)
    }

    /// Rebuild the connected flags from the command center. Runs at the
    /// start of every turn and after every change to the network.
    fn update_connectivity(&mut self) {
        self.manager.disconnect_all(&mut self.map);
        self.overlay.clear();
        let root = self.command_center.and_then(|id| {
            let built = self.manager.structure(id).is_some_and(|s| {
                !s.lifecycle().is_under_construction() && !s.lifecycle().is_destroyed()
            });
            if built { self.manager.tile_of(id) } else { None }
        });
        if let Some(root) = root {
            self.overlay = walk(&mut self.map, root, &self.manager);
        }
        self.manager.sync_connectivity(&self.map);
    }

    fn transfer_ore(&mut self) {
        let mines = self.manager.structures_of_class(StructureClass::Mine).to_vec();
        let refineries = self.manager.structures_of_class(StructureClass::Smelter).to_vec();

        for mine_id in mines {
            let ore = match self.manager.structure_mut(mine_id) {
                Some(s) if s.is_mine_facility() && !s.lifecycle().is_destroyed() => {
                    s.storage_mut().take_all()
                }
                _ => continue,
            };
            if ore.is_empty() {
                continue;
            }
            let mut remaining = ore;
            for refinery_id in &refineries {
                if remaining.is_empty() {
                    break;
                }
                if let Some(refinery) = self
                    .manager
                    .structure_mut(*refinery_id)
                    .filter(|s| s.lifecycle().is_operational())
                {
                    remaining = refinery.accept_ore(remaining);
                }
            }
            if let Some(facility) = self.manager.structure_mut(mine_id) {
                let lost = facility.storage_mut().push(remaining);
                if !lost.is_empty() {
                    warn!(structure = %mine_id, lost = lost.total_materials(), "Ore did not fit back into mine storage");
                }
            }
            let moved = ore.saturating_sub(remaining);
            if !moved.is_empty() {
                debug!(structure = %mine_id, moved = moved.total_materials(), "Ore delivered");
            }
        }
    }

    fn collect_refined(&mut self) {
        self.stockpile.capacity = Some(self.manager.total_storage_capacity());
        let refineries = self.manager.structures_of_class(StructureClass::Smelter).to_vec();
        for id in refineries {
            let Some(refinery) = self.manager.structure_mut(id) else {
                continue;
            };
            let output = refinery.storage_mut().take_all();
            if output.is_empty() {
                continue;
            }
            let rejected = self.stockpile.push(output);
            refinery.storage_mut().push(rejected);
            if !rejected.is_empty() {
                debug!(structure = %id, held_back = rejected.total_materials(), "Stockpile full");
            }
        }
    }

    fn remove_destroyed(&mut self) -> Result<Vec<(StructureId, StructureKind)>, ColonyError> {
        let tiles: Vec<(StructureId, Option<TileRef>)> = self
            .manager
            .update_order()
            .into_iter()
            .filter(|id| {
                self.manager
                    .structure(*id)
                    .is_some_and(|s| s.lifecycle().is_destroyed())
            })
            .map(|id| (id, self.manager.tile_of(id)))
            .collect();
        let removed = self.manager.remove_destroyed(&mut self.map)?;
        for &(id, kind) in &removed {
            let tile = tiles.iter().find(|(t, _)| *t == id).and_then(|(_, tile)| *tile);
            self.forget(id, kind, tile);
            info!(structure = %id, ?kind, "Destroyed structure removed");
        }
        Ok(removed)
    }

    fn forget(&mut self, id: StructureId, kind: StructureKind, tile: Option<TileRef>) {
        if kind == StructureKind::MineFacility {
            if let Some(mine) = tile.and_then(|t| self.map.mine_mut(t.position)) {
                mine.set_active(false);
            }
        }
        if self.command_center == Some(id) {
            warn!(structure = %id, "Command center lost");
            self.command_center = None;
        }
    }

    // -------------------------------------------------------------------
    // Build actions
    // -------------------------------------------------------------------

    fn check_site(&self, tile: TileRef) -> Option<PlacementRejection> {
        let Some(t) = self.map.tile(tile) else {
            return Some(PlacementRejection::OutOfBounds);
        };
        if t.has_mine() {
            return Some(PlacementRejection::MineInTheWay);
        }
        if t.structure.is_some() {
            return Some(PlacementRejection::TileOccupied);
        }
        if !t.bulldozed {
            return Some(PlacementRejection::NotBulldozed);
        }
        if !t.excavated {
            return Some(PlacementRejection::NotExcavated);
        }
        None
    }

    fn charge(&mut self, kind: StructureKind) -> Option<PlacementRejection> {
        let cost = self.catalogue.blueprint(kind).cost;
        match self.stockpile.resources.try_subtract(cost) {
            Ok(()) => None,
            Err(LedgerError::Insufficient {
                requested,
                available,
            }) => Some(PlacementRejection::InsufficientResources {
                required: requested,
                available,
            }),
        }
    }

    fn rejected(kind: StructureKind, tile: TileRef, reason: PlacementRejection) -> PlacementOutcome {
        debug!(?kind, %tile, ?reason, "Placement rejected");
        PlacementOutcome::Rejected(reason)
    }

    /// Land the seed lander centered on `center`: bulldoze the 3x3 footprint
    /// and place the command center, seed power plant, seed smelter and the
    /// tubes joining them.
    ///
    /// # Errors
    ///
    /// Returns [`ColonyError::Structure`] if the registry is inconsistent.
    pub fn deploy_seed_lander(&mut self, center: TilePosition) -> Result<PlacementOutcome, ColonyError> {
        let kind = StructureKind::CommandCenter;
        let at = TileRef::new(center, 0);
        if self.command_center.is_some() {
            return Ok(Self::rejected(kind, at, PlacementRejection::CommandCenterExists));
        }

        let mut footprint = Vec::with_capacity(LANDER_FOOTPRINT.len());
        for (dx, dy) in LANDER_FOOTPRINT {
            let Some(tile) = center.offset(dx, dy).map(|p| TileRef::new(p, 0)) else {
                return Ok(Self::rejected(kind, at, PlacementRejection::OutOfBounds));
            };
            let Some(t) = self.map.tile(tile) else {
                return Ok(Self::rejected(kind, at, PlacementRejection::OutOfBounds));
            };
            if t.has_mine() {
                return Ok(Self::rejected(kind, at, PlacementRejection::MineInTheWay));
            }
            if t.structure.is_some() {
                return Ok(Self::rejected(kind, at, PlacementRejection::TileOccupied));
            }
            footprint.push(tile);
        }
        for tile in footprint {
            self.map.bulldoze(tile)?;
        }

        let place = |dx: i32, dy: i32| center.offset(dx, dy).map(|p| TileRef::new(p, 0));
        let layout = [
            (StructureKind::CommandCenter, place(-1, -1), None),
            (StructureKind::Tube, place(0, -1), Some(ConnectorDir::Intersection)),
            (StructureKind::SeedPower, place(1, -1), None),
            (StructureKind::Tube, place(0, 0), Some(ConnectorDir::Left)),
            (StructureKind::Tube, place(0, 1), Some(ConnectorDir::Intersection)),
            (StructureKind::SeedSmelter, place(-1, 1), None),
        ];
        let mut command_center = None;
        for (part, tile, connector) in layout {
            let Some(tile) = tile else {
                continue;
            };
            let id = self
                .catalogue
                .create(&mut self.manager, &mut self.map, part, tile, connector)?;
            if part == StructureKind::CommandCenter {
                command_center = Some(id);
            }
        }
        self.command_center = command_center;
        self.update_connectivity();
        info!(%center, "Seed lander deployed");
        Ok(command_center.map_or(
            PlacementOutcome::Rejected(PlacementRejection::OutOfBounds),
            PlacementOutcome::Placed,
        ))
    }

    /// Place a facility on `tile`, charging its cost.
    ///
    /// # Errors
    ///
    /// Returns [`ColonyError::DedicatedPlacement`] for tubes, air shafts,
    /// mine facilities and lander parts, which have their own operations.
    pub fn place_structure(
        &mut self,
        kind: StructureKind,
        tile: TileRef,
    ) -> Result<PlacementOutcome, ColonyError> {
        if kind.is_connector()
            || matches!(
                kind,
                StructureKind::CommandCenter
                    | StructureKind::SeedPower
                    | StructureKind::SeedSmelter
                    | StructureKind::MineFacility
            )
        {
            error!(?kind, "Kind has a dedicated placement operation");
            return Err(ColonyError::DedicatedPlacement { kind });
        }
        if let Some(reason) = self.check_site(tile) {
            return Ok(Self::rejected(kind, tile, reason));
        }
        let blueprint = self.catalogue.blueprint(kind);
        if !blueprint.self_sustained && !valid_structure_placement(&self.map, &self.manager, tile) {
            return Ok(Self::rejected(kind, tile, PlacementRejection::NoTubeConnection));
        }
        if let Some(reason) = self.charge(kind) {
            return Ok(Self::rejected(kind, tile, reason));
        }
        let id = self
            .catalogue
            .create(&mut self.manager, &mut self.map, kind, tile, None)?;
        self.update_connectivity();
        Ok(PlacementOutcome::Placed(id))
    }

    /// Place a tube on `tile`.
    ///
    /// # Errors
    ///
    /// Returns [`ColonyError::InvalidConnectorDirection`] for
    /// [`ConnectorDir::Vertical`]; use [`Self::place_air_shaft`] instead.
    pub fn place_tube(&mut self, tile: TileRef, dir: ConnectorDir) -> Result<PlacementOutcome, ColonyError> {
        let kind = StructureKind::Tube;
        if dir == ConnectorDir::Vertical {
            error!(%tile, "Tube placed with a vertical connector");
            return Err(ColonyError::InvalidConnectorDirection { tile });
        }
        if let Some(reason) = self.check_site(tile) {
            return Ok(Self::rejected(kind, tile, reason));
        }
        if !valid_tube_connection(&self.map, &self.manager, tile, dir) {
            return Ok(Self::rejected(kind, tile, PlacementRejection::NoTubeConnection));
        }
        if let Some(reason) = self.charge(kind) {
            return Ok(Self::rejected(kind, tile, reason));
        }
        let id = self
            .catalogue
            .create(&mut self.manager, &mut self.map, kind, tile, Some(dir))?;
        self.update_connectivity();
        Ok(PlacementOutcome::Placed(id))
    }

    /// Sink an air shaft from `tile` to the level below. The lower tile is
    /// dug out and gets the shaft's bottom segment. Returns the top segment.
    ///
    /// # Errors
    ///
    /// Returns [`ColonyError::Structure`] if the registry is inconsistent.
    pub fn place_air_shaft(&mut self, tile: TileRef) -> Result<PlacementOutcome, ColonyError> {
        let kind = StructureKind::AirShaft;
        if let Some(reason) = self.check_site(tile) {
            return Ok(Self::rejected(kind, tile, reason));
        }
        let below = TileRef::new(tile.position, tile.depth.saturating_add(1));
        if tile.depth >= self.map.max_depth() || !self.map.contains(below) {
            return Ok(Self::rejected(kind, tile, PlacementRejection::OutOfBounds));
        }
        if self.map.structure_at(below).is_some() {
            return Ok(Self::rejected(kind, below, PlacementRejection::TileOccupied));
        }
        if !valid_tube_connection(&self.map, &self.manager, tile, ConnectorDir::Vertical) {
            return Ok(Self::rejected(kind, tile, PlacementRejection::NoTubeConnection));
        }
        if let Some(reason) = self.charge(kind) {
            return Ok(Self::rejected(kind, tile, reason));
        }
        self.map.excavate(below)?;
        self.map.bulldoze(below)?;
        let top = self.catalogue.create(
            &mut self.manager,
            &mut self.map,
            kind,
            tile,
            Some(ConnectorDir::Vertical),
        )?;
        self.catalogue.create(
            &mut self.manager,
            &mut self.map,
            kind,
            below,
            Some(ConnectorDir::Vertical),
        )?;
        self.update_connectivity();
        info!(%tile, depth = below.depth, "Air shaft sunk");
        Ok(PlacementOutcome::Placed(top))
    }

    /// Put a mine facility on the deposit at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`ColonyError::Structure`] if the registry is inconsistent.
    pub fn place_mine_facility(&mut self, position: TilePosition) -> Result<PlacementOutcome, ColonyError> {
        let kind = StructureKind::MineFacility;
        let tile = TileRef::new(position, 0);
        let Some(t) = self.map.tile(tile) else {
            return Ok(Self::rejected(kind, tile, PlacementRejection::OutOfBounds));
        };
        let Some(mine) = &t.mine else {
            return Ok(Self::rejected(kind, tile, PlacementRejection::NoMine));
        };
        if t.structure.is_some() || mine.active() {
            return Ok(Self::rejected(kind, tile, PlacementRejection::MineAlreadyWorked));
        }
        if let Some(reason) = self.charge(kind) {
            return Ok(Self::rejected(kind, tile, reason));
        }
        let id = self
            .catalogue
            .create(&mut self.manager, &mut self.map, kind, tile, None)?;
        self.update_connectivity();
        info!(structure = %id, %position, "Mine facility placed");
        Ok(PlacementOutcome::Placed(id))
    }

    /// Tear down a structure and leave its tile bulldozed.
    ///
    /// # Errors
    ///
    /// Returns [`ColonyError::Structure`] for an unknown handle.
    pub fn bulldoze_structure(&mut self, id: StructureId) -> Result<(), ColonyError> {
        let tile = self
            .manager
            .tile_of(id)
            .ok_or(StructureError::NotRegistered(id))?;
        let structure = self.manager.remove_structure(&mut self.map, id)?;
        self.forget(id, structure.kind(), Some(tile));
        self.map.bulldoze(tile)?;
        self.update_connectivity();
        info!(structure = %id, kind = ?structure.kind(), %tile, "Structure bulldozed");
        Ok(())
    }

    /// Clear debris from an empty tile. Returns `false` if a structure or
    /// deposit is in the way.
    ///
    /// # Errors
    ///
    /// Returns [`ColonyError::World`] for an off-map tile.
    pub fn bulldoze_tile(&mut self, tile: TileRef) -> Result<bool, ColonyError> {
        let t = self.map.get(tile)?;
        if t.structure.is_some() || t.has_mine() {
            return Ok(false);
        }
        self.map.bulldoze(tile)?;
        Ok(true)
    }

    /// Dig out an underground tile. Returns `false` for surface tiles and
    /// tiles already dug.
    ///
    /// # Errors
    ///
    /// Returns [`ColonyError::World`] for an off-map tile.
    pub fn excavate_tile(&mut self, tile: TileRef) -> Result<bool, ColonyError> {
        if self.map.get(tile)?.excavated || tile.depth == 0 {
            return Ok(false);
        }
        self.map.excavate(tile)?;
        debug!(%tile, "Tile excavated");
        Ok(true)
    }

    /// Start digging a mine facility's shaft one level deeper. Returns
    /// `false` if the shaft is at full depth or already being extended.
    ///
    /// # Errors
    ///
    /// Returns [`ColonyError::NotAMineFacility`] if `id` is not a mine
    /// facility.
    pub fn extend_mine(&mut self, id: StructureId) -> Result<bool, ColonyError> {
        let tile = self
            .manager
            .tile_of(id)
            .ok_or(StructureError::NotRegistered(id))?;
        let Some(Behavior::Mine(facility)) = self.manager.structure_mut(id).map(|s| s.behavior_mut()) else {
            return Err(ColonyError::NotAMineFacility(id));
        };
        let Some(mine) = self.map.mine(tile.position) else {
            return Err(outpost_world::WorldError::NoMine(tile.position).into());
        };
        let started = facility.extend(mine);
        if started {
            info!(structure = %id, depth = mine.depth(), "Shaft extension started");
        }
        Ok(started)
    }

    /// Switch a structure off or back on.
    ///
    /// # Errors
    ///
    /// Returns [`ColonyError::Structure`] for an unknown handle.
    pub fn set_force_idle(&mut self, id: StructureId, force_idle: bool) -> Result<(), ColonyError> {
        let structure = self
            .manager
            .structure_mut(id)
            .ok_or(StructureError::NotRegistered(id))?;
        structure.lifecycle_mut().set_force_idle(force_idle);
        debug!(structure = %id, force_idle, "Force idle toggled");
        Ok(())
    }
}

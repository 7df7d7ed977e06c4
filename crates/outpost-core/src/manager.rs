//! Structure registry and per-turn update pass.
//!
//! The [`StructureManager`] owns every structure in a generational arena,
//! remembers which tile each one sits on, keeps a per-class index in
//! registration order, and holds the optional component table. Each turn it
//! walks the classes in priority order and runs every structure through the
//! same gate sequence:
//!
//! 1. advance construction or age
//! 2. skip structures still under construction or destroyed
//! 3. tube connection, unless self-sustained
//! 4. life support, if required
//! 5. crew from the population pool
//! 6. refined-resource input
//! 7. energy from the running budget
//! 8. `think()`
//!
//! A structure failing a gate is disabled with that gate's reason and does
//! not think this turn. Labor granted before a later gate fails is handed
//! back to the pool.

use std::collections::BTreeMap;

use tracing::{debug, error, info};

use outpost_ledger::{PopulationPool, Scope, StorableResources};
use outpost_types::{
    DisabledReason, StructureClass, StructureId, StructureKind, StructureState, TileRef,
};
use outpost_world::{Mount, MountLookup, TileMap};

use crate::components::{
    Component, ComponentTable, EnergyProducer, Housing, LaborRequirement, StorageCapacity,
};
use crate::error::StructureError;
use crate::events::ColonyEvent;
use crate::structure::{Lifecycle, Progress, Structure, ThinkEvent};

#[derive(Debug)]
struct Entry {
    structure: Structure,
    tile: TileRef,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// Something retrievable by structure handle, whether it lives on the
/// [`Structure`] itself or in the component table.
pub trait Facet: Sized + 'static {
    /// Name used in diagnostics.
    const NAME: &'static str;

    /// Borrow the facet of `id`.
    fn lookup(manager: &StructureManager, id: StructureId) -> Option<&Self>;

    /// Mutably borrow the facet of `id`.
    fn lookup_mut(manager: &mut StructureManager, id: StructureId) -> Option<&mut Self>;
}

impl Facet for Structure {
    const NAME: &'static str = "Structure";

    fn lookup(manager: &StructureManager, id: StructureId) -> Option<&Self> {
        manager.entry(id).map(|e| &e.structure)
    }

    fn lookup_mut(manager: &mut StructureManager, id: StructureId) -> Option<&mut Self> {
        manager.entry_mut(id).map(|e| &mut e.structure)
    }
}

macro_rules! component_facet {
    ($($name:ty),* $(,)?) => {
        $(
            impl Facet for $name {
                const NAME: &'static str = <$name as Component>::NAME;

                fn lookup(manager: &StructureManager, id: StructureId) -> Option<&Self> {
                    manager.components.get::<$name>(id)
                }

                fn lookup_mut(manager: &mut StructureManager, id: StructureId) -> Option<&mut Self> {
                    manager.components.get_mut::<$name>(id)
                }
            }
        )*
    };
}

component_facet!(EnergyProducer, LaborRequirement, StorageCapacity, Housing);

/// Result of running a structure through the gates.
enum Admission {
    Admitted { energy: u32 },
    Refused(DisabledReason),
}

/// Registry of every structure in the colony.
#[derive(Debug, Default)]
pub struct StructureManager {
    slots: Vec<Slot>,
    free: Vec<u32>,
    classes: BTreeMap<StructureClass, Vec<StructureId>>,
    components: ComponentTable,
    energy_produced: u32,
    energy_consumed: u32,
}

impl StructureManager {
    /// An empty registry.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            classes: BTreeMap::new(),
            components: ComponentTable::new(),
            energy_produced: 0,
            energy_consumed: 0,
        }
    }

    // -------------------------------------------------------------------
    // Arena
    // -------------------------------------------------------------------

    fn slot_index(id: StructureId) -> Option<usize> {
        usize::try_from(id.index).ok()
    }

    fn entry(&self, id: StructureId) -> Option<&Entry> {
        let slot = self.slots.get(Self::slot_index(id)?)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    fn entry_mut(&mut self, id: StructureId) -> Option<&mut Entry> {
        let slot = self.slots.get_mut(Self::slot_index(id)?)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    fn next_id(&self) -> Result<StructureId, StructureError> {
        if let Some(&index) = self.free.last() {
            let generation = usize::try_from(index)
                .ok()
                .and_then(|i| self.slots.get(i))
                .map_or(0, |s| s.generation);
            return Ok(StructureId::new(index, generation));
        }
        let index = u32::try_from(self.slots.len()).map_err(|_e| StructureError::ArenaFull)?;
        Ok(StructureId::new(index, 0))
    }

    /// Register `structure` on `tile` and return its handle.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::World`] if the tile is off the map or
    /// already occupied.
    pub fn add_structure(
        &mut self,
        map: &mut TileMap,
        tile: TileRef,
        structure: Structure,
    ) -> Result<StructureId, StructureError> {
        let id = self.next_id()?;
        map.set_structure(tile, id)?;

        let kind = structure.kind();
        let entry = Entry { structure, tile };
        if self.free.last() == Some(&id.index) {
            self.free.pop();
            if let Some(slot) = Self::slot_index(id).and_then(|i| self.slots.get_mut(i)) {
                slot.entry = Some(entry);
            }
        } else {
            self.slots.push(Slot {
                generation: id.generation,
                entry: Some(entry),
            });
        }
        self.classes.entry(kind.class()).or_default().push(id);
        info!(structure = %id, ?kind, %tile, "Structure registered");
        Ok(id)
    }

    /// Unregister a structure, evicting its components and freeing its tile.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::NotRegistered`] if `id` is unknown or stale.
    pub fn remove_structure(
        &mut self,
        map: &mut TileMap,
        id: StructureId,
    ) -> Result<Structure, StructureError> {
        let Some(slot) = Self::slot_index(id)
            .and_then(|i| self.slots.get_mut(i))
            .filter(|s| s.generation == id.generation && s.entry.is_some())
        else {
            error!(structure = %id, "Attempted to remove an unregistered structure");
            return Err(StructureError::NotRegistered(id));
        };
        let Some(entry) = slot.entry.take() else {
            return Err(StructureError::NotRegistered(id));
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);

        let kind = entry.structure.kind();
        if let Some(list) = self.classes.get_mut(&kind.class()) {
            list.retain(|other| *other != id);
        }
        let evicted = self.components.remove_all(id);
        if map.structure_at(entry.tile) == Some(id) {
            map.clear_structure(entry.tile);
        }
        debug!(structure = %id, ?kind, evicted, "Structure removed");
        Ok(entry.structure)
    }

    /// Whether `id` names a registered structure.
    pub fn contains(&self, id: StructureId) -> bool {
        self.entry(id).is_some()
    }

    /// Borrow a structure.
    pub fn structure(&self, id: StructureId) -> Option<&Structure> {
        self.entry(id).map(|e| &e.structure)
    }

    /// Mutably borrow a structure.
    pub fn structure_mut(&mut self, id: StructureId) -> Option<&mut Structure> {
        self.entry_mut(id).map(|e| &mut e.structure)
    }

    /// Tile a structure sits on.
    pub fn tile_of(&self, id: StructureId) -> Option<TileRef> {
        self.entry(id).map(|e| e.tile)
    }

    /// Number of registered structures.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.entry.is_some()).count()
    }

    /// Whether no structures are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handles in update order: class priority, then registration order.
    pub fn update_order(&self) -> Vec<StructureId> {
        StructureClass::UPDATE_ORDER
            .iter()
            .filter_map(|class| self.classes.get(class))
            .flatten()
            .copied()
            .collect()
    }

    /// Handles of one class in registration order.
    pub fn structures_of_class(&self, class: StructureClass) -> &[StructureId] {
        self.classes.get(&class).map_or(&[], Vec::as_slice)
    }

    /// First registered structure of a kind.
    pub fn first_of_kind(&self, kind: StructureKind) -> Option<StructureId> {
        self.structures_of_class(kind.class())
            .iter()
            .copied()
            .find(|id| self.structure(*id).is_some_and(|s| s.kind() == kind))
    }

    // -------------------------------------------------------------------
    // Components
    // -------------------------------------------------------------------

    /// Attach a component to a registered structure.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::NotRegistered`] for an unknown handle or
    /// [`StructureError::ComponentAlreadyAttached`] on a second attach.
    pub fn attach<T: Component>(&mut self, id: StructureId, component: T) -> Result<(), StructureError> {
        if !self.contains(id) {
            error!(structure = %id, component = T::NAME, "Attach to unregistered structure");
            return Err(StructureError::NotRegistered(id));
        }
        self.components.attach(id, component).inspect_err(|e| {
            error!(structure = %id, error = %e, "Component attach rejected");
        })
    }

    /// Fetch a facet that must exist.
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::MissingFacet`] when absent.
    pub fn get<T: Facet>(&self, id: StructureId) -> Result<&T, StructureError> {
        T::lookup(self, id).ok_or(StructureError::MissingFacet {
            structure: id,
            facet: T::NAME,
        })
    }

    /// Mutable variant of [`Self::get`].
    ///
    /// # Errors
    ///
    /// Returns [`StructureError::MissingFacet`] when absent.
    pub fn get_mut<T: Facet>(&mut self, id: StructureId) -> Result<&mut T, StructureError> {
        T::lookup_mut(self, id).ok_or(StructureError::MissingFacet {
            structure: id,
            facet: T::NAME,
        })
    }

    /// Fetch a facet that may be absent.
    pub fn try_get<T: Facet>(&self, id: StructureId) -> Option<&T> {
        T::lookup(self, id)
    }

    /// Mutable variant of [`Self::try_get`].
    pub fn try_get_mut<T: Facet>(&mut self, id: StructureId) -> Option<&mut T> {
        T::lookup_mut(self, id)
    }

    /// The component table.
    pub const fn components(&self) -> &ComponentTable {
        &self.components
    }

    // -------------------------------------------------------------------
    // Connectivity
    // -------------------------------------------------------------------

    /// Clear every structure's and tile's connected flag ahead of a fresh
    /// walk.
    pub fn disconnect_all(&mut self, map: &mut TileMap) {
        map.clear_connected();
        for entry in self.slots.iter_mut().filter_map(|s| s.entry.as_mut()) {
            entry.structure.set_connected(false);
        }
    }

    /// Copy tile connected flags onto the structures sitting on them.
    pub fn sync_connectivity(&mut self, map: &TileMap) {
        for entry in self.slots.iter_mut().filter_map(|s| s.entry.as_mut()) {
            entry.structure.set_connected(map.is_connected(entry.tile));
        }
    }

    // -------------------------------------------------------------------
    // Turn pass
    // -------------------------------------------------------------------

    /// Run every structure through one turn.
    ///
    /// Refined-resource input for admitted structures is drawn from
    /// `resources`; crews come from `pool`. Returns the events raised.
    ///
    /// # Errors
    ///
    /// Propagates [`StructureError::Population`] if a crew request names a
    /// non-workable role.
    pub fn update(
        &mut self,
        resources: &mut StorableResources,
        pool: &mut PopulationPool<'_>,
        map: &mut TileMap,
    ) -> Result<Vec<ColonyEvent>, StructureError> {
        let mut events = Vec::new();
        let mut energy_available: u32 = 0;
        let mut chap_online = false;

        for id in self.update_order() {
            let labor = self.components.get::<LaborRequirement>(id).copied();
            let output = self.components.get::<EnergyProducer>(id).map(|p| p.output);
            let Some(entry) = self.entry_mut(id) else {
                continue;
            };
            let tile = entry.tile;
            let structure = &mut entry.structure;
            let kind = structure.kind();
            let before = *structure.lifecycle();

            match structure.advance() {
                Progress::Completed => {
                    let mine = if structure.is_mine_facility() && tile.depth == 0 {
                        map.mine_mut(tile.position)
                    } else {
                        None
                    };
                    structure.activated(mine);
                    events.push(ColonyEvent::Activated {
                        structure: id,
                        kind,
                    });
                }
                Progress::Condemned => events.push(ColonyEvent::Condemned {
                    structure: id,
                    kind,
                }),
                Progress::Building | Progress::Aged | Progress::Inert => {}
            }

            let life = structure.lifecycle();
            if life.is_under_construction() || life.is_destroyed() {
                continue;
            }

            let checkpoint = pool.counters();
            let staffed;
            match admit(structure, labor, chap_online, energy_available, resources, pool)? {
                Admission::Refused(reason) => {
                    pool.restore(checkpoint);
                    structure.lifecycle_mut().disable(reason);
                    staffed = false;
                }
                Admission::Admitted { energy } => {
                    energy_available = energy_available.saturating_sub(energy);
                    if !structure.lifecycle().is_idle() {
                        structure.lifecycle_mut().enable();
                    }
                    resources.subtract(structure.resource_input());

                    let mine = if structure.is_mine_facility() && tile.depth == 0 {
                        map.mine_mut(tile.position)
                    } else {
                        None
                    };
                    if let Some(ThinkEvent::ShaftExtended { depth }) = structure.think(mine) {
                        events.push(ColonyEvent::ShaftExtended {
                            structure: id,
                            depth,
                        });
                    }

                    if structure.lifecycle().is_operational() {
                        if let Some(output) = output {
                            energy_available = energy_available.saturating_add(output);
                        }
                        if kind == StructureKind::Chap {
                            chap_online = true;
                        }
                    }
                    staffed = labor.is_some() && !structure.lifecycle().force_idle();
                }
            }

            let after = *structure.lifecycle();
            if after != before {
                record_transition(&mut events, id, kind, after);
            }
            if let Some(requirement) = self.components.get_mut::<LaborRequirement>(id) {
                requirement.staffed = staffed;
            }
        }

        self.update_energy_production();
        self.update_energy_consumed();
        Ok(events)
    }

    /// Recompute total energy supplied by operational producers.
    pub fn update_energy_production(&mut self) {
        self.energy_produced = self
            .components
            .iter::<EnergyProducer>()
            .filter(|(id, _)| self.structure(*id).is_some_and(|s| s.lifecycle().is_operational()))
            .fold(0_u32, |acc, (_, p)| acc.saturating_add(p.output));
    }

    /// Recompute total energy drawn by operational structures.
    pub fn update_energy_consumed(&mut self) {
        self.energy_consumed = self
            .slots
            .iter()
            .filter_map(|s| s.entry.as_ref())
            .map(|e| &e.structure)
            .filter(|s| s.lifecycle().is_operational() && !s.energy_exempt())
            .fold(0_u32, |acc, s| acc.saturating_add(s.energy_required()));
    }

    /// Energy supplied this turn.
    pub const fn total_energy_production(&self) -> u32 {
        self.energy_produced
    }

    /// Energy drawn this turn.
    pub const fn total_energy_consumed(&self) -> u32 {
        self.energy_consumed
    }

    /// Energy supplied minus energy drawn.
    pub const fn total_energy_available(&self) -> u32 {
        self.energy_produced.saturating_sub(self.energy_consumed)
    }

    /// Refined storage offered by operational structures.
    pub fn total_storage_capacity(&self) -> u32 {
        self.components
            .iter::<StorageCapacity>()
            .filter(|(id, _)| self.structure(*id).is_some_and(|s| s.lifecycle().is_operational()))
            .fold(0_u32, |acc, (_, c)| acc.saturating_add(c.capacity))
    }

    /// House up to `colonists` in operational residences, in update order.
    /// Returns how many are left without a home.
    pub fn assign_colonists_to_residences(&mut self, colonists: u32) -> u32 {
        let mut remaining = colonists;
        for id in self.update_order() {
            let operational = self
                .structure(id)
                .is_some_and(|s| s.lifecycle().is_operational());
            if let Some(housing) = self.components.get_mut::<Housing>(id) {
                housing.occupants = if operational {
                    housing.capacity.min(remaining)
                } else {
                    0
                };
                remaining = remaining.saturating_sub(housing.occupants);
            }
        }
        remaining
    }

    /// Remove every destroyed structure. Returns what was removed.
    ///
    /// # Errors
    ///
    /// Propagates [`StructureError::NotRegistered`] only if the arena is
    /// inconsistent.
    pub fn remove_destroyed(
        &mut self,
        map: &mut TileMap,
    ) -> Result<Vec<(StructureId, StructureKind)>, StructureError> {
        let condemned: Vec<StructureId> = self
            .update_order()
            .into_iter()
            .filter(|id| self.structure(*id).is_some_and(|s| s.lifecycle().is_destroyed()))
            .collect();
        let mut removed = Vec::with_capacity(condemned.len());
        for id in condemned {
            let structure = self.remove_structure(map, id)?;
            removed.push((id, structure.kind()));
        }
        Ok(removed)
    }

    // -------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------

    fn structures(&self) -> impl Iterator<Item = &Structure> {
        self.slots
            .iter()
            .filter_map(|s| s.entry.as_ref())
            .map(|e| &e.structure)
    }

    /// Structures in `state`.
    pub fn count_in_state(&self, state: StructureState) -> usize {
        self.structures().filter(|s| s.state() == state).count()
    }

    /// Structures of `class`.
    pub fn count_of_class(&self, class: StructureClass) -> usize {
        self.structures_of_class(class).len()
    }

    /// Structures of `class` in `state`.
    pub fn count_of_class_in_state(&self, class: StructureClass, state: StructureState) -> usize {
        self.structures()
            .filter(|s| s.class() == class && s.state() == state)
            .count()
    }

    /// Disabled structures.
    pub fn disabled(&self) -> usize {
        self.count_in_state(StructureState::Disabled)
    }

    /// Destroyed structures awaiting removal.
    pub fn destroyed(&self) -> usize {
        self.count_in_state(StructureState::Destroyed)
    }

    /// Whether an operational CHAP facility exists.
    pub fn chap_available(&self) -> bool {
        self.structures()
            .any(|s| s.kind() == StructureKind::Chap && s.lifecycle().is_operational())
    }
}

impl MountLookup for StructureManager {
    fn mount(&self, id: StructureId) -> Option<Mount> {
        let structure = self.structure(id)?;
        if structure.lifecycle().is_destroyed() {
            return None;
        }
        Some(structure.connector().map_or(Mount::Facility, Mount::Connector))
    }
}

/// Run the gates for one structure that has finished construction.
fn admit(
    structure: &Structure,
    labor: Option<LaborRequirement>,
    chap_online: bool,
    energy_available: u32,
    resources: &StorableResources,
    pool: &mut PopulationPool<'_>,
) -> Result<Admission, StructureError> {
    if !structure.connected() && !structure.self_sustained() {
        return Ok(Admission::Refused(DisabledReason::Disconnected));
    }
    if structure.requires_chap() && !chap_online {
        return Ok(Admission::Refused(DisabledReason::Chap));
    }
    let force_idle = structure.lifecycle().force_idle();
    if let Some(labor) = labor.filter(|_| !force_idle) {
        if !pool.use_labor(labor.workers, labor.scientists)? {
            return Ok(Admission::Refused(DisabledReason::Population));
        }
    }
    if !resources.covers(structure.resource_input(), Scope::Materials) {
        return Ok(Admission::Refused(DisabledReason::RefinedResources));
    }
    let energy = if structure.energy_exempt() || force_idle {
        0
    } else {
        structure.energy_required()
    };
    if energy > energy_available {
        return Ok(Admission::Refused(DisabledReason::Energy));
    }
    Ok(Admission::Admitted { energy })
}

fn record_transition(
    events: &mut Vec<ColonyEvent>,
    id: StructureId,
    kind: StructureKind,
    after: Lifecycle,
) {
    if let Some(reason) = after.disabled_reason() {
        debug!(structure = %id, ?kind, ?reason, "Structure disabled");
        events.push(ColonyEvent::Disabled {
            structure: id,
            reason,
        });
    } else if let Some(reason) = after.idle_reason() {
        debug!(structure = %id, ?kind, ?reason, "Structure idle");
        events.push(ColonyEvent::Idled {
            structure: id,
            reason,
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use outpost_ledger::Population;
    use outpost_types::{IdleReason, PopulationRole};

    use super::*;
    use crate::structure::{Behavior, StructureSpec};

    fn quick(kind: StructureKind, spec: StructureSpec) -> Structure {
        Structure::new(kind, spec, None, Behavior::Passive)
    }

    fn standalone(energy_required: u32) -> StructureSpec {
        StructureSpec {
            self_sustained: true,
            energy_required,
            ..StructureSpec::default()
        }
    }

    fn run_turn(
        manager: &mut StructureManager,
        map: &mut TileMap,
        population: &Population,
    ) -> Vec<ColonyEvent> {
        let mut pool = PopulationPool::new(population);
        let mut stock = StorableResources::ZERO;
        manager.update(&mut stock, &mut pool, map).unwrap()
    }

    #[test]
    fn removed_handles_go_stale() {
        let mut map = TileMap::new(4, 4, 1).unwrap();
        let mut manager = StructureManager::new();
        let tile = TileRef::surface(1, 1);
        let id = manager
            .add_structure(&mut map, tile, quick(StructureKind::Laboratory, StructureSpec::default()))
            .unwrap();
        manager.attach(id, LaborRequirement::new(1, 0)).unwrap();

        manager.remove_structure(&mut map, id).unwrap();
        assert!(manager.structure(id).is_none());
        assert!(manager.try_get::<LaborRequirement>(id).is_none());
        assert_eq!(map.structure_at(tile), None);

        let reused = manager
            .add_structure(&mut map, tile, quick(StructureKind::Laboratory, StructureSpec::default()))
            .unwrap();
        assert_eq!(reused.index, id.index);
        assert_ne!(reused.generation, id.generation);
        assert!(manager.structure(id).is_none());
        assert!(matches!(
            manager.remove_structure(&mut map, id),
            Err(StructureError::NotRegistered(_))
        ));
    }

    #[test]
    fn occupied_tile_is_rejected() {
        let mut map = TileMap::new(4, 4, 1).unwrap();
        let mut manager = StructureManager::new();
        let tile = TileRef::surface(0, 0);
        manager
            .add_structure(&mut map, tile, quick(StructureKind::Tube, StructureSpec::default()))
            .unwrap();
        let err = manager
            .add_structure(&mut map, tile, quick(StructureKind::Tube, StructureSpec::default()))
            .unwrap_err();
        assert!(matches!(err, StructureError::World { .. }));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn missing_facet_is_an_error_but_try_get_is_not() {
        let mut map = TileMap::new(4, 4, 1).unwrap();
        let mut manager = StructureManager::new();
        let id = manager
            .add_structure(&mut map, TileRef::surface(0, 0), quick(StructureKind::Chap, StructureSpec::default()))
            .unwrap();
        assert!(manager.try_get::<Housing>(id).is_none());
        assert!(matches!(
            manager.get::<Housing>(id),
            Err(StructureError::MissingFacet { facet: "Housing", .. })
        ));
        assert_eq!(manager.get::<Structure>(id).unwrap().kind(), StructureKind::Chap);
    }

    #[test]
    fn update_order_follows_class_priority() {
        let mut map = TileMap::new(4, 4, 1).unwrap();
        let mut manager = StructureManager::new();
        let lab = manager
            .add_structure(&mut map, TileRef::surface(0, 0), quick(StructureKind::Laboratory, StructureSpec::default()))
            .unwrap();
        let power = manager
            .add_structure(&mut map, TileRef::surface(1, 0), quick(StructureKind::SolarPlant, StructureSpec::default()))
            .unwrap();
        let cc = manager
            .add_structure(&mut map, TileRef::surface(2, 0), quick(StructureKind::CommandCenter, StructureSpec::default()))
            .unwrap();
        assert_eq!(manager.update_order(), vec![cc, power, lab]);
    }

    #[test]
    fn disconnected_structures_are_disabled() {
        let mut map = TileMap::new(4, 4, 1).unwrap();
        let mut manager = StructureManager::new();
        let id = manager
            .add_structure(&mut map, TileRef::surface(0, 0), quick(StructureKind::Laboratory, StructureSpec::default()))
            .unwrap();
        let events = run_turn(&mut manager, &mut map, &Population::new());
        let structure = manager.structure(id).unwrap();
        assert_eq!(structure.state(), StructureState::Disabled);
        assert_eq!(structure.lifecycle().disabled_reason(), Some(DisabledReason::Disconnected));
        assert!(events.contains(&ColonyEvent::Disabled {
            structure: id,
            reason: DisabledReason::Disconnected
        }));
    }

    #[test]
    fn energy_flows_to_later_classes() {
        let mut map = TileMap::new(4, 4, 1).unwrap();
        let mut manager = StructureManager::new();
        let lab = manager
            .add_structure(&mut map, TileRef::surface(0, 0), quick(StructureKind::Laboratory, standalone(30)))
            .unwrap();
        let plant = manager
            .add_structure(&mut map, TileRef::surface(1, 0), quick(StructureKind::SolarPlant, standalone(0)))
            .unwrap();
        manager.attach(plant, EnergyProducer { output: 50 }).unwrap();
        let hungry = manager
            .add_structure(&mut map, TileRef::surface(2, 0), quick(StructureKind::Laboratory, standalone(30)))
            .unwrap();

        run_turn(&mut manager, &mut map, &Population::new());
        assert!(manager.structure(lab).unwrap().lifecycle().is_operational());
        assert_eq!(
            manager.structure(hungry).unwrap().lifecycle().disabled_reason(),
            Some(DisabledReason::Energy)
        );
        assert_eq!(manager.total_energy_production(), 50);
        assert_eq!(manager.total_energy_consumed(), 30);
        assert_eq!(manager.total_energy_available(), 20);
    }

    #[test]
    fn scarce_labor_goes_to_earlier_registrations() {
        let mut map = TileMap::new(4, 4, 1).unwrap();
        let mut manager = StructureManager::new();
        let first = manager
            .add_structure(&mut map, TileRef::surface(0, 0), quick(StructureKind::Laboratory, standalone(0)))
            .unwrap();
        manager.attach(first, LaborRequirement::new(3, 0)).unwrap();
        let second = manager
            .add_structure(&mut map, TileRef::surface(1, 0), quick(StructureKind::Laboratory, standalone(0)))
            .unwrap();
        manager.attach(second, LaborRequirement::new(3, 0)).unwrap();

        let mut population = Population::new();
        population.set(PopulationRole::Worker, 4);
        run_turn(&mut manager, &mut map, &population);

        assert!(manager.structure(first).unwrap().lifecycle().is_operational());
        assert!(manager.get::<LaborRequirement>(first).unwrap().staffed);
        assert_eq!(
            manager.structure(second).unwrap().lifecycle().disabled_reason(),
            Some(DisabledReason::Population)
        );
        assert!(!manager.get::<LaborRequirement>(second).unwrap().staffed);
    }

    #[test]
    fn chap_must_run_before_dependents() {
        let mut map = TileMap::new(4, 4, 1).unwrap();
        let mut manager = StructureManager::new();
        let home = manager
            .add_structure(
                &mut map,
                TileRef::surface(0, 0),
                quick(
                    StructureKind::Residence,
                    StructureSpec {
                        requires_chap: true,
                        ..standalone(0)
                    },
                ),
            )
            .unwrap();
        run_turn(&mut manager, &mut map, &Population::new());
        assert_eq!(
            manager.structure(home).unwrap().lifecycle().disabled_reason(),
            Some(DisabledReason::Chap)
        );

        manager
            .add_structure(&mut map, TileRef::surface(1, 0), quick(StructureKind::Chap, standalone(0)))
            .unwrap();
        run_turn(&mut manager, &mut map, &Population::new());
        assert!(manager.chap_available());
        assert!(manager.structure(home).unwrap().lifecycle().is_operational());
    }

    #[test]
    fn force_idle_survives_being_disabled() {
        let mut map = TileMap::new(4, 4, 1).unwrap();
        let mut manager = StructureManager::new();
        let id = manager
            .add_structure(&mut map, TileRef::surface(0, 0), quick(StructureKind::Laboratory, StructureSpec::default()))
            .unwrap();
        manager.structure_mut(id).unwrap().lifecycle_mut().set_force_idle(true);
        run_turn(&mut manager, &mut map, &Population::new());
        assert!(manager.structure(id).unwrap().lifecycle().is_disabled());

        map.get_mut(TileRef::surface(0, 0)).unwrap().connected = true;
        manager.sync_connectivity(&map);
        run_turn(&mut manager, &mut map, &Population::new());
        assert_eq!(
            manager.structure(id).unwrap().lifecycle().idle_reason(),
            Some(IdleReason::PlayerSet)
        );
    }

    #[test]
    fn switched_off_structures_release_their_crew() {
        let mut map = TileMap::new(4, 4, 1).unwrap();
        let mut manager = StructureManager::new();
        let off = manager
            .add_structure(&mut map, TileRef::surface(0, 0), quick(StructureKind::Laboratory, standalone(0)))
            .unwrap();
        manager.attach(off, LaborRequirement::new(3, 0)).unwrap();
        manager.structure_mut(off).unwrap().lifecycle_mut().set_force_idle(true);
        let on = manager
            .add_structure(&mut map, TileRef::surface(1, 0), quick(StructureKind::Laboratory, standalone(0)))
            .unwrap();
        manager.attach(on, LaborRequirement::new(3, 0)).unwrap();

        let mut population = Population::new();
        population.set(PopulationRole::Worker, 4);
        let mut pool = PopulationPool::new(&population);
        let mut stock = StorableResources::ZERO;
        manager.update(&mut stock, &mut pool, &mut map).unwrap();

        assert_eq!(pool.counters().workers_used, 3);
        assert_eq!(
            manager.structure(off).unwrap().lifecycle().idle_reason(),
            Some(IdleReason::PlayerSet)
        );
        assert!(!manager.get::<LaborRequirement>(off).unwrap().staffed);
        assert!(manager.structure(on).unwrap().lifecycle().is_operational());
        assert!(manager.get::<LaborRequirement>(on).unwrap().staffed);
    }

    #[test]
    fn residences_house_in_order() {
        let mut map = TileMap::new(4, 4, 1).unwrap();
        let mut manager = StructureManager::new();
        let a = manager
            .add_structure(&mut map, TileRef::surface(0, 0), quick(StructureKind::Residence, standalone(0)))
            .unwrap();
        manager.attach(a, Housing { capacity: 10, occupants: 0 }).unwrap();
        let b = manager
            .add_structure(&mut map, TileRef::surface(1, 0), quick(StructureKind::Residence, standalone(0)))
            .unwrap();
        manager.attach(b, Housing { capacity: 10, occupants: 0 }).unwrap();
        run_turn(&mut manager, &mut map, &Population::new());

        assert_eq!(manager.assign_colonists_to_residences(25), 5);
        assert_eq!(manager.get::<Housing>(a).unwrap().occupants, 10);
        assert_eq!(manager.get::<Housing>(b).unwrap().occupants, 10);
        assert_eq!(manager.assign_colonists_to_residences(4), 0);
        assert_eq!(manager.get::<Housing>(b).unwrap().occupants, 0);
    }

    #[test]
    fn destroyed_structures_are_swept() {
        let mut map = TileMap::new(4, 4, 1).unwrap();
        let mut manager = StructureManager::new();
        let id = manager
            .add_structure(
                &mut map,
                TileRef::surface(0, 0),
                quick(
                    StructureKind::SurfacePolice,
                    StructureSpec {
                        max_age: 1,
                        ..standalone(0)
                    },
                ),
            )
            .unwrap();
        run_turn(&mut manager, &mut map, &Population::new());
        let events = run_turn(&mut manager, &mut map, &Population::new());
        assert!(events.contains(&ColonyEvent::Condemned {
            structure: id,
            kind: StructureKind::SurfacePolice
        }));
        assert_eq!(manager.destroyed(), 1);
        let removed = manager.remove_destroyed(&mut map).unwrap();
        assert_eq!(removed, vec![(id, StructureKind::SurfacePolice)]);
        assert!(manager.is_empty());
    }
}

//! The per-building entity and its lifecycle state machine.
//!
//! ```text
//! UnderConstruction --(build turns elapse)--> Operational
//! Operational <--> Idle        (driven by think())
//! Operational/Idle --> Disabled (set by the manager's turn pass)
//! Disabled --> Operational      (cleared by the manager's turn pass)
//! any built state --(max age)--> Destroyed
//! ```
//!
//! Behavior differences between structure kinds live in [`Behavior`]; the
//! gating rules (connectivity, life support, labor, energy) are applied by
//! the manager, not here.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use outpost_ledger::{ResourceStore, StorableResources};
use outpost_types::{
    ConnectorDir, DisabledReason, IdleReason, StructureClass, StructureKind, StructureState,
};
use outpost_world::Mine;

use crate::config::ProductionConfig;
use crate::mine_facility::MineFacility;
use crate::refining::OreRefinery;

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// State plus the reason code that goes with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    state: StructureState,
    idle_reason: Option<IdleReason>,
    disabled_reason: Option<DisabledReason>,
    force_idle: bool,
}

impl Lifecycle {
    /// A structure that has just been placed.
    pub const fn new() -> Self {
        Self {
            state: StructureState::UnderConstruction,
            idle_reason: None,
            disabled_reason: None,
            force_idle: false,
        }
    }

    /// Current state.
    pub const fn state(&self) -> StructureState {
        self.state
    }

    /// Reason for being idle, when idle.
    pub const fn idle_reason(&self) -> Option<IdleReason> {
        self.idle_reason
    }

    /// Reason for being disabled, when disabled.
    pub const fn disabled_reason(&self) -> Option<DisabledReason> {
        self.disabled_reason
    }

    /// Whether the player has switched the structure off.
    pub const fn force_idle(&self) -> bool {
        self.force_idle
    }

    /// Whether the state is [`StructureState::Operational`].
    pub fn is_operational(&self) -> bool {
        self.state == StructureState::Operational
    }

    /// Whether the state is [`StructureState::Idle`].
    pub fn is_idle(&self) -> bool {
        self.state == StructureState::Idle
    }

    /// Whether the state is [`StructureState::Disabled`].
    pub fn is_disabled(&self) -> bool {
        self.state == StructureState::Disabled
    }

    /// Whether the state is [`StructureState::Destroyed`].
    pub fn is_destroyed(&self) -> bool {
        self.state == StructureState::Destroyed
    }

    /// Whether the state is [`StructureState::UnderConstruction`].
    pub fn is_under_construction(&self) -> bool {
        self.state == StructureState::UnderConstruction
    }

    const fn settled(&self) -> bool {
        !matches!(
            self.state,
            StructureState::UnderConstruction | StructureState::Destroyed
        )
    }

    /// Return to [`StructureState::Operational`]. Ignored while under
    /// construction or destroyed; a structure the player switched off goes
    /// back to idle instead.
    pub const fn enable(&mut self) {
        if !self.settled() {
            return;
        }
        if self.force_idle {
            self.idle(IdleReason::PlayerSet);
            return;
        }
        self.state = StructureState::Operational;
        self.idle_reason = None;
        self.disabled_reason = None;
    }

    /// Enter [`StructureState::Idle`] with a reason.
    pub const fn idle(&mut self, reason: IdleReason) {
        if !self.settled() {
            return;
        }
        self.state = StructureState::Idle;
        self.idle_reason = Some(reason);
        self.disabled_reason = None;
    }

    /// Enter [`StructureState::Disabled`] with a reason.
    pub const fn disable(&mut self, reason: DisabledReason) {
        if !self.settled() {
            return;
        }
        self.state = StructureState::Disabled;
        self.disabled_reason = Some(reason);
        self.idle_reason = None;
    }

    /// Switch the structure off or back on on behalf of the player.
    pub const fn set_force_idle(&mut self, force_idle: bool) {
        self.force_idle = force_idle;
        if force_idle {
            self.idle(IdleReason::PlayerSet);
        } else if matches!(self.idle_reason, Some(IdleReason::PlayerSet)) {
            self.enable();
        }
    }

    const fn activate(&mut self) {
        self.state = StructureState::Operational;
        self.idle_reason = None;
        self.disabled_reason = None;
        if self.force_idle {
            self.idle(IdleReason::PlayerSet);
        }
    }

    const fn condemn(&mut self) {
        self.state = StructureState::Destroyed;
        self.idle_reason = None;
        self.disabled_reason = None;
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Behavior
// ---------------------------------------------------------------------------

/// Per-kind production logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    /// No production of its own.
    Passive,
    /// Extracts ore from the mine under it.
    Mine(MineFacility),
    /// Converts ore into refined materials.
    Refinery(OreRefinery),
}

impl Behavior {
    /// Behavior for a structure kind.
    pub fn for_kind(kind: StructureKind, production: &ProductionConfig, max_mine_depth: u32) -> Self {
        match kind {
            StructureKind::MineFacility => Self::Mine(MineFacility::new(
                production.mine_rate,
                production.shaft_extension_turns,
                max_mine_depth,
            )),
            StructureKind::Smelter | StructureKind::SeedSmelter => Self::Refinery(OreRefinery::new(
                production.minimum_smelting_batch,
                production.metal_divisor,
                production.mineral_divisor,
            )),
            _ => Self::Passive,
        }
    }
}

/// Something a structure's `think()` wants reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThinkEvent {
    /// A mine shaft extension finished.
    ShaftExtended {
        /// New mine depth.
        depth: u32,
    },
}

/// What [`Structure::advance`] did this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Still counting down build turns.
    Building,
    /// Construction finished; the manager must call
    /// [`Structure::activated`] next.
    Completed,
    /// Aged by one turn.
    Aged,
    /// Reached maximum age and is now destroyed.
    Condemned,
    /// Already destroyed; nothing happened.
    Inert,
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

/// Fixed attributes a structure is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StructureSpec {
    /// Turns under construction.
    pub turns_to_build: u32,
    /// Age at which the structure is condemned, 0 for never.
    pub max_age: u32,
    /// Energy drawn while running.
    pub energy_required: u32,
    /// Runs without drawing on the energy budget.
    pub energy_exempt: bool,
    /// Needs an operational CHAP facility.
    pub requires_chap: bool,
    /// Runs without a tube connection.
    pub self_sustained: bool,
    /// Refined materials consumed per operational turn.
    pub resource_input: StorableResources,
    /// Capacity of the finished-goods buffer; 0 leaves it unbounded.
    pub internal_capacity: u32,
}

/// A building in the colony.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    kind: StructureKind,
    lifecycle: Lifecycle,
    age: u32,
    max_age: u32,
    build_turns_remaining: u32,
    energy_required: u32,
    energy_exempt: bool,
    requires_chap: bool,
    self_sustained: bool,
    resource_input: StorableResources,
    connector: Option<ConnectorDir>,
    connected: bool,
    production: StorableResources,
    storage: ResourceStore,
    behavior: Behavior,
}

impl Structure {
    /// A new structure in [`StructureState::UnderConstruction`].
    pub fn new(
        kind: StructureKind,
        spec: StructureSpec,
        connector: Option<ConnectorDir>,
        behavior: Behavior,
    ) -> Self {
        let storage = if spec.internal_capacity == 0 {
            ResourceStore::unbounded()
        } else {
            ResourceStore::bounded(spec.internal_capacity)
        };
        Self {
            kind,
            lifecycle: Lifecycle::new(),
            age: 0,
            max_age: spec.max_age,
            build_turns_remaining: spec.turns_to_build,
            energy_required: spec.energy_required,
            energy_exempt: spec.energy_exempt,
            requires_chap: spec.requires_chap,
            self_sustained: spec.self_sustained,
            resource_input: spec.resource_input,
            connector,
            connected: false,
            production: StorableResources::ZERO,
            storage,
            behavior,
        }
    }

    /// Structure kind.
    pub const fn kind(&self) -> StructureKind {
        self.kind
    }

    /// Update class.
    pub const fn class(&self) -> StructureClass {
        self.kind.class()
    }

    /// State and reason codes.
    pub const fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Mutable state and reason codes.
    pub const fn lifecycle_mut(&mut self) -> &mut Lifecycle {
        &mut self.lifecycle
    }

    /// Current state.
    pub const fn state(&self) -> StructureState {
        self.lifecycle.state()
    }

    /// Turns since activation.
    pub const fn age(&self) -> u32 {
        self.age
    }

    /// Age at which the structure is condemned, 0 for never.
    pub const fn max_age(&self) -> u32 {
        self.max_age
    }

    /// Build turns left.
    pub const fn build_turns_remaining(&self) -> u32 {
        self.build_turns_remaining
    }

    /// Energy drawn while running.
    pub const fn energy_required(&self) -> u32 {
        self.energy_required
    }

    /// Exempt from the energy budget.
    pub const fn energy_exempt(&self) -> bool {
        self.energy_exempt
    }

    /// Needs an operational CHAP facility.
    pub const fn requires_chap(&self) -> bool {
        self.requires_chap
    }

    /// Runs without a tube connection.
    pub const fn self_sustained(&self) -> bool {
        self.self_sustained
    }

    /// Refined materials consumed per operational turn.
    pub const fn resource_input(&self) -> StorableResources {
        self.resource_input
    }

    /// Tube orientation, for connectors.
    pub const fn connector(&self) -> Option<ConnectorDir> {
        self.connector
    }

    /// Reached by this turn's connectivity walk.
    pub const fn connected(&self) -> bool {
        self.connected
    }

    /// Set by the manager after each walk.
    pub const fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Intermediate ore buffer.
    pub const fn production(&self) -> StorableResources {
        self.production
    }

    /// Finished-goods buffer.
    pub const fn storage(&self) -> &ResourceStore {
        &self.storage
    }

    /// Mutable finished-goods buffer.
    pub const fn storage_mut(&mut self) -> &mut ResourceStore {
        &mut self.storage
    }

    /// Production logic.
    pub const fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    /// Mutable production logic.
    pub const fn behavior_mut(&mut self) -> &mut Behavior {
        &mut self.behavior
    }

    /// Whether the structure refines ore.
    pub const fn is_refinery(&self) -> bool {
        matches!(self.behavior, Behavior::Refinery(_))
    }

    /// Whether the structure extracts ore.
    pub const fn is_mine_facility(&self) -> bool {
        matches!(self.behavior, Behavior::Mine(_))
    }

    /// Run one turn of construction or aging.
    pub fn advance(&mut self) -> Progress {
        match self.lifecycle.state() {
            StructureState::Destroyed => Progress::Inert,
            StructureState::UnderConstruction => {
                self.build_turns_remaining = self.build_turns_remaining.saturating_sub(1);
                if self.build_turns_remaining == 0 {
                    Progress::Completed
                } else {
                    Progress::Building
                }
            }
            StructureState::Operational | StructureState::Idle | StructureState::Disabled => {
                self.age = self.age.saturating_add(1);
                if self.max_age > 0 && self.age >= self.max_age {
                    self.lifecycle.condemn();
                    warn!(kind = ?self.kind, age = self.age, "Structure condemned");
                    Progress::Condemned
                } else {
                    Progress::Aged
                }
            }
        }
    }

    /// Finish construction. Fires the kind's activation hook exactly once.
    pub fn activated(&mut self, mine: Option<&mut Mine>) {
        if !self.lifecycle.is_under_construction() {
            return;
        }
        self.lifecycle.activate();
        if let (Behavior::Mine(_), Some(mine)) = (&self.behavior, mine) {
            mine.increase_depth();
            mine.set_active(true);
        }
        info!(kind = ?self.kind, "Structure activated");
    }

    /// Per-turn production step. The manager only calls this once the
    /// structure has passed every gate.
    pub fn think(&mut self, mine: Option<&mut Mine>) -> Option<ThinkEvent> {
        let before = self.lifecycle.state();
        let event = match &mut self.behavior {
            Behavior::Passive => None,
            Behavior::Mine(facility) => facility.think(
                &mut self.lifecycle,
                &mut self.production,
                &mut self.storage,
                mine,
            ),
            Behavior::Refinery(refinery) => {
                refinery.think(&mut self.lifecycle, &mut self.production, &mut self.storage);
                None
            }
        };
        if before != self.lifecycle.state() {
            debug!(
                kind = ?self.kind,
                from = ?before,
                to = ?self.lifecycle.state(),
                idle_reason = ?self.lifecycle.idle_reason(),
                "State changed during think"
            );
        }
        event
    }

    /// Load ore into a refinery's production buffer, up to its capacity.
    /// Returns what did not fit. Structures that do not refine accept
    /// nothing.
    pub fn accept_ore(&mut self, ore: StorableResources) -> StorableResources {
        if !self.is_refinery() {
            return ore;
        }
        let room = self.storage.capacity.map_or(u32::MAX, |cap| {
            cap.saturating_sub(self.production.total_materials())
        });
        let accepted = ore.limit_total(room);
        self.production.add(accepted);
        ore.saturating_sub(accepted)
    }

    /// Overwrite the production buffer.
    pub const fn set_production(&mut self, production: StorableResources) {
        self.production = production;
    }
}

/// A quarter of a store's capacity in every material: the throttle point
/// for mines and refineries. Unbounded stores never throttle.
pub fn quarter_capacity(store: &ResourceStore) -> StorableResources {
    store.capacity.map_or(StorableResources::uniform(u32::MAX), |cap| {
        StorableResources::uniform(cap.checked_div(4).unwrap_or(0))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passive(turns_to_build: u32, max_age: u32) -> Structure {
        Structure::new(
            StructureKind::Residence,
            StructureSpec {
                turns_to_build,
                max_age,
                ..StructureSpec::default()
            },
            None,
            Behavior::Passive,
        )
    }

    #[test]
    fn starts_under_construction() {
        let s = passive(3, 0);
        assert_eq!(s.state(), StructureState::UnderConstruction);
        assert_eq!(s.age(), 0);
    }

    #[test]
    fn completes_after_exactly_turns_to_build() {
        let mut s = passive(3, 0);
        assert_eq!(s.advance(), Progress::Building);
        assert_eq!(s.advance(), Progress::Building);
        assert_eq!(s.advance(), Progress::Completed);
        s.activated(None);
        assert_eq!(s.state(), StructureState::Operational);
        assert_eq!(s.age(), 0);
        assert_eq!(s.advance(), Progress::Aged);
        assert_eq!(s.age(), 1);
    }

    #[test]
    fn zero_build_turns_complete_on_first_advance() {
        let mut s = passive(0, 0);
        assert_eq!(s.advance(), Progress::Completed);
    }

    #[test]
    fn reaching_max_age_condemns() {
        let mut s = passive(0, 2);
        s.advance();
        s.activated(None);
        assert_eq!(s.advance(), Progress::Aged);
        assert_eq!(s.advance(), Progress::Condemned);
        assert_eq!(s.state(), StructureState::Destroyed);
        assert_eq!(s.advance(), Progress::Inert);
    }

    #[test]
    fn activation_hook_fires_once() {
        let mut s = passive(0, 0);
        s.advance();
        s.activated(None);
        s.lifecycle_mut().disable(DisabledReason::Energy);
        s.activated(None);
        assert_eq!(s.state(), StructureState::Disabled);
    }

    #[test]
    fn lifecycle_transitions_keep_one_reason() {
        let mut life = Lifecycle::new();
        life.enable();
        assert!(life.is_under_construction());

        life.activate();
        life.idle(IdleReason::InternalStorageFull);
        assert_eq!(life.idle_reason(), Some(IdleReason::InternalStorageFull));
        assert_eq!(life.disabled_reason(), None);

        life.disable(DisabledReason::Disconnected);
        assert_eq!(life.idle_reason(), None);
        assert_eq!(life.disabled_reason(), Some(DisabledReason::Disconnected));

        life.enable();
        assert!(life.is_operational());
        assert_eq!(life.disabled_reason(), None);
    }

    #[test]
    fn force_idle_blocks_enable_until_released() {
        let mut life = Lifecycle::new();
        life.activate();
        life.set_force_idle(true);
        life.enable();
        assert_eq!(life.idle_reason(), Some(IdleReason::PlayerSet));
        life.set_force_idle(false);
        assert!(life.is_operational());
    }

    #[test]
    fn passive_structures_refuse_ore() {
        let mut s = passive(0, 0);
        let ore = StorableResources::uniform(5);
        assert_eq!(s.accept_ore(ore), ore);
    }

    #[test]
    fn quarter_of_unbounded_store_never_throttles() {
        let q = quarter_capacity(&ResourceStore::unbounded());
        assert_eq!(q.common_metals, u32::MAX);
        assert_eq!(quarter_capacity(&ResourceStore::bounded(500)).rare_metals, 125);
    }
}

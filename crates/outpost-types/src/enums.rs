//! Enumeration types for the Outpost colony simulation.
//!
//! Structure kinds map onto a smaller set of classes; the class decides
//! where a structure sits in the per-turn update order. Lifecycle state and
//! the reason for being idle or disabled are separate enums so every
//! combination the state machine can reach is spelled out.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Structures
// ---------------------------------------------------------------------------

/// A buildable structure type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StructureKind {
    /// Root of the tube network. Holds refined storage.
    CommandCenter,
    /// Small generator delivered with the seed lander.
    SeedPower,
    /// Small refinery delivered with the seed lander.
    SeedSmelter,
    /// Surface solar array.
    SolarPlant,
    /// Fusion reactor. Needs a staffed crew.
    FusionReactor,
    /// Extracts ore from the mine it sits on.
    MineFacility,
    /// Full-size ore refinery.
    Smelter,
    /// Central Habitat Air Processor, the colony's life support.
    Chap,
    /// Housing for colonists.
    Residence,
    /// Additional refined storage.
    StorageTanks,
    /// Research facility staffed by scientists.
    Laboratory,
    /// Security post.
    SurfacePolice,
    /// Tube segment on the surface or underground.
    Tube,
    /// Vertical tube joining depth levels.
    AirShaft,
}

impl StructureKind {
    /// Every structure kind.
    pub const ALL: [Self; 14] = [
        Self::CommandCenter,
        Self::SeedPower,
        Self::SeedSmelter,
        Self::SolarPlant,
        Self::FusionReactor,
        Self::MineFacility,
        Self::Smelter,
        Self::Chap,
        Self::Residence,
        Self::StorageTanks,
        Self::Laboratory,
        Self::SurfacePolice,
        Self::Tube,
        Self::AirShaft,
    ];

    /// The update class the kind belongs to.
    pub const fn class(self) -> StructureClass {
        match self {
            Self::CommandCenter => StructureClass::Command,
            Self::SeedPower | Self::SolarPlant | Self::FusionReactor => {
                StructureClass::EnergyProduction
            }
            Self::Chap => StructureClass::LifeSupport,
            Self::Residence => StructureClass::Residence,
            Self::Laboratory => StructureClass::Laboratory,
            Self::SurfacePolice => StructureClass::Police,
            Self::SeedSmelter | Self::Smelter => StructureClass::Smelter,
            Self::MineFacility => StructureClass::Mine,
            Self::StorageTanks => StructureClass::Storage,
            Self::Tube | Self::AirShaft => StructureClass::Tube,
        }
    }

    /// Whether the kind is a tube connector rather than a facility.
    pub const fn is_connector(self) -> bool {
        matches!(self, Self::Tube | Self::AirShaft)
    }

    /// Display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::CommandCenter => "Command Center",
            Self::SeedPower => "SEED Power",
            Self::SeedSmelter => "SEED Smelter",
            Self::SolarPlant => "Solar Plant",
            Self::FusionReactor => "Fusion Reactor",
            Self::MineFacility => "Mine Facility",
            Self::Smelter => "Smelter",
            Self::Chap => "CHAP Facility",
            Self::Residence => "Residence",
            Self::StorageTanks => "Storage Tanks",
            Self::Laboratory => "Laboratory",
            Self::SurfacePolice => "Police",
            Self::Tube => "Tube",
            Self::AirShaft => "Air Shaft",
        }
    }
}

/// Structure grouping used to order the per-turn update pass.
///
/// Declaration order is update priority: command first, tubes last. Labor
/// and energy are handed out in this order, so earlier classes win under
/// scarcity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StructureClass {
    /// Command center.
    Command,
    /// Power generation.
    EnergyProduction,
    /// Life support.
    LifeSupport,
    /// Colonist housing.
    Residence,
    /// Research.
    Laboratory,
    /// Security.
    Police,
    /// Ore refining.
    Smelter,
    /// Ore extraction.
    Mine,
    /// Refined storage.
    Storage,
    /// Tube network.
    Tube,
}

impl StructureClass {
    /// All classes in update priority order.
    pub const UPDATE_ORDER: [Self; 10] = [
        Self::Command,
        Self::EnergyProduction,
        Self::LifeSupport,
        Self::Residence,
        Self::Laboratory,
        Self::Police,
        Self::Smelter,
        Self::Mine,
        Self::Storage,
        Self::Tube,
    ];
}

/// Lifecycle state of a structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StructureState {
    /// Counting down its build turns.
    UnderConstruction,
    /// Running normally.
    Operational,
    /// Paused by its own logic or by the player.
    Idle,
    /// Shut off by the colony (no power, no tube link, no crew).
    Disabled,
    /// Condemned; removed at the end of the turn.
    Destroyed,
}

/// Why a structure is idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IdleReason {
    /// The player switched it off.
    PlayerSet,
    /// Finished-goods storage is full.
    InternalStorageFull,
    /// The mine has no ore left at any dug level.
    MineExhausted,
    /// The mine has been deactivated.
    MineInactive,
}

/// Why a structure is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DisabledReason {
    /// Not reachable from the command center.
    Disconnected,
    /// No operational life support.
    Chap,
    /// Not enough energy this turn.
    Energy,
    /// Not enough workers or scientists.
    Population,
    /// Not enough refined resources to run.
    RefinedResources,
}

/// Orientation of a tube connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConnectorDir {
    /// Four-way junction.
    Intersection,
    /// Straight run along the east-west axis.
    Right,
    /// Straight run along the north-south axis.
    Left,
    /// Air shaft between depth levels.
    Vertical,
}

impl ConnectorDir {
    /// Whether the connector has an opening toward a planar direction.
    ///
    /// Vertical shafts open on all four sides at their own level.
    pub const fn opens_toward(self, east_west: bool) -> bool {
        match self {
            Self::Intersection | Self::Vertical => true,
            Self::Right => east_west,
            Self::Left => !east_west,
        }
    }
}

// ---------------------------------------------------------------------------
// Population
// ---------------------------------------------------------------------------

/// Population role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PopulationRole {
    /// Too young to work or study.
    Child,
    /// In training.
    Student,
    /// General labor.
    Worker,
    /// Research staff; may cover worker shortfalls.
    Scientist,
    /// Past working age.
    Retired,
}

impl PopulationRole {
    /// Every role.
    pub const ALL: [Self; 5] = [
        Self::Child,
        Self::Student,
        Self::Worker,
        Self::Scientist,
        Self::Retired,
    ];

    /// Whether the role can be assigned to a job.
    pub const fn is_workable(self) -> bool {
        matches!(self, Self::Worker | Self::Scientist)
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// One of the four ore/material kinds tracked by a resource ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Material {
    /// Common metals.
    CommonMetals,
    /// Common minerals.
    CommonMinerals,
    /// Rare metals.
    RareMetals,
    /// Rare minerals.
    RareMinerals,
}

impl Material {
    /// Every material, in ledger order.
    pub const ALL: [Self; 4] = [
        Self::CommonMetals,
        Self::CommonMinerals,
        Self::RareMetals,
        Self::RareMinerals,
    ];

    /// Whether the material is a metal (as opposed to a mineral).
    pub const fn is_metal(self) -> bool {
        matches!(self, Self::CommonMetals | Self::RareMetals)
    }
}

/// Richness of an ore deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MineYield {
    /// Poor deposit.
    Low,
    /// Average deposit.
    Medium,
    /// Rich deposit.
    High,
}

impl MineYield {
    /// Every yield, poorest first.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_order_matches_declaration_order() {
        let mut sorted = StructureClass::UPDATE_ORDER;
        sorted.sort();
        assert_eq!(sorted, StructureClass::UPDATE_ORDER);
    }

    #[test]
    fn every_kind_has_a_class_in_update_order() {
        for kind in StructureKind::ALL {
            assert!(StructureClass::UPDATE_ORDER.contains(&kind.class()));
        }
    }

    #[test]
    fn only_workers_and_scientists_are_workable() {
        let workable: Vec<_> = PopulationRole::ALL
            .into_iter()
            .filter(|r| r.is_workable())
            .collect();
        assert_eq!(workable, vec![PopulationRole::Worker, PopulationRole::Scientist]);
    }

    #[test]
    fn straight_tubes_open_on_one_axis() {
        assert!(ConnectorDir::Right.opens_toward(true));
        assert!(!ConnectorDir::Right.opens_toward(false));
        assert!(ConnectorDir::Left.opens_toward(false));
        assert!(!ConnectorDir::Left.opens_toward(true));
        assert!(ConnectorDir::Intersection.opens_toward(true));
        assert!(ConnectorDir::Intersection.opens_toward(false));
    }
}

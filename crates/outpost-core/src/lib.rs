//! Structure lifecycle, ore refining, and turn orchestration for the Outpost
//! colony simulation.
//!
//! This crate holds the simulation rules. It sits on top of
//! `outpost-ledger` (resource and labor accounting) and `outpost-world`
//! (tiles, deposits, connectivity) and is driven turn by turn by the
//! `outpost-engine` binary or by tests.
//!
//! # Modules
//!
//! - [`catalogue`] -- Blueprints per structure kind ([`Catalogue`])
//! - [`colony`] -- The colony and its turn loop ([`Colony`], [`TurnReport`])
//! - [`components`] -- Optional per-structure facets ([`ComponentTable`])
//! - [`config`] -- YAML configuration ([`SimulationConfig`])
//! - [`error`] -- [`StructureError`] and [`ColonyError`]
//! - [`events`] -- Per-turn [`ColonyEvent`]s
//! - [`manager`] -- Structure registry and update pass ([`StructureManager`])
//! - [`mine_facility`] -- Ore extraction and shaft extension
//! - [`refining`] -- Ore-to-refined conversion
//! - [`snapshot`] -- Serializable colony view ([`ColonySnapshot`])
//! - [`structure`] -- The structure entity and its state machine

pub mod catalogue;
pub mod colony;
pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod manager;
pub mod mine_facility;
pub mod refining;
pub mod snapshot;
pub mod structure;

pub use catalogue::{Blueprint, Catalogue, default_blueprint};
pub use colony::{Colony, PlacementOutcome, PlacementRejection, TurnReport};
pub use components::{
    Component, ComponentTable, EnergyProducer, Housing, LaborRequirement, StorageCapacity,
};
pub use config::{ConfigError, LogFormat, SimulationConfig};
pub use error::{ColonyError, StructureError};
pub use events::ColonyEvent;
pub use manager::{Facet, StructureManager};
pub use mine_facility::MineFacility;
pub use refining::OreRefinery;
pub use snapshot::{ColonySnapshot, EnergySnapshot, StructureSnapshot};
pub use structure::{Behavior, Lifecycle, Progress, Structure, StructureSpec, ThinkEvent};

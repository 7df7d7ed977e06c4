//! Resource ledgers and labor accounting for the Outpost colony simulation.
//!
//! Every unit of ore, refined material, and energy a structure holds lives in
//! a [`StorableResources`] value. Ledgers are plain `Copy` values: they are
//! created wherever a structure or the colony stockpile needs one and are
//! never shared.
//!
//! # Modules
//!
//! - [`resources`] -- [`StorableResources`] arithmetic and comparisons, and
//!   the capacity-bounded [`ResourceStore`].
//! - [`population`] -- [`Population`] headcount and the per-turn
//!   [`PopulationPool`] that hands out workers and scientists.
//!
//! # Underflow
//!
//! Counters never go negative. [`StorableResources::subtract`] saturates at
//! zero; call sites that must refuse an overdraft use
//! [`StorableResources::try_subtract`], which leaves the ledger untouched and
//! returns [`LedgerError::Insufficient`].

pub mod population;
pub mod resources;

pub use population::{LaborCounters, Population, PopulationPool};
pub use resources::{ResourceStore, Scope, StorableResources};

use outpost_types::PopulationRole;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised by resource ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A checked subtraction asked for more than the ledger holds.
    #[error("insufficient resources: requested {requested:?}, available {available:?}")]
    Insufficient {
        /// The amount that was asked for.
        requested: StorableResources,
        /// The amount that was on hand.
        available: StorableResources,
    },
}

/// Errors raised by the population pool.
///
/// These are caller defects: no runtime condition produces them.
#[derive(Debug, thiserror::Error)]
pub enum PopulationError {
    /// Labor was requested from a role that never works.
    #[error("population role {role:?} cannot be employed")]
    InvalidRole {
        /// The role that was requested.
        role: PopulationRole,
    },
}

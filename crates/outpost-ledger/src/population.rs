//! Population headcount and per-turn labor allocation.
//!
//! [`Population`] is owned by the colony and changes only through growth and
//! aging logic outside the turn pass. [`PopulationPool`] borrows it for one
//! turn and records how many workers and scientists have been committed.
//! Scientists may stand in for missing workers; those substitutes are
//! tracked separately from scientists doing research.

use serde::{Deserialize, Serialize};
use tracing::debug;

use outpost_types::PopulationRole;

use crate::PopulationError;

/// Colonist headcount by role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Population {
    /// Children.
    #[serde(default)]
    pub children: u32,
    /// Students.
    #[serde(default)]
    pub students: u32,
    /// Workers.
    #[serde(default)]
    pub workers: u32,
    /// Scientists.
    #[serde(default)]
    pub scientists: u32,
    /// Retirees.
    #[serde(default)]
    pub retired: u32,
}

impl Population {
    /// An empty population.
    pub const fn new() -> Self {
        Self {
            children: 0,
            students: 0,
            workers: 0,
            scientists: 0,
            retired: 0,
        }
    }

    /// Headcount for one role.
    pub const fn size(&self, role: PopulationRole) -> u32 {
        match role {
            PopulationRole::Child => self.children,
            PopulationRole::Student => self.students,
            PopulationRole::Worker => self.workers,
            PopulationRole::Scientist => self.scientists,
            PopulationRole::Retired => self.retired,
        }
    }

    /// Overwrite the headcount for one role.
    pub const fn set(&mut self, role: PopulationRole, count: u32) {
        match role {
            PopulationRole::Child => self.children = count,
            PopulationRole::Student => self.students = count,
            PopulationRole::Worker => self.workers = count,
            PopulationRole::Scientist => self.scientists = count,
            PopulationRole::Retired => self.retired = count,
        }
    }

    /// Total headcount across every role.
    pub fn total(&self) -> u32 {
        PopulationRole::ALL
            .into_iter()
            .fold(0_u32, |acc, role| acc.saturating_add(self.size(role)))
    }
}

/// Snapshot of a pool's counters, for reporting and serialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaborCounters {
    /// Scientists doing research.
    pub scientists_used: u32,
    /// Workers assigned.
    pub workers_used: u32,
    /// Scientists covering worker shortfalls.
    pub scientists_as_workers: u32,
}

/// Per-turn allocation of workers and scientists.
///
/// Invariants, holding after every call:
/// `scientists_used + scientists_as_workers <= size(Scientist)` and
/// `workers_used <= size(Worker)`.
#[derive(Debug, Clone)]
pub struct PopulationPool<'a> {
    population: &'a Population,
    scientists_used: u32,
    workers_used: u32,
    scientists_as_workers: u32,
}

impl<'a> PopulationPool<'a> {
    /// A pool with nothing committed.
    pub const fn new(population: &'a Population) -> Self {
        Self {
            population,
            scientists_used: 0,
            workers_used: 0,
            scientists_as_workers: 0,
        }
    }

    /// The population this pool draws from.
    pub const fn population(&self) -> &'a Population {
        self.population
    }

    /// Reset every counter. Called once per turn before labor is requested.
    pub const fn clear(&mut self) {
        self.scientists_used = 0;
        self.workers_used = 0;
        self.scientists_as_workers = 0;
    }

    const fn check(role: PopulationRole) -> Result<(), PopulationError> {
        if role.is_workable() {
            Ok(())
        } else {
            Err(PopulationError::InvalidRole { role })
        }
    }

    const fn scientists_free(&self) -> u32 {
        self.population
            .scientists
            .saturating_sub(self.scientists_used.saturating_add(self.scientists_as_workers))
    }

    const fn workers_free(&self) -> u32 {
        self.population.workers.saturating_sub(self.workers_used)
    }

    /// Headcount of `role` minus what is employed in that role.
    ///
    /// Scientists covering for workers are not subtracted here.
    ///
    /// # Errors
    ///
    /// Returns [`PopulationError::InvalidRole`] for Child, Student, Retired.
    pub fn population_available(&self, role: PopulationRole) -> Result<u32, PopulationError> {
        Self::check(role)?;
        let employed = match role {
            PopulationRole::Scientist => self.scientists_used,
            _ => self.workers_used,
        };
        Ok(self.population.size(role).saturating_sub(employed))
    }

    /// Whether at least `amount` of `role` is available.
    ///
    /// # Errors
    ///
    /// Returns [`PopulationError::InvalidRole`] for Child, Student, Retired.
    pub fn enough_population_available(
        &self,
        role: PopulationRole,
        amount: u32,
    ) -> Result<bool, PopulationError> {
        Ok(self.population_available(role)? >= amount)
    }

    /// Commit `amount` of `role`. All or nothing.
    ///
    /// Scientist requests draw only on scientists not already committed in
    /// either capacity. Worker requests take workers first and cover the
    /// shortfall with free scientists. Returns `Ok(false)`, with no counter
    /// changed, when the request cannot be met in full.
    ///
    /// # Errors
    ///
    /// Returns [`PopulationError::InvalidRole`] for Child, Student, Retired,
    /// whatever the amount.
    pub fn use_population(
        &mut self,
        role: PopulationRole,
        amount: u32,
    ) -> Result<bool, PopulationError> {
        Self::check(role)?;
        let scientists_free = self.scientists_free();
        let workers_free = self.workers_free();

        if role == PopulationRole::Scientist {
            if amount > scientists_free {
                return Ok(false);
            }
            self.scientists_used = self.scientists_used.saturating_add(amount);
            return Ok(true);
        }

        if amount > workers_free.saturating_add(scientists_free) {
            return Ok(false);
        }
        let from_workers = amount.min(workers_free);
        let remainder = amount.saturating_sub(from_workers);
        self.workers_used = self.workers_used.saturating_add(from_workers);
        self.scientists_as_workers = self.scientists_as_workers.saturating_add(remainder);
        if remainder > 0 {
            debug!(remainder, "Scientists covering worker shortfall");
        }
        Ok(true)
    }

    /// Commit a crew of workers and scientists together.
    ///
    /// Either both parts are committed or neither is. Scientist demand is
    /// served first so worker substitution cannot starve it.
    ///
    /// # Errors
    ///
    /// Never fails for valid input; the error type is shared with
    /// [`Self::use_population`].
    pub fn use_labor(&mut self, workers: u32, scientists: u32) -> Result<bool, PopulationError> {
        let before = self.counters();
        if !self.use_population(PopulationRole::Scientist, scientists)? {
            return Ok(false);
        }
        if !self.use_population(PopulationRole::Worker, workers)? {
            self.restore(before);
            return Ok(false);
        }
        Ok(true)
    }

    /// Scientists doing research.
    pub const fn scientists_employed(&self) -> u32 {
        self.scientists_used
    }

    /// Workers assigned.
    pub const fn workers_employed(&self) -> u32 {
        self.workers_used
    }

    /// Scientists covering worker shortfalls.
    pub const fn scientists_as_workers(&self) -> u32 {
        self.scientists_as_workers
    }

    /// Everyone committed, in any capacity.
    pub const fn population_employed(&self) -> u32 {
        self.scientists_used
            .saturating_add(self.scientists_as_workers)
            .saturating_add(self.workers_used)
    }

    /// Current counters.
    pub const fn counters(&self) -> LaborCounters {
        LaborCounters {
            scientists_used: self.scientists_used,
            workers_used: self.workers_used,
            scientists_as_workers: self.scientists_as_workers,
        }
    }

    /// Reinstate counters captured earlier, clamped to the population so the
    /// pool invariants hold even if headcount shrank in between.
    pub fn restore(&mut self, counters: LaborCounters) {
        self.workers_used = counters.workers_used.min(self.population.workers);
        self.scientists_used = counters.scientists_used.min(self.population.scientists);
        self.scientists_as_workers = counters
            .scientists_as_workers
            .min(self.population.scientists.saturating_sub(self.scientists_used));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn population(workers: u32, scientists: u32) -> Population {
        Population {
            children: 4,
            students: 3,
            workers,
            scientists,
            retired: 2,
        }
    }

    #[test]
    fn cleared_pool_reports_full_headcount() {
        let pop = population(10, 5);
        let mut pool = PopulationPool::new(&pop);
        pool.use_population(PopulationRole::Worker, 12).unwrap();
        pool.clear();
        assert_eq!(pool.population_available(PopulationRole::Worker).unwrap(), 10);
        assert_eq!(pool.population_available(PopulationRole::Scientist).unwrap(), 5);
    }

    #[test]
    fn scientist_request_touches_only_scientists_used() {
        let pop = population(10, 5);
        let mut pool = PopulationPool::new(&pop);
        assert!(pool.use_population(PopulationRole::Scientist, 3).unwrap());
        assert_eq!(pool.scientists_employed(), 3);
        assert_eq!(pool.workers_employed(), 0);
        assert_eq!(pool.scientists_as_workers(), 0);
        assert!(!pool.use_population(PopulationRole::Scientist, 3).unwrap());
        assert_eq!(pool.scientists_employed(), 3);
    }

    #[test]
    fn worker_shortfall_is_covered_by_scientists() {
        let pop = population(4, 5);
        let mut pool = PopulationPool::new(&pop);
        assert!(pool.use_population(PopulationRole::Worker, 7).unwrap());
        assert_eq!(pool.workers_employed(), 4);
        assert_eq!(pool.scientists_as_workers(), 3);
        assert_eq!(pool.population_employed(), 7);
        // Only two scientists remain for research.
        assert!(!pool.use_population(PopulationRole::Scientist, 3).unwrap());
        assert!(pool.use_population(PopulationRole::Scientist, 2).unwrap());
    }

    #[test]
    fn oversized_worker_request_is_all_or_nothing() {
        let pop = population(4, 5);
        let mut pool = PopulationPool::new(&pop);
        assert!(!pool.use_population(PopulationRole::Worker, 10).unwrap());
        assert_eq!(pool.counters(), LaborCounters::default());
    }

    #[test]
    fn non_workable_roles_always_fail() {
        let pop = population(4, 5);
        let mut pool = PopulationPool::new(&pop);
        for role in [
            PopulationRole::Child,
            PopulationRole::Student,
            PopulationRole::Retired,
        ] {
            for amount in [0, 1, 100] {
                assert!(matches!(
                    pool.use_population(role, amount),
                    Err(PopulationError::InvalidRole { .. })
                ));
                assert!(pool.enough_population_available(role, amount).is_err());
            }
            assert!(pool.population_available(role).is_err());
        }
    }

    #[test]
    fn use_labor_rolls_back_scientists_when_workers_fall_short() {
        let pop = population(2, 3);
        let mut pool = PopulationPool::new(&pop);
        // Three scientists would be taken, leaving nobody to cover workers.
        assert!(!pool.use_labor(3, 3).unwrap());
        assert_eq!(pool.counters(), LaborCounters::default());
        assert!(pool.use_labor(3, 2).unwrap());
        assert_eq!(pool.workers_employed(), 2);
        assert_eq!(pool.scientists_employed(), 2);
        assert_eq!(pool.scientists_as_workers(), 1);
    }

    #[test]
    fn population_total_sums_roles() {
        assert_eq!(population(10, 5).total(), 24);
    }
}

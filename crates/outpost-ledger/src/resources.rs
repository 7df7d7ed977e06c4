//! The resource ledger value type.
//!
//! A [`StorableResources`] holds one counter per [`Material`] plus an energy
//! counter. All arithmetic saturates: addition stops at `u32::MAX`,
//! subtraction stops at zero. Comparisons are component-wise and take a
//! [`Scope`] so call sites decide whether energy participates.

use serde::{Deserialize, Serialize};

use outpost_types::Material;

use crate::LedgerError;

/// Which components a comparison looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// The four materials only.
    Materials,
    /// The four materials and energy.
    MaterialsAndEnergy,
}

/// Four material counters plus energy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorableResources {
    /// Common metals.
    pub common_metals: u32,
    /// Common minerals.
    pub common_minerals: u32,
    /// Rare metals.
    pub rare_metals: u32,
    /// Rare minerals.
    pub rare_minerals: u32,
    /// Energy.
    #[serde(default)]
    pub energy: u32,
}

impl StorableResources {
    /// An empty ledger.
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    /// Create a ledger with the given material amounts and no energy.
    pub const fn new(
        common_metals: u32,
        common_minerals: u32,
        rare_metals: u32,
        rare_minerals: u32,
    ) -> Self {
        Self {
            common_metals,
            common_minerals,
            rare_metals,
            rare_minerals,
            energy: 0,
        }
    }

    /// Every material set to `amount`, no energy.
    pub const fn uniform(amount: u32) -> Self {
        Self::new(amount, amount, amount, amount)
    }

    /// Return a copy with the energy counter replaced.
    #[must_use]
    pub const fn with_energy(mut self, energy: u32) -> Self {
        self.energy = energy;
        self
    }

    /// Amount held of one material.
    pub const fn get(&self, material: Material) -> u32 {
        match material {
            Material::CommonMetals => self.common_metals,
            Material::CommonMinerals => self.common_minerals,
            Material::RareMetals => self.rare_metals,
            Material::RareMinerals => self.rare_minerals,
        }
    }

    /// Overwrite the amount held of one material.
    pub const fn set(&mut self, material: Material, amount: u32) {
        match material {
            Material::CommonMetals => self.common_metals = amount,
            Material::CommonMinerals => self.common_minerals = amount,
            Material::RareMetals => self.rare_metals = amount,
            Material::RareMinerals => self.rare_minerals = amount,
        }
    }

    /// Apply `f` to every material counter, leaving energy untouched.
    #[must_use]
    pub fn map_materials(self, mut f: impl FnMut(Material, u32) -> u32) -> Self {
        let mut out = self;
        for material in Material::ALL {
            out.set(material, f(material, self.get(material)));
        }
        out
    }

    /// Combine two ledgers component-wise with `f`, energy included.
    fn zip_with(self, other: Self, f: impl Fn(u32, u32) -> u32) -> Self {
        let mut out = self.map_materials(|m, v| f(v, other.get(m)));
        out.energy = f(self.energy, other.energy);
        out
    }

    fn all_components(self, other: Self, scope: Scope, f: impl Fn(u32, u32) -> bool) -> bool {
        let materials = Material::ALL
            .into_iter()
            .all(|m| f(self.get(m), other.get(m)));
        match scope {
            Scope::Materials => materials,
            Scope::MaterialsAndEnergy => materials && f(self.energy, other.energy),
        }
    }

    // -------------------------------------------------------------------
    // Arithmetic
    // -------------------------------------------------------------------

    /// Component-wise sum, saturating at `u32::MAX`.
    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        self.zip_with(other, u32::saturating_add)
    }

    /// Component-wise difference, saturating at zero.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        self.zip_with(other, u32::saturating_sub)
    }

    /// Add `other` into this ledger.
    pub fn add(&mut self, other: Self) {
        *self = self.saturating_add(other);
    }

    /// Remove `other` from this ledger, stopping each counter at zero.
    pub fn subtract(&mut self, other: Self) {
        *self = self.saturating_sub(other);
    }

    /// Remove `other` only if every component is covered.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Insufficient`] and leaves the ledger unchanged
    /// if any component of `other` exceeds what is held.
    pub fn try_subtract(&mut self, other: Self) -> Result<(), LedgerError> {
        if !self.covers(other, Scope::MaterialsAndEnergy) {
            return Err(LedgerError::Insufficient {
                requested: other,
                available: *self,
            });
        }
        self.subtract(other);
        Ok(())
    }

    // -------------------------------------------------------------------
    // Capacity
    // -------------------------------------------------------------------

    /// Each material clamped to at most `limit`. Energy passes through.
    #[must_use]
    pub fn cap(self, limit: u32) -> Self {
        self.map_materials(|_, v| v.min(limit))
    }

    /// The capped ledger and the excess that was cut off.
    ///
    /// `capped + overflow == self` holds for every component.
    pub fn cap_with_overflow(self, limit: u32) -> (Self, Self) {
        let capped = self.cap(limit);
        (capped, self.saturating_sub(capped))
    }

    /// Keep materials in ledger order until `total` units have been kept.
    #[must_use]
    pub fn limit_total(self, total: u32) -> Self {
        let mut budget = total;
        self.map_materials(|_, v| {
            let kept = v.min(budget);
            budget = budget.saturating_sub(kept);
            kept
        })
    }

    /// Sum of the four materials.
    pub fn total_materials(&self) -> u32 {
        Material::ALL
            .into_iter()
            .fold(0_u32, |acc, m| acc.saturating_add(self.get(m)))
    }

    // -------------------------------------------------------------------
    // Comparisons
    // -------------------------------------------------------------------

    /// Whether every counter, energy included, is zero.
    pub fn is_empty(&self) -> bool {
        self.total_materials() == 0 && self.energy == 0
    }

    /// Every compared component is `>=` the matching one in `other`.
    pub fn covers(self, other: Self, scope: Scope) -> bool {
        self.all_components(other, scope, |a, b| a >= b)
    }

    /// Every compared component is strictly below the matching one in `limit`.
    pub fn is_below(self, limit: Self, scope: Scope) -> bool {
        self.all_components(limit, scope, |a, b| a < b)
    }

    /// Some compared component has reached the matching one in `limit`.
    pub fn reaches(self, limit: Self, scope: Scope) -> bool {
        !self.is_below(limit, scope)
    }
}

// ---------------------------------------------------------------------------
// ResourceStore
// ---------------------------------------------------------------------------

/// A ledger with an optional bound on the total materials it may hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStore {
    /// Current contents.
    pub resources: StorableResources,
    /// Maximum total materials, or `None` for unbounded.
    pub capacity: Option<u32>,
}

impl ResourceStore {
    /// An empty store with no bound.
    pub const fn unbounded() -> Self {
        Self {
            resources: StorableResources::ZERO,
            capacity: None,
        }
    }

    /// An empty store bounded to `capacity` total materials.
    pub const fn bounded(capacity: u32) -> Self {
        Self {
            resources: StorableResources::ZERO,
            capacity: Some(capacity),
        }
    }

    /// Space left before the bound is reached. Unbounded stores report
    /// `u32::MAX`.
    pub fn remaining_capacity(&self) -> u32 {
        self.capacity.map_or(u32::MAX, |cap| {
            cap.saturating_sub(self.resources.total_materials())
        })
    }

    /// Whether no more materials fit.
    pub fn is_full(&self) -> bool {
        self.remaining_capacity() == 0
    }

    /// Accept as much of `incoming` as fits, in ledger order. Returns the
    /// part that did not fit.
    pub fn push(&mut self, incoming: StorableResources) -> StorableResources {
        let accepted = incoming.limit_total(self.remaining_capacity());
        self.resources.add(accepted);
        incoming.saturating_sub(accepted)
    }

    /// Empty the store, returning what it held.
    pub fn take_all(&mut self) -> StorableResources {
        core::mem::take(&mut self.resources)
    }
}

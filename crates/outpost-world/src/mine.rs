//! Ore deposits.
//!
//! A mine is dug one level at a time. Each dug level opens a vein holding a
//! fixed amount of each material; a mine facility pulls ore out of the
//! veins, shallowest first. Once every dug vein is empty the mine is
//! exhausted until it is dug deeper.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use outpost_ledger::StorableResources;
use outpost_types::{Material, MineYield};

/// An ore deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mine {
    richness: MineYield,
    active: bool,
    vein_template: StorableResources,
    veins: Vec<StorableResources>,
    mining: BTreeSet<Material>,
}

impl Mine {
    /// An undug deposit. `vein` is the ore each new level will hold.
    pub fn new(richness: MineYield, vein: StorableResources) -> Self {
        Self {
            richness,
            active: false,
            vein_template: vein,
            veins: Vec::new(),
            mining: Material::ALL.into_iter().collect(),
        }
    }

    /// Deposit richness.
    pub const fn richness(&self) -> MineYield {
        self.richness
    }

    /// Number of levels dug.
    pub fn depth(&self) -> u32 {
        u32::try_from(self.veins.len()).unwrap_or(u32::MAX)
    }

    /// Whether a facility is working the mine.
    pub const fn active(&self) -> bool {
        self.active
    }

    /// Switch the mine on or off.
    pub const fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Dig one level deeper, opening a fresh vein.
    pub fn increase_depth(&mut self) {
        self.veins.push(self.vein_template);
        debug!(depth = self.veins.len(), "Mine deepened");
    }

    /// Dug at least once and every dug vein is empty.
    pub fn exhausted(&self) -> bool {
        !self.veins.is_empty() && self.veins.iter().all(|v| v.total_materials() == 0)
    }

    /// Ore left across all dug levels.
    pub fn available(&self) -> StorableResources {
        self.veins
            .iter()
            .fold(StorableResources::ZERO, |acc, v| acc.saturating_add(*v))
    }

    /// Whether the facility extracts `material`.
    pub fn is_mining(&self, material: Material) -> bool {
        self.mining.contains(&material)
    }

    /// Enable or disable extraction of `material`.
    pub fn set_mining(&mut self, material: Material, enabled: bool) {
        if enabled {
            self.mining.insert(material);
        } else {
            self.mining.remove(&material);
        }
    }

    /// Remove up to `amount` of `material`, shallowest vein first. Returns
    /// what was actually removed.
    pub fn pull(&mut self, material: Material, amount: u32) -> u32 {
        let mut remaining = amount;
        for vein in &mut self.veins {
            if remaining == 0 {
                break;
            }
            let held = vein.get(material);
            let taken = held.min(remaining);
            vein.set(material, held.saturating_sub(taken));
            remaining = remaining.saturating_sub(taken);
        }
        amount.saturating_sub(remaining)
    }
}

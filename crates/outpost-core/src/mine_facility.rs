//! Ore extraction.
//!
//! A mine facility pulls a fixed amount of each enabled material out of the
//! mine under it every turn. It throttles early: once any material in
//! storage reaches a quarter of capacity the facility idles until the
//! colony hauls the ore away.

use serde::{Deserialize, Serialize};
use tracing::info;

use outpost_ledger::{ResourceStore, Scope, StorableResources};
use outpost_types::{IdleReason, Material};
use outpost_world::Mine;

use crate::structure::{Lifecycle, ThinkEvent, quarter_capacity};

/// Extraction state for one mine facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MineFacility {
    rate: u32,
    extension_turns: u32,
    max_depth: u32,
    dig_turns_remaining: u32,
}

impl MineFacility {
    /// A facility pulling `rate` ore per material per turn.
    pub const fn new(rate: u32, extension_turns: u32, max_depth: u32) -> Self {
        Self {
            rate,
            extension_turns,
            max_depth,
            dig_turns_remaining: 0,
        }
    }

    /// Turns left on the current shaft extension, 0 when not digging.
    pub const fn dig_turns_remaining(&self) -> u32 {
        self.dig_turns_remaining
    }

    /// Whether a shaft extension is under way.
    pub const fn extending(&self) -> bool {
        self.dig_turns_remaining > 0
    }

    /// Whether the shaft can be dug deeper now.
    pub fn can_extend(&self, mine: &Mine) -> bool {
        mine.depth() < self.max_depth && !self.extending()
    }

    /// Start a shaft extension. Returns `false` if one cannot start.
    pub fn extend(&mut self, mine: &Mine) -> bool {
        if !self.can_extend(mine) {
            return false;
        }
        self.dig_turns_remaining = self.extension_turns.max(1);
        true
    }

    pub(crate) fn think(
        &mut self,
        lifecycle: &mut Lifecycle,
        production: &mut StorableResources,
        storage: &mut ResourceStore,
        mine: Option<&mut Mine>,
    ) -> Option<ThinkEvent> {
        if lifecycle.force_idle() {
            return None;
        }

        let Some(mine) = mine else {
            lifecycle.idle(IdleReason::MineInactive);
            return None;
        };

        if self.extending() {
            self.dig_turns_remaining = self.dig_turns_remaining.saturating_sub(1);
            if self.dig_turns_remaining == 0 {
                mine.increase_depth();
                info!(depth = mine.depth(), "Mine shaft extension complete");
                return Some(ThinkEvent::ShaftExtended {
                    depth: mine.depth(),
                });
            }
            return None;
        }

        if !mine.active() {
            if !lifecycle.is_idle() {
                lifecycle.idle(IdleReason::MineInactive);
            }
            return None;
        }

        let threshold = quarter_capacity(storage);
        if lifecycle.is_idle() && storage.resources.is_below(threshold, Scope::Materials) {
            lifecycle.enable();
        }

        if mine.exhausted() {
            lifecycle.idle(IdleReason::MineExhausted);
            return None;
        }

        if lifecycle.is_operational() && storage.resources.reaches(threshold, Scope::Materials) {
            lifecycle.idle(IdleReason::InternalStorageFull);
            return None;
        }

        if lifecycle.is_operational() {
            for material in Material::ALL {
                if !mine.is_mining(material) {
                    continue;
                }
                let wanted = self.rate.min(storage.remaining_capacity());
                let pulled = mine.pull(material, wanted);
                production.set(material, production.get(material).saturating_add(pulled));
            }
            *production = storage.push(*production);
        }
        None
    }
}

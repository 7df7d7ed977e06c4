//! Ore refining.
//!
//! Refineries (the SEED smelter and full smelters) hold ore in their
//! production buffer and convert it in fixed batches: once a material has at
//! least `minimum_batch` ore, one batch is consumed and `minimum_batch /
//! divisor` refined units are produced. Refined output is held to a quarter
//! of capacity per material; anything beyond that goes back into the
//! production buffer and the refinery idles until storage is drawn down.

use serde::{Deserialize, Serialize};
use tracing::debug;

use outpost_ledger::{ResourceStore, Scope, StorableResources};
use outpost_types::{IdleReason, Material};

use crate::structure::{Lifecycle, quarter_capacity};

/// Conversion parameters for one refinery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OreRefinery {
    minimum_batch: u32,
    metal_divisor: u32,
    mineral_divisor: u32,
}

impl OreRefinery {
    /// A refinery converting batches of `minimum_batch` ore.
    pub const fn new(minimum_batch: u32, metal_divisor: u32, mineral_divisor: u32) -> Self {
        Self {
            minimum_batch,
            metal_divisor,
            mineral_divisor,
        }
    }

    /// Ore needed before a material converts.
    pub const fn minimum_batch(&self) -> u32 {
        self.minimum_batch
    }

    /// Ore units per refined unit for `material`.
    pub const fn divisor(&self, material: Material) -> u32 {
        if material.is_metal() {
            self.metal_divisor
        } else {
            self.mineral_divisor
        }
    }

    pub(crate) fn think(
        &self,
        lifecycle: &mut Lifecycle,
        production: &mut StorableResources,
        storage: &mut ResourceStore,
    ) {
        if lifecycle.force_idle() {
            return;
        }

        let threshold = quarter_capacity(storage);
        if lifecycle.is_idle() && storage.resources.is_below(threshold, Scope::Materials) {
            lifecycle.enable();
        }

        if lifecycle.is_operational() {
            self.update_production(lifecycle, production, storage, threshold);
        }
    }

    fn update_production(
        &self,
        lifecycle: &mut Lifecycle,
        production: &mut StorableResources,
        storage: &mut ResourceStore,
        threshold: StorableResources,
    ) {
        let mut converted = StorableResources::ZERO;
        for material in Material::ALL {
            let ore = production.get(material);
            if ore < self.minimum_batch {
                continue;
            }
            let refined = self
                .minimum_batch
                .checked_div(self.divisor(material))
                .unwrap_or(0);
            converted.set(material, refined);
            production.set(material, ore.saturating_sub(self.minimum_batch));
        }

        let total = storage.resources.saturating_add(converted);
        let capped = total.map_materials(|m, v| v.min(threshold.get(m)));
        let overflow = total.saturating_sub(capped);
        storage.resources = capped;

        if overflow.total_materials() > 0 {
            production.add(overflow);
            lifecycle.idle(IdleReason::InternalStorageFull);
            debug!(overflow = overflow.total_materials(), "Refinery storage full");
        }
    }
}

#[cfg(test)]
mod tests {
    use outpost_types::{StructureKind, StructureState};

    use super::*;
    use crate::structure::{Behavior, Structure, StructureSpec};

    fn smelter(capacity: u32) -> Structure {
        let mut s = Structure::new(
            StructureKind::Smelter,
            StructureSpec {
                turns_to_build: 1,
                internal_capacity: capacity,
                ..StructureSpec::default()
            },
            None,
            Behavior::Refinery(OreRefinery::new(20, 2, 3)),
        );
        s.advance();
        s.activated(None);
        s
    }

    #[test]
    fn exactly_one_batch_converts_at_its_divisor() {
        let mut s = smelter(800);
        s.set_production(StorableResources::new(20, 19, 0, 5));
        s.think(None);
        assert_eq!(s.storage().resources, StorableResources::new(10, 0, 0, 0));
        assert_eq!(s.production(), StorableResources::new(0, 19, 0, 5));
    }

    #[test]
    fn minerals_use_their_own_divisor() {
        let mut s = smelter(800);
        s.set_production(StorableResources::new(0, 20, 20, 21));
        s.think(None);
        assert_eq!(s.storage().resources, StorableResources::new(0, 6, 10, 6));
        assert_eq!(s.production(), StorableResources::new(0, 0, 0, 1));
    }

    #[test]
    fn overflow_returns_to_production_and_idles() {
        // Quarter of 40 is 10 per material.
        let mut s = smelter(40);
        s.storage_mut().resources = StorableResources::new(4, 0, 0, 0);
        s.set_production(StorableResources::new(20, 0, 0, 0));
        let before = s.production();

        s.think(None);

        let consumed = StorableResources::new(20, 0, 0, 0);
        let converted = StorableResources::new(10, 0, 0, 0);
        assert_eq!(s.storage().resources, StorableResources::new(10, 0, 0, 0));
        assert_eq!(s.production(), StorableResources::new(4, 0, 0, 0));
        // Nothing is lost: overflow is pushed back into production.
        assert_eq!(
            s.production()
                .saturating_add(s.storage().resources),
            before
                .saturating_sub(consumed)
                .saturating_add(converted)
                .saturating_add(StorableResources::new(4, 0, 0, 0))
        );
        assert_eq!(s.lifecycle().idle_reason(), Some(IdleReason::InternalStorageFull));
    }

    #[test]
    fn reenables_once_storage_drops_below_threshold() {
        let mut s = smelter(40);
        s.storage_mut().resources = StorableResources::new(10, 0, 0, 0);
        s.lifecycle_mut().idle(IdleReason::InternalStorageFull);

        s.think(None);
        assert_eq!(s.state(), StructureState::Idle);

        s.storage_mut().take_all();
        s.set_production(StorableResources::new(20, 0, 0, 0));
        s.think(None);
        assert_eq!(s.state(), StructureState::Operational);
        assert_eq!(s.storage().resources, StorableResources::new(10, 0, 0, 0));
    }

    #[test]
    fn idle_refinery_does_not_convert() {
        let mut s = smelter(800);
        s.lifecycle_mut().set_force_idle(true);
        s.set_production(StorableResources::uniform(100));
        s.think(None);
        assert!(s.storage().resources.is_empty());
    }

    #[test]
    fn accept_ore_respects_capacity() {
        let mut s = smelter(50);
        let rejected = s.accept_ore(StorableResources::new(30, 30, 0, 0));
        assert_eq!(s.production(), StorableResources::new(30, 20, 0, 0));
        assert_eq!(rejected, StorableResources::new(0, 10, 0, 0));
    }
}

//! Scripted opening the headless run plays out.
//!
//! Offsets are relative to the lander center. Orders whose tile falls off
//! the map or is refused are logged and skipped; the run goes on.

use tracing::{info, warn};

use outpost_core::{Colony, ColonyError, PlacementOutcome};
use outpost_types::{ConnectorDir, StructureKind, TilePosition, TileRef};

/// One build action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Bulldoze a tile.
    Clear(i32, i32),
    /// Lay a tube.
    Tube(i32, i32, ConnectorDir),
    /// Place a facility.
    Build(StructureKind, i32, i32),
}

/// An order and the turn after which it is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Issued once this many turns have run.
    pub after_turn: u32,
    /// What to do.
    pub order: Order,
}

const fn step(after_turn: u32, order: Order) -> Step {
    Step { after_turn, order }
}

/// The opening build order. The tube spine is laid first so the facilities
/// behind it can be placed in the same turn.
pub const OPENING: [Step; 11] = [
    step(2, Order::Build(StructureKind::Chap, 1, 1)),
    step(2, Order::Clear(0, 2)),
    step(2, Order::Tube(0, 2, ConnectorDir::Intersection)),
    step(2, Order::Clear(0, 3)),
    step(2, Order::Tube(0, 3, ConnectorDir::Intersection)),
    step(2, Order::Clear(1, 2)),
    step(2, Order::Build(StructureKind::Residence, 1, 2)),
    step(2, Order::Clear(-1, 2)),
    step(2, Order::Build(StructureKind::StorageTanks, -1, 2)),
    step(2, Order::Clear(0, 4)),
    step(2, Order::Build(StructureKind::Laboratory, 0, 4)),
];

/// Steps due right after `turn`.
pub fn due(turn: u32) -> impl Iterator<Item = &'static Step> {
    OPENING.iter().filter(move |s| s.after_turn == turn)
}

/// Deposit closest to `center` by grid distance.
pub fn nearest_deposit(colony: &Colony, center: TilePosition) -> Option<TilePosition> {
    colony
        .map()
        .mine_positions()
        .into_iter()
        .min_by_key(|p| p.x.abs_diff(center.x).saturating_add(p.y.abs_diff(center.y)))
}

/// Lander center: the middle of the map, nudged off any deposit.
pub fn landing_site(colony: &Colony) -> TilePosition {
    let map = colony.map();
    let mid = TilePosition::new(
        i32::try_from(map.width() / 2).unwrap_or(1),
        i32::try_from(map.height() / 2).unwrap_or(1),
    );
    let clear = |center: TilePosition| {
        (-1..=1).all(|dy| {
            (-1..=1).all(|dx| {
                center
                    .offset(dx, dy)
                    .and_then(|p| map.tile(TileRef::new(p, 0)))
                    .is_some_and(|t| !t.has_mine())
            })
        })
    };
    (0..map.width())
        .filter_map(|shift| i32::try_from(shift).ok())
        .filter_map(|shift| mid.offset(shift, 0))
        .find(|p| clear(*p))
        .unwrap_or(mid)
}

/// Carry out one order.
///
/// # Errors
///
/// Propagates [`ColonyError`] for API misuse; refusals are only logged.
pub fn apply(colony: &mut Colony, center: TilePosition, order: Order) -> Result<(), ColonyError> {
    let (dx, dy) = match order {
        Order::Clear(dx, dy) | Order::Tube(dx, dy, _) | Order::Build(_, dx, dy) => (dx, dy),
    };
    let Some(tile) = center.offset(dx, dy).map(|p| TileRef::new(p, 0)) else {
        warn!(?order, "Order falls off the map");
        return Ok(());
    };
    let outcome = match order {
        Order::Clear(..) => {
            if !colony.bulldoze_tile(tile)? {
                warn!(%tile, "Tile could not be cleared");
            }
            return Ok(());
        }
        Order::Tube(_, _, dir) => colony.place_tube(tile, dir)?,
        Order::Build(kind, _, _) => colony.place_structure(kind, tile)?,
    };
    match outcome {
        PlacementOutcome::Placed(id) => info!(structure = %id, ?order, "Order placed"),
        PlacementOutcome::Rejected(reason) => warn!(?order, ?reason, "Order refused"),
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use outpost_core::SimulationConfig;

    use super::*;

    #[test]
    fn opening_is_sorted_by_turn() {
        assert!(OPENING.windows(2).all(|w| w.first().unwrap().after_turn <= w.get(1).unwrap().after_turn));
        assert_eq!(due(2).count(), OPENING.len());
        assert_eq!(due(3).count(), 0);
    }

    #[test]
    fn opening_is_built_in_a_single_turn() {
        let config = SimulationConfig::parse("map:\n  width: 16\n  height: 16\n  mine_count: 0\n").unwrap();
        let mut colony = Colony::new(&config).unwrap();
        let center = landing_site(&colony);
        colony.deploy_seed_lander(center).unwrap();
        for turn in 1..=2 {
            colony.advance_turn().unwrap();
            for s in due(turn) {
                apply(&mut colony, center, s.order).unwrap();
            }
        }
        assert_eq!(colony.turn(), 2);
        let manager = colony.manager();
        for (kind, dx, dy) in [
            (StructureKind::Chap, 1, 1),
            (StructureKind::Residence, 1, 2),
            (StructureKind::StorageTanks, -1, 2),
            (StructureKind::Laboratory, 0, 4),
        ] {
            let tile = TileRef::new(center.offset(dx, dy).unwrap(), 0);
            let id = colony.map().structure_at(tile).unwrap();
            assert_eq!(manager.structure(id).unwrap().kind(), kind);
        }
    }
}

//! Integration tests for the ore chain: mine facility, seed smelter,
//! stockpile.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use outpost_core::{Colony, ColonyEvent, PlacementOutcome, PlacementRejection, SimulationConfig};
use outpost_types::{IdleReason, StructureId, TilePosition, TileRef};

fn mined_colony() -> Colony {
    let yaml = "map:\n  width: 16\n  height: 16\n  mine_count: 6\nproduction:\n  shaft_extension_turns: 2\n";
    Colony::new(&SimulationConfig::parse(yaml).unwrap()).unwrap()
}

fn has_mine(colony: &Colony, position: TilePosition) -> bool {
    colony
        .map()
        .tile(TileRef::new(position, 0))
        .is_some_and(|t| t.has_mine())
}

/// A lander site whose footprint holds no deposit.
fn clear_site(colony: &Colony) -> TilePosition {
    (1..15)
        .flat_map(|y| (1..15).map(move |x| TilePosition::new(x, y)))
        .find(|center| {
            (-1..=1).all(|dy| {
                (-1..=1).all(|dx| !has_mine(colony, center.offset(dx, dy).unwrap()))
            })
        })
        .unwrap()
}

fn founded() -> (Colony, StructureId, TilePosition) {
    let mut colony = mined_colony();
    let site = clear_site(&colony);
    colony.deploy_seed_lander(site).unwrap().placed().unwrap();
    let deposit = *colony.map().mine_positions().first().unwrap();
    let facility = colony
        .place_mine_facility(deposit)
        .unwrap()
        .placed()
        .unwrap();
    (colony, facility, deposit)
}

#[test]
fn deposits_are_scattered_deterministically() {
    let a = mined_colony();
    let b = mined_colony();
    assert_eq!(a.map().mine_positions(), b.map().mine_positions());
    assert!(!a.map().mine_positions().is_empty());
}

#[test]
fn activation_opens_the_mine() {
    let (mut colony, _, deposit) = founded();
    assert!(!colony.map().mine(deposit).unwrap().active());
    colony.advance_turn().unwrap();
    colony.advance_turn().unwrap();
    let mine = colony.map().mine(deposit).unwrap();
    assert!(mine.active());
    assert_eq!(mine.depth(), 1);
}

#[test]
fn ore_reaches_the_stockpile_through_the_smelter() {
    let (mut colony, _, _) = founded();
    let start = colony.stockpile();
    for _ in 0..6 {
        colony.advance_turn().unwrap();
    }
    assert_eq!(colony.stockpile(), start);

    for _ in 0..4 {
        colony.advance_turn().unwrap();
    }
    let after = colony.stockpile();
    assert!(after.common_metals > start.common_metals);
    assert!(after.rare_minerals > start.rare_minerals);
}

#[test]
fn worked_deposit_cannot_take_a_second_facility() {
    let (mut colony, _, deposit) = founded();
    assert_eq!(
        colony.place_mine_facility(deposit).unwrap(),
        PlacementOutcome::Rejected(PlacementRejection::MineAlreadyWorked)
    );
}

#[test]
fn shaft_extension_reports_the_new_depth() {
    let (mut colony, facility, deposit) = founded();
    colony.advance_turn().unwrap();
    colony.advance_turn().unwrap();

    assert!(colony.extend_mine(facility).unwrap());
    assert!(!colony.extend_mine(facility).unwrap());

    let mut events = Vec::new();
    for _ in 0..2 {
        events.extend(colony.advance_turn().unwrap().events);
    }
    assert!(events.contains(&ColonyEvent::ShaftExtended {
        structure: facility,
        depth: 2
    }));
    assert_eq!(colony.map().mine(deposit).unwrap().depth(), 2);
}

#[test]
fn bulldozed_facility_closes_the_mine() {
    let (mut colony, facility, deposit) = founded();
    colony.advance_turn().unwrap();
    colony.advance_turn().unwrap();
    colony.bulldoze_structure(facility).unwrap();
    assert!(!colony.map().mine(deposit).unwrap().active());
    assert!(matches!(
        colony.place_mine_facility(deposit).unwrap(),
        PlacementOutcome::Placed(_)
    ));
}

#[test]
fn player_can_switch_a_facility_off() {
    let (mut colony, facility, _) = founded();
    colony.advance_turn().unwrap();
    colony.advance_turn().unwrap();
    colony.set_force_idle(facility, true).unwrap();
    colony.advance_turn().unwrap();
    let structure = colony.manager().structure(facility).unwrap();
    assert_eq!(structure.lifecycle().idle_reason(), Some(IdleReason::PlayerSet));

    colony.set_force_idle(facility, false).unwrap();
    colony.advance_turn().unwrap();
    assert!(colony
        .manager()
        .structure(facility)
        .unwrap()
        .lifecycle()
        .is_operational());
}

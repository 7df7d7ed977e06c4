//! Integration tests for the connectivity walk over a real tile map.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use std::collections::BTreeMap;

use outpost_ledger::StorableResources;
use outpost_types::{ConnectorDir, MineYield, StructureId, TilePosition, TileRef};
use outpost_world::{
    Mine, Mount, MountLookup, TileMap, valid_structure_placement, valid_tube_connection, walk,
};

#[derive(Default)]
struct Mounts {
    next: u32,
    mounts: BTreeMap<StructureId, Mount>,
}

impl Mounts {
    fn place(&mut self, map: &mut TileMap, tile: TileRef, mount: Mount) -> StructureId {
        let id = StructureId::new(self.next, 0);
        self.next += 1;
        self.mounts.insert(id, mount);
        map.set_structure(tile, id).unwrap();
        id
    }
}

impl MountLookup for Mounts {
    fn mount(&self, id: StructureId) -> Option<Mount> {
        self.mounts.get(&id).copied()
    }
}

fn tube(dir: ConnectorDir) -> Mount {
    Mount::Connector(dir)
}

#[test]
fn tube_run_connects_remote_facility() {
    let mut map = TileMap::new(8, 8, 1).unwrap();
    let mut mounts = Mounts::default();
    let cc = TileRef::surface(1, 1);
    mounts.place(&mut map, cc, Mount::Facility);
    mounts.place(&mut map, TileRef::surface(2, 1), tube(ConnectorDir::Right));
    mounts.place(&mut map, TileRef::surface(3, 1), tube(ConnectorDir::Right));
    mounts.place(&mut map, TileRef::surface(4, 1), Mount::Facility);
    // Adjacent to the CC but with no tube in between.
    mounts.place(&mut map, TileRef::surface(1, 2), Mount::Facility);

    let overlay = walk(&mut map, cc, &mounts);

    assert_eq!(overlay.len(), 4);
    assert!(map.is_connected(TileRef::surface(4, 1)));
    assert!(!map.is_connected(TileRef::surface(1, 2)));
}

#[test]
fn misoriented_tube_blocks_the_walk() {
    let mut map = TileMap::new(8, 8, 0).unwrap();
    let mut mounts = Mounts::default();
    let cc = TileRef::surface(1, 1);
    mounts.place(&mut map, cc, Mount::Facility);
    mounts.place(&mut map, TileRef::surface(2, 1), tube(ConnectorDir::Left));
    mounts.place(&mut map, TileRef::surface(3, 1), Mount::Facility);

    walk(&mut map, cc, &mounts);

    assert!(!map.is_connected(TileRef::surface(2, 1)));
    assert!(!map.is_connected(TileRef::surface(3, 1)));
}

#[test]
fn air_shafts_carry_the_network_underground() {
    let mut map = TileMap::new(6, 6, 2).unwrap();
    let mut mounts = Mounts::default();
    let cc = TileRef::surface(1, 1);
    let shaft_top = TileRef::surface(2, 1);
    let shaft_bottom = TileRef::new(TilePosition::new(2, 1), 1);
    let below = TileRef::new(TilePosition::new(3, 1), 1);
    mounts.place(&mut map, cc, Mount::Facility);
    mounts.place(&mut map, shaft_top, tube(ConnectorDir::Vertical));
    map.excavate(shaft_bottom).unwrap();
    map.excavate(below).unwrap();
    mounts.place(&mut map, shaft_bottom, tube(ConnectorDir::Vertical));
    mounts.place(&mut map, below, Mount::Facility);

    walk(&mut map, cc, &mounts);

    assert!(map.is_connected(shaft_bottom));
    assert!(map.is_connected(below));
}

#[test]
fn unexcavated_and_mine_tiles_are_skipped() {
    let mut map = TileMap::new(6, 6, 1).unwrap();
    let mut mounts = Mounts::default();
    let cc = TileRef::surface(1, 1);
    mounts.place(&mut map, cc, Mount::Facility);
    map.place_mine(
        TilePosition::new(2, 1),
        Mine::new(MineYield::Low, StorableResources::ZERO),
    )
    .unwrap();
    mounts.place(&mut map, TileRef::surface(2, 1), tube(ConnectorDir::Intersection));

    walk(&mut map, cc, &mounts);

    assert!(!map.is_connected(TileRef::surface(2, 1)));
}

#[test]
fn clearing_flags_then_walking_forgets_removed_links() {
    let mut map = TileMap::new(6, 6, 0).unwrap();
    let mut mounts = Mounts::default();
    let cc = TileRef::surface(1, 1);
    mounts.place(&mut map, cc, Mount::Facility);
    let t = TileRef::surface(2, 1);
    mounts.place(&mut map, t, tube(ConnectorDir::Intersection));
    walk(&mut map, cc, &mounts);
    assert!(map.is_connected(t));

    map.clear_structure(t);
    map.clear_connected();
    walk(&mut map, cc, &mounts);
    assert_eq!(map.connected_count(), 1);
}

#[test]
fn placement_validators_look_at_connected_neighbors() {
    let mut map = TileMap::new(6, 6, 0).unwrap();
    let mut mounts = Mounts::default();
    let cc = TileRef::surface(1, 1);
    mounts.place(&mut map, cc, Mount::Facility);
    mounts.place(&mut map, TileRef::surface(2, 1), tube(ConnectorDir::Intersection));
    walk(&mut map, cc, &mounts);

    assert!(valid_tube_connection(&map, &mounts, TileRef::surface(3, 1), ConnectorDir::Right));
    assert!(!valid_tube_connection(&map, &mounts, TileRef::surface(3, 1), ConnectorDir::Left));
    assert!(valid_structure_placement(&map, &mounts, TileRef::surface(2, 2)));
    // Next to the CC only: facilities do not mount on facilities.
    assert!(!valid_structure_placement(&map, &mounts, TileRef::surface(0, 1)));
}

//! Tube network reachability.
//!
//! [`walk`] floods outward from the command center tile and marks every tile
//! it can reach through compatible mounts. It always starts from a clean
//! slate: callers clear the connected flags first and the walk rebuilds them
//! in full.
//!
//! Adjacency rules:
//!
//! - Between depth levels only two air shafts link.
//! - On a level, two tubes link when both open along the step's axis.
//! - A tube and a facility link when the tube opens toward the facility.
//! - Two facilities never link directly.

use std::collections::VecDeque;

use tracing::debug;

use outpost_types::{ConnectorDir, Direction, StructureId, TileRef};

use crate::tile_map::TileMap;

/// How a structure presents itself to its neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mount {
    /// A building with a mounting face on every side.
    Facility,
    /// A tube segment with the given orientation.
    Connector(ConnectorDir),
}

/// Resolves a structure handle to its mount.
pub trait MountLookup {
    /// The mount of `id`, or `None` if the structure should not take part
    /// in the walk (unknown or destroyed).
    fn mount(&self, id: StructureId) -> Option<Mount>;
}

/// Whether a step in `direction` from a tile mounted as `from` may enter a
/// tile mounted as `to`.
pub const fn links(from: Mount, to: Mount, direction: Direction) -> bool {
    if direction.is_vertical() {
        return matches!(
            (from, to),
            (
                Mount::Connector(ConnectorDir::Vertical),
                Mount::Connector(ConnectorDir::Vertical)
            )
        );
    }
    let east_west = direction.is_east_west();
    match (from, to) {
        (Mount::Facility, Mount::Facility) => false,
        (Mount::Facility, Mount::Connector(dir)) | (Mount::Connector(dir), Mount::Facility) => {
            dir.opens_toward(east_west)
        }
        (Mount::Connector(a), Mount::Connector(b)) => {
            a.opens_toward(east_west) && b.opens_toward(east_west)
        }
    }
}

fn mount_at(map: &TileMap, lookup: &impl MountLookup, tile: TileRef) -> Option<Mount> {
    let t = map.tile(tile)?;
    if !t.excavated || t.has_mine() {
        return None;
    }
    t.structure.and_then(|id| lookup.mount(id))
}

/// Flood from `root`, marking reached tiles connected.
///
/// Returns the reached tiles in visit order, root first. The root is marked
/// even if it has no structure; an off-map root reaches nothing.
pub fn walk(map: &mut TileMap, root: TileRef, lookup: &impl MountLookup) -> Vec<TileRef> {
    let mut overlay = Vec::new();
    let Some(root_tile) = map.tile_mut(root) else {
        return overlay;
    };
    root_tile.connected = true;
    overlay.push(root);

    let mut queue = VecDeque::from([root]);
    while let Some(current) = queue.pop_front() {
        let Some(from) = mount_at(map, lookup, current) else {
            continue;
        };
        for direction in Direction::ALL {
            let Some(next) = current.step(direction) else {
                continue;
            };
            if map.is_connected(next) {
                continue;
            }
            let Some(to) = mount_at(map, lookup, next) else {
                continue;
            };
            if !links(from, to, direction) {
                continue;
            }
            if let Some(tile) = map.tile_mut(next) {
                tile.connected = true;
                overlay.push(next);
                queue.push_back(next);
            }
        }
    }
    debug!(%root, reached = overlay.len(), "Connectivity walk complete");
    overlay
}

/// Whether a tube with orientation `dir` placed on `tile` would join a
/// connected neighbor on the same level.
pub fn valid_tube_connection(
    map: &TileMap,
    lookup: &impl MountLookup,
    tile: TileRef,
    dir: ConnectorDir,
) -> bool {
    planar_neighbors(tile).any(|(direction, neighbor)| {
        map.is_connected(neighbor)
            && mount_at(map, lookup, neighbor)
                .is_some_and(|m| links(Mount::Connector(dir), m, direction))
    })
}

/// Whether a facility placed on `tile` would sit next to a connected tube
/// that opens toward it.
pub fn valid_structure_placement(map: &TileMap, lookup: &impl MountLookup, tile: TileRef) -> bool {
    planar_neighbors(tile).any(|(direction, neighbor)| {
        map.is_connected(neighbor)
            && mount_at(map, lookup, neighbor).is_some_and(|m| {
                matches!(m, Mount::Connector(_)) && links(Mount::Facility, m, direction)
            })
    })
}

fn planar_neighbors(tile: TileRef) -> impl Iterator<Item = (Direction, TileRef)> {
    Direction::ALL
        .into_iter()
        .filter(|d| !d.is_vertical())
        .filter_map(move |d| tile.step(d).map(|n| (d, n)))
}

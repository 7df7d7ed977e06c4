//! The layered tile grid.
//!
//! Tiles are stored in one flat vector, surface first, each level laid out
//! row by row. Every lookup goes through [`TileMap::index`], which returns
//! `None` for anything off the map, so no caller indexes the vector
//! directly.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use outpost_ledger::StorableResources;
use outpost_types::{MineYield, StructureId, TilePosition, TileRef};

use crate::error::WorldError;
use crate::mine::Mine;
use crate::tile::Tile;

/// Placement attempts per requested mine before giving up.
const SCATTER_ATTEMPTS_PER_MINE: u32 = 16;

/// A width x height surface with `max_depth` levels beneath it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileMap {
    width: u32,
    height: u32,
    max_depth: u32,
    tiles: Vec<Tile>,
}

impl TileMap {
    /// Build a fresh map.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDimensions`] if width or height is zero
    /// or the tile count does not fit in memory indexing.
    pub fn new(width: u32, height: u32, max_depth: u32) -> Result<Self, WorldError> {
        let invalid = || WorldError::InvalidDimensions {
            width,
            height,
            max_depth,
        };
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        let level = width.checked_mul(height).ok_or_else(invalid)?;
        let levels = max_depth.checked_add(1).ok_or_else(invalid)?;
        let count = usize::try_from(level.checked_mul(levels).ok_or_else(invalid)?)
            .map_err(|_e| invalid())?;
        let surface = usize::try_from(level).map_err(|_e| invalid())?;

        let mut tiles = Vec::with_capacity(count);
        tiles.resize(surface, Tile::surface());
        tiles.resize(count, Tile::underground());
        Ok(Self {
            width,
            height,
            max_depth,
            tiles,
        })
    }

    /// Columns.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Rows.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Deepest level.
    pub const fn max_depth(&self) -> u32 {
        self.max_depth
    }

    fn index(&self, tile: TileRef) -> Option<usize> {
        let x = u32::try_from(tile.position.x).ok()?;
        let y = u32::try_from(tile.position.y).ok()?;
        if x >= self.width || y >= self.height || tile.depth > self.max_depth {
            return None;
        }
        let level = self.width.checked_mul(self.height)?;
        let flat = tile
            .depth
            .checked_mul(level)?
            .checked_add(y.checked_mul(self.width)?)?
            .checked_add(x)?;
        usize::try_from(flat).ok()
    }

    /// Whether the tile lies on the map.
    pub fn contains(&self, tile: TileRef) -> bool {
        self.index(tile).is_some()
    }

    /// Borrow a tile.
    pub fn tile(&self, tile: TileRef) -> Option<&Tile> {
        self.index(tile).and_then(|i| self.tiles.get(i))
    }

    /// Mutably borrow a tile.
    pub fn tile_mut(&mut self, tile: TileRef) -> Option<&mut Tile> {
        self.index(tile).and_then(|i| self.tiles.get_mut(i))
    }

    /// Borrow a tile, failing if it is off the map.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`].
    pub fn get(&self, tile: TileRef) -> Result<&Tile, WorldError> {
        self.tile(tile).ok_or(WorldError::OutOfBounds(tile))
    }

    /// Mutably borrow a tile, failing if it is off the map.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`].
    pub fn get_mut(&mut self, tile: TileRef) -> Result<&mut Tile, WorldError> {
        self.tile_mut(tile).ok_or(WorldError::OutOfBounds(tile))
    }

    // -------------------------------------------------------------------
    // Robot effects
    // -------------------------------------------------------------------

    /// Clear debris from a tile.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`].
    pub fn bulldoze(&mut self, tile: TileRef) -> Result<(), WorldError> {
        self.get_mut(tile)?.bulldozed = true;
        Ok(())
    }

    /// Dig out an underground tile. Freshly dug tiles still need clearing.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`].
    pub fn excavate(&mut self, tile: TileRef) -> Result<(), WorldError> {
        let t = self.get_mut(tile)?;
        if !t.excavated {
            t.excavated = true;
            t.bulldozed = false;
        }
        Ok(())
    }

    // -------------------------------------------------------------------
    // Occupancy
    // -------------------------------------------------------------------

    /// Record a structure on a tile.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] or [`WorldError::TileOccupied`].
    pub fn set_structure(&mut self, tile: TileRef, id: StructureId) -> Result<(), WorldError> {
        let t = self.get_mut(tile)?;
        if let Some(occupant) = t.structure {
            return Err(WorldError::TileOccupied { tile, occupant });
        }
        t.structure = Some(id);
        Ok(())
    }

    /// Remove whatever structure sits on a tile, returning its handle.
    pub fn clear_structure(&mut self, tile: TileRef) -> Option<StructureId> {
        let t = self.tile_mut(tile)?;
        t.connected = false;
        t.structure.take()
    }

    /// Structure on a tile, if any.
    pub fn structure_at(&self, tile: TileRef) -> Option<StructureId> {
        self.tile(tile).and_then(|t| t.structure)
    }

    // -------------------------------------------------------------------
    // Mines
    // -------------------------------------------------------------------

    /// Place a deposit on a surface position.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] or [`WorldError::MineAlreadyPresent`].
    pub fn place_mine(&mut self, position: TilePosition, mine: Mine) -> Result<(), WorldError> {
        let t = self.get_mut(TileRef::new(position, 0))?;
        if t.mine.is_some() {
            return Err(WorldError::MineAlreadyPresent(position));
        }
        t.mine = Some(mine);
        Ok(())
    }

    /// Deposit at a surface position.
    pub fn mine(&self, position: TilePosition) -> Option<&Mine> {
        self.tile(TileRef::new(position, 0)).and_then(|t| t.mine.as_ref())
    }

    /// Mutable deposit at a surface position.
    pub fn mine_mut(&mut self, position: TilePosition) -> Option<&mut Mine> {
        self.tile_mut(TileRef::new(position, 0))
            .and_then(|t| t.mine.as_mut())
    }

    /// Surface positions holding a deposit, row-major.
    pub fn mine_positions(&self) -> Vec<TilePosition> {
        self.surface_positions()
            .filter(|p| self.mine(*p).is_some())
            .collect()
    }

    fn surface_positions(&self) -> impl Iterator<Item = TilePosition> + '_ {
        let height = i32::try_from(self.height).unwrap_or(i32::MAX);
        let width = i32::try_from(self.width).unwrap_or(i32::MAX);
        (0..height).flat_map(move |y| (0..width).map(move |x| TilePosition::new(x, y)))
    }

    /// Scatter up to `count` deposits on empty surface tiles, each with a
    /// random yield. `vein_for` supplies the ore one dug level holds for a
    /// given yield. Returns the positions used; fewer than `count` are placed
    /// if free tiles run out.
    pub fn scatter_mines(
        &mut self,
        count: u32,
        rng: &mut impl Rng,
        vein_for: impl Fn(MineYield) -> StorableResources,
    ) -> Vec<TilePosition> {
        let mut placed = Vec::new();
        let attempts = count.saturating_mul(SCATTER_ATTEMPTS_PER_MINE);
        for _ in 0..attempts {
            if u32::try_from(placed.len()).unwrap_or(u32::MAX) >= count {
                break;
            }
            let x = rng.random_range(0..self.width);
            let y = rng.random_range(0..self.height);
            let (Ok(x), Ok(y)) = (i32::try_from(x), i32::try_from(y)) else {
                continue;
            };
            let position = TilePosition::new(x, y);
            let free = self
                .tile(TileRef::new(position, 0))
                .is_some_and(|t| t.is_empty() && !t.has_mine());
            if !free {
                continue;
            }
            let richness = match rng.random_range(0..3_u8) {
                0 => MineYield::Low,
                1 => MineYield::Medium,
                _ => MineYield::High,
            };
            if self
                .place_mine(position, Mine::new(richness, vein_for(richness)))
                .is_ok()
            {
                debug!(%position, ?richness, "Mine placed");
                placed.push(position);
            }
        }
        info!(requested = count, placed = placed.len(), "Mines scattered");
        placed
    }

    // -------------------------------------------------------------------
    // Connectivity flags
    // -------------------------------------------------------------------

    /// Clear every tile's connected flag.
    pub fn clear_connected(&mut self) {
        for tile in &mut self.tiles {
            tile.connected = false;
        }
    }

    /// Whether the last walk reached the tile.
    pub fn is_connected(&self, tile: TileRef) -> bool {
        self.tile(tile).is_some_and(|t| t.connected)
    }

    /// Number of tiles the last walk reached.
    pub fn connected_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.connected).count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn zero_sized_map_is_rejected() {
        assert!(matches!(
            TileMap::new(0, 5, 1),
            Err(WorldError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn surface_and_underground_start_differently() {
        let map = TileMap::new(4, 4, 2).unwrap();
        let top = map.get(TileRef::surface(1, 1)).unwrap();
        assert!(top.excavated);
        assert!(!top.bulldozed);
        let below = map.get(TileRef::new(TilePosition::new(1, 1), 2)).unwrap();
        assert!(!below.excavated);
        assert!(below.bulldozed);
    }

    #[test]
    fn out_of_bounds_lookups_fail() {
        let map = TileMap::new(4, 4, 1).unwrap();
        assert!(map.tile(TileRef::surface(-1, 0)).is_none());
        assert!(map.tile(TileRef::surface(4, 0)).is_none());
        assert!(map.tile(TileRef::new(TilePosition::new(0, 0), 2)).is_none());
        assert!(matches!(
            map.get(TileRef::surface(0, 9)),
            Err(WorldError::OutOfBounds(_))
        ));
    }

    #[test]
    fn occupied_tile_rejects_second_structure() {
        let mut map = TileMap::new(4, 4, 0).unwrap();
        let tile = TileRef::surface(2, 2);
        map.set_structure(tile, StructureId::new(0, 0)).unwrap();
        let err = map.set_structure(tile, StructureId::new(1, 0)).unwrap_err();
        assert!(matches!(err, WorldError::TileOccupied { .. }));
        assert_eq!(map.clear_structure(tile), Some(StructureId::new(0, 0)));
        assert!(map.get(tile).unwrap().is_empty());
    }

    #[test]
    fn excavating_leaves_debris() {
        let mut map = TileMap::new(3, 3, 1).unwrap();
        let tile = TileRef::new(TilePosition::new(1, 1), 1);
        map.excavate(tile).unwrap();
        let t = map.get(tile).unwrap();
        assert!(t.excavated);
        assert!(!t.bulldozed);
    }

    #[test]
    fn scatter_is_deterministic_for_a_seed() {
        let vein = |_| StorableResources::uniform(50);
        let mut a = TileMap::new(16, 16, 2).unwrap();
        let mut b = TileMap::new(16, 16, 2).unwrap();
        let pa = a.scatter_mines(6, &mut StdRng::seed_from_u64(7), vein);
        let pb = b.scatter_mines(6, &mut StdRng::seed_from_u64(7), vein);
        assert_eq!(pa, pb);
        assert_eq!(pa.len(), 6);
        assert_eq!(a.mine_positions().len(), 6);
    }

    #[test]
    fn scatter_stops_when_map_is_full() {
        let mut map = TileMap::new(2, 1, 0).unwrap();
        let placed =
            map.scatter_mines(5, &mut StdRng::seed_from_u64(1), |_| StorableResources::ZERO);
        assert!(placed.len() <= 2);
    }
}

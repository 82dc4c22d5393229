//! Citymap: per-turn tile reservations for city placement.
//!
//! Every tile holds one integer. A positive value counts how many cities could
//! use the tile (its crowding), zero marks an unused tile and a negative value
//! is the negated id of the city or unit that has reserved it. Planners should
//! prefer tiles with low crowding and never take a tile with a negative value.
//!
//! The overlay is rebuilt from scratch at the start of every turn and is only
//! advisory: world changes made without a rebuild are not reflected.

use thiserror::Error;
use tracing::debug;

use crate::{
    map::{GameMap, TileIndex, CITY_MAP_DEFAULT_RADIUS_SQ},
    world::{EntityId, PlayerId, World},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CityMapError {
    #[error("tile {tile} is already reserved (citymap value {value})")]
    AlreadyReserved { tile: TileIndex, value: i32 },
}

/// Decoded overlay value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    Free,
    Crowded(u32),
    Owned(u32),
}

impl Reservation {
    pub fn from_raw(value: i32) -> Self {
        match value {
            0 => Reservation::Free,
            v if v > 0 => Reservation::Crowded(v as u32),
            v => Reservation::Owned(v.unsigned_abs()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CityMap {
    overlay: Vec<i32>,
}

impl CityMap {
    /// An uninitialized citymap, which reports every tile as reserved.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        !self.overlay.is_empty()
    }

    /// Reserves worked tiles and crowds city catchments for every player, then
    /// adds the founding targets of `current_player`'s settlers.
    ///
    /// When two claims land on the same tile the last one written wins.
    pub fn rebuild_for_turn(&mut self, world: &World, current_player: PlayerId) {
        let map = world.map();
        self.overlay = vec![0; map.len()];

        for player in world.players() {
            for city in world.cities_of(player.id) {
                let radius_sq = city.radius_sq.max(CITY_MAP_DEFAULT_RADIUS_SQ);
                for tile in map.tiles_within_sq_radius(city.tile, radius_sq) {
                    match map.tile_worked(tile) {
                        Some(worker) => self.overlay[tile] = worker.owner_mark(),
                        None => self.overlay[tile] += 1,
                    }
                }
            }
        }

        for unit in world.units_of(current_player) {
            let Some(target) = unit.founding_target() else {
                continue;
            };
            for tile in map.tiles_within_sq_radius(target, CITY_MAP_DEFAULT_RADIUS_SQ) {
                if self.overlay[tile] >= 0 {
                    self.overlay[tile] += 1;
                }
            }
            self.overlay[target] = unit.id.owner_mark();
        }
    }

    /// Reserves `tile` for a city or settler, dropping the owner's earlier
    /// reservations nearby and crowding the surrounding tiles.
    pub fn reserve_city_spot(
        &mut self,
        map: &GameMap,
        tile: TileIndex,
        owner: EntityId,
    ) -> Result<(), CityMapError> {
        let current = self.read(tile);
        debug!(owner = owner.raw(), tile, current, "reserving city spot");
        if current < 0 && current != owner.owner_mark() {
            return Err(CityMapError::AlreadyReserved {
                tile,
                value: current,
            });
        }

        let mark = owner.owner_mark();
        for near in map.tiles_within_sq_radius(tile, CITY_MAP_DEFAULT_RADIUS_SQ) {
            let value = &mut self.overlay[near];
            if *value == mark {
                *value = 0;
            }
            if *value >= 0 {
                *value += 1;
            }
        }
        self.overlay[tile] = mark;
        Ok(())
    }

    /// Reverses the reservations `owner` made around `tile`.
    pub fn free_city_spot(&mut self, map: &GameMap, tile: TileIndex, owner: EntityId) {
        self.check(tile);
        debug!(owner = owner.raw(), tile, "freeing city spot");
        let mark = owner.owner_mark();
        for near in map.tiles_within_sq_radius(tile, CITY_MAP_DEFAULT_RADIUS_SQ) {
            let value = &mut self.overlay[near];
            if *value == mark {
                *value = 0;
            } else if *value > 0 {
                *value -= 1;
            }
        }
    }

    /// Reserves one extra tile, e.g. the best food tile next to a planned city.
    pub fn reserve_tile(
        &mut self,
        map: &GameMap,
        tile: TileIndex,
        owner: EntityId,
    ) -> Result<(), CityMapError> {
        self.check(tile);
        if self.is_reserved(map, tile) {
            return Err(CityMapError::AlreadyReserved {
                tile,
                value: self.overlay[tile],
            });
        }
        self.overlay[tile] = owner.owner_mark();
        Ok(())
    }

    /// Raw overlay value: crowding when positive, negated owner id when negative.
    pub fn read(&self, tile: TileIndex) -> i32 {
        self.check(tile);
        self.overlay[tile]
    }

    pub fn claim(&self, tile: TileIndex) -> Reservation {
        Reservation::from_raw(self.read(tile))
    }

    /// A tile is reserved when a city works it or some city or unit has claimed it.
    pub fn is_reserved(&self, map: &GameMap, tile: TileIndex) -> bool {
        if map.tile_worked(tile).is_some() || self.overlay.is_empty() {
            return true;
        }
        self.read(tile) < 0
    }

    pub fn reserved_count(&self) -> usize {
        self.overlay.iter().filter(|value| **value < 0).count()
    }

    pub fn crowded_count(&self) -> usize {
        self.overlay.iter().filter(|value| **value > 0).count()
    }

    fn check(&self, tile: TileIndex) {
        assert!(
            self.is_initialized(),
            "citymap used before rebuild_for_turn"
        );
        assert!(
            tile < self.overlay.len(),
            "tile index {tile} out of range for citymap of {} tiles",
            self.overlay.len()
        );
    }
}

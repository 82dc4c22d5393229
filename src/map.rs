//! World map: tile indexing, terrain, continents and radius iteration.

use serde::Serialize;
use thiserror::Error;

use crate::world::EntityId;

pub type TileIndex = usize;

/// Squared radius every city works at minimum; settlers reserve this much around their target.
pub const CITY_MAP_DEFAULT_RADIUS_SQ: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TilePos {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Unknown,
    Ocean,
    DeepOcean,
    Lake,
    Grassland,
    Plains,
    Desert,
    Tundra,
    Forest,
    Jungle,
    Swamp,
    Hills,
    Mountains,
    Glacier,
}

impl Terrain {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        let terrain = match symbol {
            '?' => Terrain::Unknown,
            '.' | ' ' => Terrain::Ocean,
            ':' => Terrain::DeepOcean,
            '+' => Terrain::Lake,
            'g' => Terrain::Grassland,
            'p' => Terrain::Plains,
            'd' => Terrain::Desert,
            't' => Terrain::Tundra,
            'f' => Terrain::Forest,
            'j' => Terrain::Jungle,
            's' => Terrain::Swamp,
            'h' => Terrain::Hills,
            'm' => Terrain::Mountains,
            'a' => Terrain::Glacier,
            _ => return None,
        };
        Some(terrain)
    }

    pub fn is_water(self) -> bool {
        matches!(self, Terrain::Ocean | Terrain::DeepOcean | Terrain::Lake)
    }

    pub fn is_land(self) -> bool {
        self != Terrain::Unknown && !self.is_water()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Tile {
    pub terrain: Terrain,
    /// 0 for water and unknown tiles.
    pub continent: u16,
    pub worked_by: Option<EntityId>,
}

#[derive(Debug, Error)]
pub enum MapError {
    #[error("map must have at least one row and one column")]
    Empty,
    #[error("row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("unknown terrain symbol {symbol:?} at ({x}, {y})")]
    UnknownSymbol { symbol: char, x: usize, y: usize },
}

#[derive(Debug, Clone)]
pub struct GameMap {
    width: u32,
    height: u32,
    wrap_x: bool,
    tiles: Vec<Tile>,
    num_continents: u16,
}

impl GameMap {
    pub fn new(width: u32, height: u32, wrap_x: bool) -> Self {
        Self::filled(width, height, wrap_x, Terrain::Grassland)
    }

    pub fn filled(width: u32, height: u32, wrap_x: bool, terrain: Terrain) -> Self {
        let tiles = vec![
            Tile {
                terrain,
                continent: 0,
                worked_by: None,
            };
            (width as usize) * (height as usize)
        ];
        Self {
            width,
            height,
            wrap_x,
            tiles,
            num_continents: 0,
        }
    }

    /// Parses one terrain symbol per tile, one string per row, then numbers continents.
    pub fn from_rows<S: AsRef<str>>(rows: &[S], wrap_x: bool) -> Result<Self, MapError> {
        let width = rows
            .first()
            .map(|row| row.as_ref().chars().count())
            .unwrap_or(0);
        if width == 0 {
            return Err(MapError::Empty);
        }
        let mut tiles = Vec::with_capacity(width * rows.len());
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != width {
                return Err(MapError::RaggedRow {
                    row: y,
                    found,
                    expected: width,
                });
            }
            for (x, symbol) in row.chars().enumerate() {
                let terrain =
                    Terrain::from_symbol(symbol).ok_or(MapError::UnknownSymbol { symbol, x, y })?;
                tiles.push(Tile {
                    terrain,
                    continent: 0,
                    worked_by: None,
                });
            }
        }
        let mut map = Self {
            width: width as u32,
            height: rows.len() as u32,
            wrap_x,
            tiles,
            num_continents: 0,
        };
        map.assign_continents();
        Ok(map)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn wrap_x(&self) -> bool {
        self.wrap_x
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn num_continents(&self) -> u16 {
        self.num_continents
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn index_of(&self, pos: TilePos) -> Option<TileIndex> {
        if pos.x < self.width && pos.y < self.height {
            Some(pos.y as usize * self.width as usize + pos.x as usize)
        } else {
            None
        }
    }

    pub fn pos_of(&self, index: TileIndex) -> Option<TilePos> {
        if index < self.tiles.len() {
            Some(TilePos {
                x: (index % self.width as usize) as u32,
                y: (index / self.width as usize) as u32,
            })
        } else {
            None
        }
    }

    pub fn tile(&self, index: TileIndex) -> &Tile {
        self.check_index(index);
        &self.tiles[index]
    }

    pub fn tile_mut(&mut self, index: TileIndex) -> &mut Tile {
        self.check_index(index);
        &mut self.tiles[index]
    }

    pub fn tile_worked(&self, index: TileIndex) -> Option<EntityId> {
        self.tile(index).worked_by
    }

    pub fn set_terrain(&mut self, index: TileIndex, terrain: Terrain) {
        self.tile_mut(index).terrain = terrain;
    }

    /// Squared euclidean distance, measuring x the short way round on wrapping maps.
    pub fn sq_distance(&self, a: TileIndex, b: TileIndex) -> i32 {
        let (pa, pb) = (self.pos_unchecked(a), self.pos_unchecked(b));
        let mut dx = (pa.x as i32 - pb.x as i32).abs();
        if self.wrap_x {
            dx = dx.min(self.width as i32 - dx);
        }
        let dy = pa.y as i32 - pb.y as i32;
        dx * dx + dy * dy
    }

    /// Tiles within `radius_sq` of `center`, in row-major offset order, without duplicates.
    pub fn tiles_within_sq_radius(&self, center: TileIndex, radius_sq: i32) -> Vec<TileIndex> {
        let origin = self.pos_unchecked(center);
        let radius_sq = radius_sq.max(0);
        let reach = isqrt(radius_sq);
        let mut out = Vec::new();
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                if dx * dx + dy * dy > radius_sq {
                    continue;
                }
                let Some(index) = self.offset(origin, dx, dy) else {
                    continue;
                };
                if !out.contains(&index) {
                    out.push(index);
                }
            }
        }
        out
    }

    /// Numbers land masses 1..=n by 8-neighbour flood fill in index order.
    pub fn assign_continents(&mut self) {
        for tile in &mut self.tiles {
            tile.continent = 0;
        }
        let mut next = 0_u16;
        let mut stack = Vec::new();
        for start in 0..self.tiles.len() {
            if !self.tiles[start].terrain.is_land() || self.tiles[start].continent != 0 {
                continue;
            }
            next += 1;
            self.tiles[start].continent = next;
            stack.push(start);
            while let Some(index) = stack.pop() {
                let pos = self.pos_unchecked(index);
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let Some(neighbor) = self.offset(pos, dx, dy) else {
                            continue;
                        };
                        let tile = &mut self.tiles[neighbor];
                        if tile.terrain.is_land() && tile.continent == 0 {
                            tile.continent = next;
                            stack.push(neighbor);
                        }
                    }
                }
            }
        }
        self.num_continents = next;
    }

    fn offset(&self, origin: TilePos, dx: i32, dy: i32) -> Option<TileIndex> {
        let y = origin.y as i32 + dy;
        if y < 0 || y >= self.height as i32 {
            return None;
        }
        let mut x = origin.x as i32 + dx;
        if self.wrap_x {
            x = x.rem_euclid(self.width as i32);
        } else if x < 0 || x >= self.width as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    fn pos_unchecked(&self, index: TileIndex) -> TilePos {
        self.check_index(index);
        TilePos {
            x: (index % self.width as usize) as u32,
            y: (index / self.width as usize) as u32,
        }
    }

    fn check_index(&self, index: TileIndex) {
        assert!(
            index < self.tiles.len(),
            "tile index {index} out of range for map of {} tiles",
            self.tiles.len()
        );
    }
}

fn isqrt(value: i32) -> i32 {
    let mut root = 0;
    while (root + 1) * (root + 1) <= value {
        root += 1;
    }
    root
}

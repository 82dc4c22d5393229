use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    achievements::AchievementRegistry,
    citymap::CityMap,
    map::{GameMap, TileIndex},
};

/// Shared id space for cities and units. Never 0, so `-id` is always a reservation marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EntityId(u32);

impl EntityId {
    pub fn new(raw: u32) -> Self {
        assert!(raw != 0, "entity id 0 is reserved");
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    /// Overlay value marking a tile as reserved by this entity.
    pub fn owner_mark(self) -> i32 {
        -(self.0 as i32)
    }
}

/// Player slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PlayerId(u16);

impl PlayerId {
    pub fn new(slot: u16) -> Self {
        Self(slot)
    }

    pub fn raw(self) -> u16 {
        self.0
    }
}

/// Which side of the game is looking at the map; decides what counts as a known tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vantage {
    /// Per-player knowledge tracked by the server.
    #[default]
    Server,
    /// The client's own map, where unseen tiles have unknown terrain.
    Client,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceshipState {
    #[default]
    None,
    Started,
    Launched,
    Arrived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitTask {
    BuildCity,
    AutoWorker,
    Explore,
}

#[derive(Debug, Clone, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub nation: String,
    pub ai: bool,
    pub history: i32,
    pub history_per_turn: i32,
    pub huts: u32,
    pub literacy: i64,
    pub spaceship: SpaceshipState,
    pub(crate) known: Vec<bool>,
    pub(crate) cities: Vec<EntityId>,
    pub(crate) units: Vec<EntityId>,
}

impl Player {
    pub fn cities(&self) -> &[EntityId] {
        &self.cities
    }

    pub fn units(&self) -> &[EntityId] {
        &self.units
    }

    pub fn known_tile_count(&self) -> usize {
        self.known.iter().filter(|known| **known).count()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct City {
    pub id: EntityId,
    pub owner: PlayerId,
    pub name: String,
    pub tile: TileIndex,
    pub size: u32,
    pub radius_sq: i32,
    pub history: i32,
    pub history_per_turn: i32,
    pub performance: i32,
    /// Citizen counts by nationality.
    pub citizens: BTreeMap<PlayerId, u32>,
}

impl City {
    pub fn culture(&self) -> i32 {
        self.history + self.performance
    }

    /// Population in thousands.
    pub fn population(&self) -> i64 {
        let size = self.size as i64;
        size * (size + 1) * 5
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Unit {
    pub id: EntityId,
    pub owner: PlayerId,
    pub tile: TileIndex,
    pub city_founder: bool,
    pub task: Option<UnitTask>,
    pub goto: Option<TileIndex>,
}

impl Unit {
    /// A founder with an active build-city order and somewhere to go.
    pub fn founding_target(&self) -> Option<TileIndex> {
        if self.city_founder && self.task == Some(UnitTask::BuildCity) {
            self.goto
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub turn: u64,
    pub player: PlayerId,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("unknown player {0:?}")]
    UnknownPlayer(PlayerId),
    #[error("unknown city {0:?}")]
    UnknownCity(EntityId),
    #[error("tile {tile} is outside the map ({len} tiles)")]
    TileOutOfRange { tile: TileIndex, len: usize },
    #[error("tile {tile} is already worked by city {city:?}")]
    TileWorked { tile: TileIndex, city: EntityId },
    #[error("tile {tile} is outside the work radius of city {city:?}")]
    OutsideCityRadius { tile: TileIndex, city: EntityId },
}

#[derive(Debug, Serialize)]
pub struct PlayerSnapshot {
    pub id: u16,
    pub name: String,
    pub nation: String,
    pub history: i32,
    pub culture: i32,
    pub literacy: i64,
    pub huts: u32,
    pub known_tiles: usize,
    pub cities: usize,
    pub achievements: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AchievementSnapshot {
    pub id: u16,
    pub name: String,
    pub first: Option<u16>,
    pub achievers: Vec<u16>,
}

#[derive(Debug, Serialize)]
pub struct CityMapSnapshot {
    pub player: u16,
    pub reserved_tiles: usize,
    pub crowded_tiles: usize,
}

#[derive(Debug, Serialize)]
pub struct WorldSnapshot {
    pub scenario: String,
    pub turn: u64,
    pub players: Vec<PlayerSnapshot>,
    pub achievements: Vec<AchievementSnapshot>,
    pub citymaps: Vec<CityMapSnapshot>,
    pub notifications: Vec<Notification>,
}

#[derive(Debug)]
pub struct World {
    next_entity: u32,
    turn: u64,
    vantage: Vantage,
    map: GameMap,
    pub(crate) players: BTreeMap<PlayerId, Player>,
    pub(crate) cities: BTreeMap<EntityId, City>,
    pub(crate) units: BTreeMap<EntityId, Unit>,
    pub(crate) citymaps: BTreeMap<PlayerId, CityMap>,
    pub(crate) achievements: AchievementRegistry,
    pub(crate) notifications: Vec<Notification>,
}

impl World {
    pub fn new(map: GameMap) -> Self {
        Self {
            next_entity: 1,
            turn: 0,
            vantage: Vantage::Server,
            map,
            players: BTreeMap::new(),
            cities: BTreeMap::new(),
            units: BTreeMap::new(),
            citymaps: BTreeMap::new(),
            achievements: AchievementRegistry::default(),
            notifications: Vec::new(),
        }
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }

    /// Starts the next turn. Notifications only ever hold the current turn's messages.
    pub fn advance_turn(&mut self) {
        self.turn += 1;
        self.notifications.clear();
    }

    pub fn vantage(&self) -> Vantage {
        self.vantage
    }

    pub fn set_vantage(&mut self, vantage: Vantage) {
        self.vantage = vantage;
    }

    pub fn map(&self) -> &GameMap {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut GameMap {
        &mut self.map
    }

    pub fn add_player(&mut self, name: impl Into<String>, nation: impl Into<String>) -> PlayerId {
        let slot = u16::try_from(self.players.len())
            .unwrap_or_else(|_| panic!("player slots exhausted at {}", self.players.len()));
        let id = PlayerId(slot);
        self.players.insert(
            id,
            Player {
                id,
                name: name.into(),
                nation: nation.into(),
                ai: false,
                history: 0,
                history_per_turn: 0,
                huts: 0,
                literacy: 0,
                spaceship: SpaceshipState::None,
                known: vec![false; self.map.len()],
                cities: Vec::new(),
                units: Vec::new(),
            },
        );
        id
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn player_by_name(&self, name: &str) -> Option<PlayerId> {
        self.players
            .values()
            .find(|player| player.name == name)
            .map(|player| player.id)
    }

    /// Players in slot order; the order every per-player pass relies on.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.keys().copied().collect()
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Founds a city whose centre tile is worked by the city itself. Owners reveal the city radius.
    pub fn found_city(
        &mut self,
        owner: PlayerId,
        tile: TileIndex,
        name: impl Into<String>,
    ) -> Result<EntityId, WorldError> {
        self.check_tile(tile)?;
        if !self.players.contains_key(&owner) {
            return Err(WorldError::UnknownPlayer(owner));
        }
        if let Some(city) = self.map.tile_worked(tile) {
            return Err(WorldError::TileWorked { tile, city });
        }
        let id = self.allocate();
        let radius_sq = crate::map::CITY_MAP_DEFAULT_RADIUS_SQ;
        let mut citizens = BTreeMap::new();
        citizens.insert(owner, 1);
        self.cities.insert(
            id,
            City {
                id,
                owner,
                name: name.into(),
                tile,
                size: 1,
                radius_sq,
                history: 0,
                history_per_turn: 0,
                performance: 0,
                citizens,
            },
        );
        self.map.tile_mut(tile).worked_by = Some(id);
        if let Some(player) = self.players.get_mut(&owner) {
            player.cities.push(id);
        }
        self.reveal_around(owner, tile, radius_sq)?;
        Ok(id)
    }

    pub fn city(&self, id: EntityId) -> Option<&City> {
        self.cities.get(&id)
    }

    pub fn city_mut(&mut self, id: EntityId) -> Option<&mut City> {
        self.cities.get_mut(&id)
    }

    pub fn cities_of(&self, player: PlayerId) -> impl Iterator<Item = &City> {
        self.players
            .get(&player)
            .into_iter()
            .flat_map(|p| p.cities.iter())
            .filter_map(|id| self.cities.get(id))
    }

    /// Puts a worker from `city` on `tile`, which must lie in the city's work radius.
    pub fn assign_worker(&mut self, city: EntityId, tile: TileIndex) -> Result<(), WorldError> {
        self.check_tile(tile)?;
        let center = self
            .cities
            .get(&city)
            .map(|c| (c.tile, c.radius_sq))
            .ok_or(WorldError::UnknownCity(city))?;
        if self.map.sq_distance(center.0, tile) > center.1 {
            return Err(WorldError::OutsideCityRadius { tile, city });
        }
        match self.map.tile_worked(tile) {
            Some(other) if other != city => Err(WorldError::TileWorked { tile, city: other }),
            _ => {
                self.map.tile_mut(tile).worked_by = Some(city);
                Ok(())
            }
        }
    }

    pub fn release_worker(&mut self, tile: TileIndex) -> Result<(), WorldError> {
        self.check_tile(tile)?;
        self.map.tile_mut(tile).worked_by = None;
        Ok(())
    }

    pub fn spawn_unit(
        &mut self,
        owner: PlayerId,
        tile: TileIndex,
        city_founder: bool,
    ) -> Result<EntityId, WorldError> {
        self.check_tile(tile)?;
        if !self.players.contains_key(&owner) {
            return Err(WorldError::UnknownPlayer(owner));
        }
        let id = self.allocate();
        let player = self
            .players
            .get_mut(&owner)
            .ok_or(WorldError::UnknownPlayer(owner))?;
        player.units.push(id);
        player.known[tile] = true;
        self.units.insert(
            id,
            Unit {
                id,
                owner,
                tile,
                city_founder,
                task: None,
                goto: None,
            },
        );
        Ok(id)
    }

    pub fn unit(&self, id: EntityId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn unit_mut(&mut self, id: EntityId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    pub fn units_of(&self, player: PlayerId) -> impl Iterator<Item = &Unit> {
        self.players
            .get(&player)
            .into_iter()
            .flat_map(|p| p.units.iter())
            .filter_map(|id| self.units.get(id))
    }

    pub fn reveal(&mut self, player: PlayerId, tile: TileIndex) -> Result<(), WorldError> {
        self.check_tile(tile)?;
        let player = self
            .players
            .get_mut(&player)
            .ok_or(WorldError::UnknownPlayer(player))?;
        player.known[tile] = true;
        Ok(())
    }

    pub fn reveal_around(
        &mut self,
        player: PlayerId,
        center: TileIndex,
        radius_sq: i32,
    ) -> Result<(), WorldError> {
        self.check_tile(center)?;
        let tiles = self.map.tiles_within_sq_radius(center, radius_sq);
        let player = self
            .players
            .get_mut(&player)
            .ok_or(WorldError::UnknownPlayer(player))?;
        for tile in tiles {
            player.known[tile] = true;
        }
        Ok(())
    }

    pub fn reveal_all(&mut self, player: PlayerId) -> Result<(), WorldError> {
        let player = self
            .players
            .get_mut(&player)
            .ok_or(WorldError::UnknownPlayer(player))?;
        player.known.iter_mut().for_each(|known| *known = true);
        Ok(())
    }

    /// Whether `player` knows `tile` from the current vantage.
    pub fn is_tile_known(&self, player: &Player, tile: TileIndex) -> bool {
        match self.vantage {
            Vantage::Server => player.known.get(tile).copied().unwrap_or(false),
            Vantage::Client => self.map.tile(tile).terrain != crate::map::Terrain::Unknown,
        }
    }

    pub fn player_culture(&self, player: PlayerId) -> i32 {
        let history = self.players.get(&player).map(|p| p.history).unwrap_or(0);
        history + self.cities_of(player).map(City::culture).sum::<i32>()
    }

    /// Total population of the player's cities, in thousands.
    pub fn civ_population(&self, player: PlayerId) -> i64 {
        self.cities_of(player).map(City::population).sum()
    }

    pub fn literacy(&self, player: PlayerId) -> i64 {
        let accumulated = self.players.get(&player).map(|p| p.literacy).unwrap_or(0);
        crate::achievements::literacy_score(self.civ_population(player), accumulated)
    }

    pub fn award_history(&mut self, player: PlayerId, points: i32) {
        if let Some(player) = self.players.get_mut(&player) {
            player.history += points;
        }
    }

    pub fn notify(&mut self, player: PlayerId, message: impl Into<String>) {
        self.notifications.push(Notification {
            turn: self.turn,
            player,
            message: message.into(),
        });
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn achievements(&self) -> &AchievementRegistry {
        &self.achievements
    }

    pub fn achievements_mut(&mut self) -> &mut AchievementRegistry {
        &mut self.achievements
    }

    pub fn set_achievements(&mut self, registry: AchievementRegistry) {
        self.achievements = registry;
    }

    pub fn citymap(&self, player: PlayerId) -> Option<&CityMap> {
        self.citymaps.get(&player)
    }

    pub fn snapshot(&self, scenario: &str) -> WorldSnapshot {
        let players = self
            .players
            .values()
            .map(|player| PlayerSnapshot {
                id: player.id.raw(),
                name: player.name.clone(),
                nation: player.nation.clone(),
                history: player.history,
                culture: self.player_culture(player.id),
                literacy: self.literacy(player.id),
                huts: player.huts,
                known_tiles: player.known_tile_count(),
                cities: player.cities.len(),
                achievements: self
                    .achievements
                    .iter()
                    .filter(|ach| ach.has(player.id))
                    .map(|ach| ach.rule_name().to_string())
                    .collect(),
            })
            .collect();
        let achievements = self
            .achievements
            .iter()
            .map(|ach| AchievementSnapshot {
                id: ach.id().raw(),
                name: ach.rule_name().to_string(),
                first: ach.first().map(PlayerId::raw),
                achievers: ach.achievers().iter().map(|p| p.raw()).collect(),
            })
            .collect();
        let citymaps = self
            .citymaps
            .iter()
            .map(|(player, citymap)| CityMapSnapshot {
                player: player.raw(),
                reserved_tiles: citymap.reserved_count(),
                crowded_tiles: citymap.crowded_count(),
            })
            .collect();
        WorldSnapshot {
            scenario: scenario.to_string(),
            turn: self.turn,
            players,
            achievements,
            citymaps,
            notifications: self.notifications.clone(),
        }
    }

    /// Distinct nationalities living in the player's cities.
    pub fn nationalities(&self, player: PlayerId) -> BTreeSet<PlayerId> {
        self.cities_of(player)
            .flat_map(|city| {
                city.citizens
                    .iter()
                    .filter(|(_, count)| **count > 0)
                    .map(|(nationality, _)| *nationality)
            })
            .collect()
    }

    fn check_tile(&self, tile: TileIndex) -> Result<(), WorldError> {
        if tile < self.map.len() {
            Ok(())
        } else {
            Err(WorldError::TileOutOfRange {
                tile,
                len: self.map.len(),
            })
        }
    }

    fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        id
    }
}

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::{
    map::{GameMap, TileIndex, TilePos},
    ruleset::{self, RawAchievement},
    world::{PlayerId, SpaceshipState, UnitTask, Vantage, World},
};

fn default_snapshot_interval_turns() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_city_size() -> u32 {
    1
}

fn default_radius_sq() -> i32 {
    crate::map::CITY_MAP_DEFAULT_RADIUS_SQ
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    #[serde(default)]
    pub turns: Option<u64>,
    #[serde(default)]
    pub vantage: Vantage,
    #[serde(default = "default_snapshot_interval_turns")]
    pub snapshot_interval_turns: u64,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub map: ScenarioMap,
    /// Ruleset file with achievement definitions, relative to the loader's base dir.
    #[serde(default)]
    pub ruleset: Option<PathBuf>,
    /// Inline achievement definitions, used when no ruleset file is given.
    #[serde(default)]
    pub achievements: Vec<RawAchievement>,
    pub players: Vec<ScenarioPlayer>,
    #[serde(default)]
    pub cities: Vec<ScenarioCity>,
    #[serde(default)]
    pub units: Vec<ScenarioUnit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioMap {
    #[serde(default)]
    pub wrap_x: bool,
    pub rows: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevealRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioPlayer {
    pub name: String,
    pub nation: String,
    #[serde(default)]
    pub ai: bool,
    #[serde(default)]
    pub history: i32,
    #[serde(default)]
    pub history_per_turn: i32,
    #[serde(default)]
    pub huts: u32,
    #[serde(default)]
    pub literacy: i64,
    #[serde(default)]
    pub spaceship: SpaceshipState,
    #[serde(default)]
    pub reveal_all: bool,
    #[serde(default)]
    pub revealed: Vec<RevealRect>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioCity {
    pub name: String,
    pub owner: String,
    pub at: [u32; 2],
    #[serde(default = "default_city_size")]
    pub size: u32,
    #[serde(default = "default_radius_sq")]
    pub radius_sq: i32,
    #[serde(default)]
    pub history: i32,
    #[serde(default)]
    pub history_per_turn: i32,
    #[serde(default)]
    pub performance: i32,
    /// Citizen counts keyed by the name of the player whose nationality they hold.
    #[serde(default)]
    pub citizens: BTreeMap<String, u32>,
    #[serde(default)]
    pub worked: Vec<[u32; 2]>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioUnit {
    pub owner: String,
    pub at: [u32; 2],
    #[serde(default)]
    pub founder: bool,
    #[serde(default)]
    pub task: Option<UnitTask>,
    #[serde(default)]
    pub goto: Option<[u32; 2]>,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let mut scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        if let Some(ruleset) = scenario.ruleset.take() {
            scenario.ruleset = Some(self.base_dir.join(ruleset));
        }
        Ok(scenario)
    }
}

impl Scenario {
    pub fn build_world(&self) -> Result<World> {
        let map = GameMap::from_rows(&self.map.rows, self.map.wrap_x)
            .with_context(|| format!("Invalid map in scenario {}", self.name))?;
        let mut world = World::new(map);
        world.set_vantage(self.vantage);

        let registry = match &self.ruleset {
            Some(path) => {
                if !self.achievements.is_empty() {
                    bail!("scenario {} sets both a ruleset and inline achievements", self.name);
                }
                ruleset::load_achievements(path)
                    .with_context(|| format!("Failed to load ruleset {}", path.display()))?
            }
            None => ruleset::compile_achievements(self.achievements.clone())?,
        };
        world.set_achievements(registry);

        for entry in &self.players {
            if world.player_by_name(&entry.name).is_some() {
                bail!("player {} defined more than once", entry.name);
            }
            let id = world.add_player(entry.name.clone(), entry.nation.clone());
            if let Some(player) = world.player_mut(id) {
                player.ai = entry.ai;
                player.history = entry.history;
                player.history_per_turn = entry.history_per_turn;
                player.huts = entry.huts;
                player.literacy = entry.literacy;
                player.spaceship = entry.spaceship;
            }
            if entry.reveal_all {
                world.reveal_all(id)?;
            }
            for rect in &entry.revealed {
                for y in rect.y..rect.y.saturating_add(rect.height) {
                    for x in rect.x..rect.x.saturating_add(rect.width) {
                        let tile = tile_at(&world, [x, y])?;
                        world.reveal(id, tile)?;
                    }
                }
            }
        }

        for entry in &self.cities {
            let owner = self.player(&world, &entry.owner)?;
            let center = tile_at(&world, entry.at)?;
            let id = world
                .found_city(owner, center, entry.name.clone())
                .with_context(|| format!("Failed to found city {}", entry.name))?;
            let mut citizens = BTreeMap::new();
            for (nation_of, count) in &entry.citizens {
                citizens.insert(self.player(&world, nation_of)?, *count);
            }
            if let Some(city) = world.city_mut(id) {
                city.size = entry.size;
                city.radius_sq = entry.radius_sq;
                city.history = entry.history;
                city.history_per_turn = entry.history_per_turn;
                city.performance = entry.performance;
                if !citizens.is_empty() {
                    city.citizens = citizens;
                }
            }
            world.reveal_around(owner, center, entry.radius_sq)?;
            for pos in &entry.worked {
                let tile = tile_at(&world, *pos)?;
                world
                    .assign_worker(id, tile)
                    .with_context(|| format!("City {} cannot work {:?}", entry.name, pos))?;
            }
        }

        for entry in &self.units {
            let owner = self.player(&world, &entry.owner)?;
            let tile = tile_at(&world, entry.at)?;
            let goto = entry.goto.map(|pos| tile_at(&world, pos)).transpose()?;
            let id = world.spawn_unit(owner, tile, entry.founder)?;
            if let Some(unit) = world.unit_mut(id) {
                unit.task = entry.task;
                unit.goto = goto;
            }
        }

        Ok(world)
    }

    pub fn turns(&self, override_turns: Option<u64>) -> u64 {
        override_turns.or(self.turns).unwrap_or(50)
    }

    fn player(&self, world: &World, name: &str) -> Result<PlayerId> {
        world
            .player_by_name(name)
            .with_context(|| format!("scenario {} references unknown player {name}", self.name))
    }
}

fn tile_at(world: &World, [x, y]: [u32; 2]) -> Result<TileIndex> {
    world
        .map()
        .index_of(TilePos { x, y })
        .with_context(|| format!("position ({x}, {y}) is outside the map"))
}

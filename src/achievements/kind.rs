use std::fmt;

use rand::Rng;
use serde::Serialize;
use thiserror::Error;

use crate::world::{PlayerId, SpaceshipState, World};

/// One in `LUCKY_ROLL_RANGE` chance per point of value.
pub const LUCKY_ROLL_RANGE: i32 = 10_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AchievementError {
    #[error("illegal achievement type {0:?}")]
    UnknownKind(String),
}

/// Condition an achievement tests for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AchievementKind {
    Spaceship,
    MapKnown,
    Multicultural,
    CulturedCity,
    CulturedNation,
    Lucky,
    Huts,
    Metropolis,
    Literate,
    LandAhoy,
    /// A type this engine does not know; never achieved.
    Unknown(String),
}

impl AchievementKind {
    const RULE_NAMES: [(&'static str, AchievementKind); 10] = [
        ("Spaceship", AchievementKind::Spaceship),
        ("Map_Known", AchievementKind::MapKnown),
        ("Multicultural", AchievementKind::Multicultural),
        ("Cultured_City", AchievementKind::CulturedCity),
        ("Cultured_Nation", AchievementKind::CulturedNation),
        ("Lucky", AchievementKind::Lucky),
        ("Huts", AchievementKind::Huts),
        ("Metropolis", AchievementKind::Metropolis),
        ("Literate", AchievementKind::Literate),
        ("Land_Ahoy", AchievementKind::LandAhoy),
    ];

    pub fn from_rule_name(name: &str) -> Self {
        Self::RULE_NAMES
            .iter()
            .find(|(rule_name, _)| rule_name.eq_ignore_ascii_case(name))
            .map(|(_, kind)| kind.clone())
            .unwrap_or_else(|| AchievementKind::Unknown(name.to_string()))
    }

    pub fn rule_name(&self) -> &str {
        match self {
            AchievementKind::Unknown(name) => name,
            known => Self::RULE_NAMES
                .iter()
                .find(|(_, kind)| kind == known)
                .map(|(name, _)| *name)
                .unwrap_or("Unknown"),
        }
    }

    /// Tests whether `player` currently meets this condition with threshold `value`.
    ///
    /// `Lucky` draws from `rng` on every call.
    pub fn is_met<R: Rng + ?Sized>(
        &self,
        value: i32,
        world: &World,
        player: PlayerId,
        rng: &mut R,
    ) -> Result<bool, AchievementError> {
        let Some(plr) = world.player(player) else {
            return Ok(false);
        };
        let met = match self {
            AchievementKind::Spaceship => plr.spaceship == SpaceshipState::Launched,
            AchievementKind::MapKnown => map_known_reached(
                (0..world.map().len()).map(|tile| world.is_tile_known(plr, tile)),
                world.map().len(),
                value,
            ),
            AchievementKind::Multicultural => {
                let nationalities = world.nationalities(player);
                !nationalities.is_empty() && nationalities.len() as i64 >= value as i64
            }
            AchievementKind::CulturedCity => {
                world.cities_of(player).any(|city| city.culture() >= value)
            }
            AchievementKind::CulturedNation => world.player_culture(player) >= value,
            AchievementKind::Lucky => rng.gen_range(0..LUCKY_ROLL_RANGE) < value,
            AchievementKind::Huts => plr.huts as i64 >= value as i64,
            AchievementKind::Metropolis => world
                .cities_of(player)
                .any(|city| city.size as i64 >= value as i64),
            AchievementKind::Literate => world.literacy(player) >= value as i64,
            AchievementKind::LandAhoy => {
                // Fogged tiles count as the continent they belong to now, which
                // may differ from what the player saw last.
                let map = world.map();
                let mut seen = vec![false; map.num_continents() as usize];
                let mut count = 0_i64;
                let mut met = false;
                for (tile, data) in map.tiles().iter().enumerate() {
                    if data.continent == 0 || !world.is_tile_known(plr, tile) {
                        continue;
                    }
                    let slot = data.continent as usize - 1;
                    if seen[slot] {
                        continue;
                    }
                    count += 1;
                    if count >= value as i64 {
                        met = true;
                        break;
                    }
                    seen[slot] = true;
                }
                met
            }
            AchievementKind::Unknown(name) => {
                return Err(AchievementError::UnknownKind(name.clone()))
            }
        };
        Ok(met)
    }
}

impl fmt::Display for AchievementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rule_name())
    }
}

/// Whether at least `percent` of `total` tiles are known.
///
/// The unknown allowance is rounded down, so 25% of 50 tiles needs 13 known
/// tiles rather than 12. Stops as soon as either side settles the answer.
pub fn map_known_reached(known: impl IntoIterator<Item = bool>, total: usize, percent: i32) -> bool {
    let total = total as i64;
    let max_unknown = total * (100 - percent as i64) / 100;
    let required = total - max_unknown;
    let mut known_count = 0_i64;
    let mut unknown_count = 0_i64;
    for is_known in known {
        if is_known {
            known_count += 1;
            if known_count >= required {
                return true;
            }
        } else {
            unknown_count += 1;
            if unknown_count >= max_unknown {
                return false;
            }
        }
    }
    false
}

/// Literacy as a percentage of population; `population` in thousands.
pub fn literacy_score(population: i64, literacy: i64) -> i64 {
    if population <= 0 {
        0
    } else if population >= 10_000 {
        literacy / (population / 100)
    } else {
        (literacy * 100) / population
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::map::GameMap;

    #[test]
    fn test_rule_names_round_trip_case_insensitively() {
        assert_eq!(AchievementKind::from_rule_name("map_known"), AchievementKind::MapKnown);
        assert_eq!(AchievementKind::from_rule_name("LAND_AHOY"), AchievementKind::LandAhoy);
        assert_eq!(AchievementKind::CulturedCity.rule_name(), "Cultured_City");
        assert_eq!(
            AchievementKind::from_rule_name("Wonders"),
            AchievementKind::Unknown("Wonders".into())
        );
    }

    #[test]
    fn test_map_known_rounding() {
        let thirteen = (0..50).map(|i| i < 13);
        assert!(map_known_reached(thirteen, 50, 25));
        let twelve = (0..50).map(|i| i < 12);
        assert!(!map_known_reached(twelve, 50, 25));
    }

    #[test]
    fn test_map_known_exits_early() {
        // 37 unknown tiles up front settle the answer before any known tile is seen
        let tiles = (0..50).map(|i| i >= 37);
        assert!(!map_known_reached(tiles, 50, 25));
        assert!(map_known_reached(std::iter::repeat(true).take(10), 10, 100));
        assert!(!map_known_reached(std::iter::empty(), 0, 50));
    }

    #[test]
    fn test_literacy_formula() {
        assert_eq!(literacy_score(5_000, 10_000), 200);
        assert_eq!(literacy_score(0, 10_000), 0);
        assert_eq!(literacy_score(-3, 10_000), 0);
        assert_eq!(literacy_score(20_000, 4_000), 20);
        assert_eq!(literacy_score(12_345, 20_000), 162);
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        let mut world = World::new(GameMap::new(4, 4, false));
        let player = world.add_player("Ashoka", "indian");
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let kind = AchievementKind::Unknown("Wonders".into());
        assert_eq!(
            kind.is_met(1, &world, player, &mut rng),
            Err(AchievementError::UnknownKind("Wonders".into()))
        );
    }

    #[test]
    fn test_lucky_rerolls_each_call() {
        let mut world = World::new(GameMap::new(4, 4, false));
        let player = world.add_player("Ashoka", "indian");
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let hits = (0..2_000)
            .filter(|_| {
                AchievementKind::Lucky
                    .is_met(5_000, &world, player, &mut rng)
                    .unwrap()
            })
            .count();
        assert!((800..1_200).contains(&hits), "hits = {hits}");
        assert!(!AchievementKind::Lucky.is_met(0, &world, player, &mut rng).unwrap());
    }
}

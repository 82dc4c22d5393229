use civrules::{
    achievements::{
        literacy_score, Achievement, AchievementDefinition, AchievementId, AchievementKind,
        AchievementRegistry,
    },
    map::{GameMap, Terrain},
    world::{PlayerId, SpaceshipState, Vantage, World},
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn definition(kind: AchievementKind, value: i32, unique: bool) -> AchievementDefinition {
    AchievementDefinition {
        rule_name: kind.rule_name().to_string(),
        name: kind.rule_name().replace('_', " "),
        kind,
        value,
        unique,
        culture: 100,
        first_msg: "first".into(),
        later_msg: "later".into(),
    }
}

fn world_with_players(count: usize) -> (World, Vec<PlayerId>) {
    let mut world = World::new(GameMap::new(10, 5, false));
    let players = (0..count)
        .map(|i| world.add_player(format!("Leader {i}"), format!("nation {i}")))
        .collect();
    (world, players)
}

#[test]
fn map_known_rounds_the_unknown_allowance_down() {
    let (mut world, players) = world_with_players(1);
    let player = players[0];
    let ach = Achievement::new(
        AchievementId::new(0),
        definition(AchievementKind::MapKnown, 25, false),
    );
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    for tile in 0..12 {
        world.reveal(player, tile).unwrap();
    }
    assert!(!ach.check(&world, player, &mut rng));

    world.reveal(player, 12).unwrap();
    assert!(ach.check(&world, player, &mut rng));
}

#[test]
fn unique_achievement_has_a_single_holder() {
    let (mut world, players) = world_with_players(3);
    let mut ach = Achievement::new(
        AchievementId::new(0),
        definition(AchievementKind::Huts, 3, true),
    );
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    world.player_mut(players[1]).unwrap().huts = 3;
    assert_eq!(ach.evaluate_and_credit(&mut world, &mut rng), Some(players[1]));
    assert_eq!(world.player(players[1]).unwrap().history, 100);

    world.player_mut(players[0]).unwrap().huts = 10;
    world.player_mut(players[2]).unwrap().huts = 10;
    for _ in 0..5 {
        assert_eq!(ach.evaluate_and_credit(&mut world, &mut rng), None);
    }
    assert_eq!(ach.first(), Some(players[1]));
    assert_eq!(ach.achievers().len(), 1);
    assert_eq!(world.player(players[0]).unwrap().history, 0);
}

#[test]
fn shared_achievement_accumulates_achievers() {
    let (mut world, players) = world_with_players(3);
    let mut ach = Achievement::new(
        AchievementId::new(0),
        definition(AchievementKind::Huts, 2, false),
    );
    let mut rng = ChaCha8Rng::seed_from_u64(11);

    world.player_mut(players[2]).unwrap().huts = 2;
    let first = ach.evaluate(&mut world, &mut rng);
    assert_eq!(first.credited, Some(players[2]));

    world.player_mut(players[0]).unwrap().huts = 5;
    let later = ach.evaluate(&mut world, &mut rng);
    assert_eq!(later.credited, None);
    assert_eq!(later.achievers, vec![players[0]]);

    assert_eq!(ach.first(), Some(players[2]));
    assert!(ach.has(players[0]));
    assert!(!ach.has(players[1]));
    for player in [players[0], players[2]] {
        assert_eq!(world.player(player).unwrap().history, 100);
    }

    // Holders are never counted twice.
    assert!(ach.evaluate(&mut world, &mut rng).achievers.is_empty());
}

#[test]
fn simultaneous_achievers_are_credited_fairly() {
    const TRIALS: usize = 4_000;
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut wins = [0_usize; 4];

    for _ in 0..TRIALS {
        let (mut world, players) = world_with_players(4);
        for player in &players {
            world.player_mut(*player).unwrap().huts = 1;
        }
        let mut registry =
            AchievementRegistry::from_definitions([definition(AchievementKind::Huts, 1, true)]);
        let ach = registry.iter_mut().next().unwrap();
        let winner = ach.evaluate_and_credit(&mut world, &mut rng).unwrap();
        wins[winner.raw() as usize] += 1;
    }

    for count in wins {
        assert!((850..=1150).contains(&count), "wins: {wins:?}");
    }
}

#[test]
fn literacy_uses_population_in_thousands() {
    assert_eq!(literacy_score(0, 500), 0);
    assert_eq!(literacy_score(420, 420), 100);
    assert_eq!(literacy_score(9_999, 4_999), 49);
    assert_eq!(literacy_score(20_000, 20_000), 100);

    let (mut world, players) = world_with_players(1);
    let city = world.found_city(players[0], 0, "Athens").unwrap();
    world.city_mut(city).unwrap().size = 4;
    world.player_mut(players[0]).unwrap().literacy = 50;
    assert_eq!(world.civ_population(players[0]), 100);
    assert_eq!(world.literacy(players[0]), 50);
}

#[test]
fn unknown_kind_is_never_achieved() {
    let (mut world, players) = world_with_players(2);
    world.player_mut(players[0]).unwrap().huts = 99;
    let mut ach = Achievement::new(
        AchievementId::new(0),
        definition(AchievementKind::from_rule_name("Wonders"), 1, false),
    );
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    assert_eq!(ach.evaluate_and_credit(&mut world, &mut rng), None);
    assert!(ach.achievers().is_empty());
}

/// Four single-tile islands on a 5x3 ocean.
fn archipelago() -> (World, PlayerId, PlayerId) {
    let rows = ["g.g.g", ".....", "g...."];
    let mut world = World::new(GameMap::from_rows(&rows, false).unwrap());
    let a = world.add_player("Kamehameha", "hawaiian");
    let b = world.add_player("Tupaia", "tahitian");
    (world, a, b)
}

fn met(kind: AchievementKind, value: i32, world: &World, player: PlayerId) -> bool {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    kind.is_met(value, world, player, &mut rng).unwrap()
}

#[test]
fn spaceship_counts_only_once_launched() {
    let (mut world, a, _) = archipelago();
    world.player_mut(a).unwrap().spaceship = SpaceshipState::Started;
    assert!(!met(AchievementKind::Spaceship, 1, &world, a));
    world.player_mut(a).unwrap().spaceship = SpaceshipState::Launched;
    assert!(met(AchievementKind::Spaceship, 1, &world, a));
}

#[test]
fn multicultural_counts_each_nationality_once() {
    let (mut world, a, b) = archipelago();
    let first = world.found_city(a, 0, "Hilo").unwrap();
    let second = world.found_city(a, 2, "Lahaina").unwrap();
    world.city_mut(first).unwrap().citizens = [(a, 2), (b, 1)].into_iter().collect();
    world.city_mut(second).unwrap().citizens = [(b, 3)].into_iter().collect();

    assert!(met(AchievementKind::Multicultural, 2, &world, a));
    assert!(!met(AchievementKind::Multicultural, 3, &world, a));
    assert!(!met(AchievementKind::Multicultural, 1, &world, b));
}

#[test]
fn metropolis_and_cultured_city_compare_inclusively() {
    let (mut world, a, _) = archipelago();
    let city = world.found_city(a, 4, "Kona").unwrap();
    {
        let city = world.city_mut(city).unwrap();
        city.size = 7;
        city.history = 10;
        city.performance = 5;
    }

    assert!(met(AchievementKind::Metropolis, 7, &world, a));
    assert!(!met(AchievementKind::Metropolis, 8, &world, a));
    assert!(met(AchievementKind::CulturedCity, 15, &world, a));
    assert!(!met(AchievementKind::CulturedCity, 16, &world, a));
}

#[test]
fn cultured_nation_adds_player_history_to_city_culture() {
    let (mut world, a, _) = archipelago();
    let city = world.found_city(a, 10, "Honolulu").unwrap();
    world.city_mut(city).unwrap().history = 9;
    world.award_history(a, 6);

    assert!(met(AchievementKind::CulturedNation, 15, &world, a));
    assert!(!met(AchievementKind::CulturedNation, 16, &world, a));
}

#[test]
fn land_ahoy_counts_known_continents() {
    let (mut world, a, _) = archipelago();
    assert_eq!(world.map().num_continents(), 4);
    for tile in [0, 1, 2, 4] {
        world.reveal(a, tile).unwrap();
    }
    assert!(met(AchievementKind::LandAhoy, 3, &world, a));
    assert!(!met(AchievementKind::LandAhoy, 4, &world, a));
}

#[test]
fn client_vantage_reads_unknown_terrain() {
    let (mut world, a, _) = archipelago();
    world.set_vantage(Vantage::Client);

    assert!(met(AchievementKind::LandAhoy, 4, &world, a));
    assert!(met(AchievementKind::MapKnown, 100, &world, a));

    world.map_mut().set_terrain(10, Terrain::Unknown);
    assert!(!met(AchievementKind::LandAhoy, 4, &world, a));
    assert!(met(AchievementKind::LandAhoy, 3, &world, a));

    world.map_mut().set_terrain(10, Terrain::Grassland);
    world.map_mut().set_terrain(14, Terrain::Unknown);
    assert!(!met(AchievementKind::MapKnown, 100, &world, a));
    // 15 tiles at 90% need 14 known, all of which come before the unknown one.
    assert!(met(AchievementKind::MapKnown, 90, &world, a));
}

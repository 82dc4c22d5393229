use std::path::Path;

use civrules::{
    engine::{Engine, EngineBuilder, EngineSettings},
    scenario::{Scenario, ScenarioLoader},
    systems::{AchievementSystem, CitymapSystem, CultureSystem},
    world::World,
};
use tempfile::tempdir;

fn load() -> Scenario {
    ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
        .load("scenarios/two_rivers.yaml")
        .expect("scenario should load")
}

fn engine(scenario: &Scenario, snapshot_dir: &Path, interval: u64) -> Engine {
    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_turns: interval,
        snapshot_dir: snapshot_dir.to_path_buf(),
    };
    EngineBuilder::new(settings)
        .with_system(CultureSystem::new())
        .with_system(CitymapSystem::new())
        .with_system(AchievementSystem::new())
        .build()
}

fn first_holder(world: &World, rule_name: &str) -> Option<String> {
    let ach = world.achievements().by_rule_name(rule_name)?;
    ach.first()
        .and_then(|id| world.player(id))
        .map(|player| player.name.clone())
}

#[test]
fn fixture_loads_with_its_ruleset() {
    let scenario = load();
    let world = scenario.build_world().expect("world builds");
    assert_eq!(world.map().num_continents(), 4);
    assert_eq!(world.achievements().len(), 10);
    assert_eq!(world.players().count(), 3);
    assert!(world.achievements().iter().all(|ach| !ach.claimed()));
}

#[test]
fn engine_runs_hook_each_turn() {
    let scenario = load();
    let mut world = scenario.build_world().unwrap();
    let temp = tempdir().expect("tempdir");
    let mut engine = engine(&scenario, temp.path(), 0);

    let mut turns = Vec::new();
    engine
        .run_with_hook(&mut world, 6, |snapshot| turns.push(snapshot.turn))
        .expect("run succeeds");

    assert_eq!(turns, vec![1, 2, 3, 4, 5, 6]);
    assert!(std::fs::read_dir(temp.path()).unwrap().next().is_none());
}

#[test]
fn achievements_are_claimed_over_the_run() {
    let scenario = load();
    let mut world = scenario.build_world().unwrap();
    let temp = tempdir().unwrap();
    let mut engine = engine(&scenario, temp.path(), 0);

    engine.run(&mut world, 1).unwrap();
    assert_eq!(first_holder(&world, "Hut_Hunter").as_deref(), Some("Ramesses"));
    assert_eq!(first_holder(&world, "Entire_Map_Known").as_deref(), Some("Cyrus"));
    assert_eq!(first_holder(&world, "Literate").as_deref(), Some("Hammurabi"));
    assert_eq!(first_holder(&world, "Multicultural").as_deref(), Some("Hammurabi"));
    assert_eq!(first_holder(&world, "Cultured_City"), None);

    let land_ahoy = world.achievements().by_rule_name("Land_Ahoy").unwrap();
    assert_eq!(land_ahoy.achievers().len(), 2);
    let ramesses = world.player_by_name("Ramesses").unwrap();
    assert!(!land_ahoy.has(ramesses));

    engine.run(&mut world, 5).unwrap();
    assert_eq!(world.turn(), 6);
    assert_eq!(first_holder(&world, "Cultured_City").as_deref(), Some("Cyrus"));
    assert_eq!(first_holder(&world, "Metropolis"), None);
}

#[test]
fn ai_players_get_citymaps_with_settler_targets() {
    let scenario = load();
    let mut world = scenario.build_world().unwrap();
    let temp = tempdir().unwrap();
    engine(&scenario, temp.path(), 0).run(&mut world, 1).unwrap();

    let hammurabi = world.player_by_name("Hammurabi").unwrap();
    let cyrus = world.player_by_name("Cyrus").unwrap();
    let ramesses = world.player_by_name("Ramesses").unwrap();
    assert!(world.citymap(ramesses).is_none());

    let own_settler = world.units_of(hammurabi).next().unwrap();
    let target = own_settler.founding_target().unwrap();
    let citymap = world.citymap(hammurabi).unwrap();
    assert_eq!(citymap.read(target), own_settler.id.owner_mark());

    let rival_target = world.units_of(cyrus).find_map(|u| u.founding_target()).unwrap();
    assert!(citymap.read(rival_target) > 0);
    assert!(world.citymap(cyrus).unwrap().read(rival_target) < 0);
}

#[test]
fn same_seed_replays_identically() {
    let scenario = load();
    let temp = tempdir().unwrap();
    let mut runs = Vec::new();
    for _ in 0..2 {
        let mut world = scenario.build_world().unwrap();
        let mut history = Vec::new();
        engine(&scenario, temp.path(), 0)
            .run_with_hook(&mut world, 20, |snapshot| {
                history.push(serde_json::to_value(snapshot).unwrap())
            })
            .unwrap();
        runs.push(history);
    }
    assert_eq!(runs[0], runs[1]);
}

#[test]
fn snapshots_are_written_on_interval() {
    let scenario = load();
    let mut world = scenario.build_world().unwrap();
    let temp = tempdir().unwrap();
    engine(&scenario, temp.path(), 5).run(&mut world, 12).unwrap();

    let dir = temp.path().join("two_rivers");
    let mut names: Vec<_> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["turn_000005.json", "turn_000010.json"]);

    let text = std::fs::read_to_string(dir.join("turn_000010.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["turn"], 10);
    assert_eq!(json["scenario"], "two_rivers");
    assert!(json["written_at"].is_string());
}

#[test]
fn notification_log_keeps_only_the_current_turn() {
    let scenario = load();
    let mut world = scenario.build_world().unwrap();
    let temp = tempdir().unwrap();
    let mut engine = engine(&scenario, temp.path(), 0);

    engine.run(&mut world, 1).unwrap();
    assert!(!world.notifications().is_empty());
    assert!(world.notifications().iter().all(|n| n.turn == 1));

    let mut logged = Vec::new();
    engine
        .run_with_hook(&mut world, 10, |snapshot| {
            assert!(snapshot.notifications.iter().all(|n| n.turn == snapshot.turn));
            logged.push(snapshot.notifications.len());
        })
        .unwrap();
    assert_eq!(logged.len(), 10);
    assert!(world.notifications().iter().all(|n| n.turn == 11));
}

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use civrules::{
    engine::{EngineBuilder, EngineSettings},
    scenario::ScenarioLoader,
    systems::{AchievementSystem, CitymapSystem, CultureSystem},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Runs a scenario through the turn loop")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/two_rivers.yaml")]
    scenario: PathBuf,

    /// Override turn count (uses scenario default when omitted)
    #[arg(long)]
    turns: Option<u64>,

    /// Override snapshot interval in turns
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Log at debug level regardless of the scenario setting
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&scenario.logging.level))
    };
    fmt().with_env_filter(filter).with_target(false).init();

    let mut world = scenario.build_world()?;
    let turns = scenario.turns(cli.turns);
    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_turns: cli
            .snapshot_interval
            .unwrap_or(scenario.snapshot_interval_turns),
        snapshot_dir: cli
            .snapshot_dir
            .unwrap_or_else(|| PathBuf::from("snapshots")),
    };

    let mut engine = EngineBuilder::new(settings)
        .with_system(CultureSystem::new())
        .with_system(CitymapSystem::new())
        .with_system(AchievementSystem::new())
        .build();
    engine.run(&mut world, turns)?;

    println!("Scenario '{}' completed after {} turns.", scenario.name, turns);
    for ach in world.achievements().iter() {
        let first = ach
            .first()
            .and_then(|id| world.player(id))
            .map(|player| player.name.as_str())
            .unwrap_or("-");
        println!(
            "  {:<24} first: {:<16} achievers: {}",
            ach.name_translation(),
            first,
            ach.achievers().len()
        );
    }
    Ok(())
}

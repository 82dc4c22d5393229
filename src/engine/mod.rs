use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use crate::{
    rng::{RngManager, StreamRng},
    snapshot::SnapshotWriter,
    world::{World, WorldSnapshot},
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
    pub snapshot_interval_turns: u64,
    pub snapshot_dir: PathBuf,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            snapshot_writer: SnapshotWriter::new(
                &self.settings.snapshot_dir,
                self.settings.snapshot_interval_turns,
            ),
            settings: self.settings,
        }
    }
}

/// Runs the registered systems in order, once per turn.
pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    snapshot_writer: SnapshotWriter,
    settings: EngineSettings,
}

impl Engine {
    pub fn run(&mut self, world: &mut World, turns: u64) -> Result<()> {
        for _ in 0..turns {
            self.step(world)?;
        }
        Ok(())
    }

    /// Like [`Engine::run`], handing the end-of-turn snapshot to `hook` after every turn.
    pub fn run_with_hook<F>(&mut self, world: &mut World, turns: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(&WorldSnapshot),
    {
        for _ in 0..turns {
            self.step(world)?;
            hook(&world.snapshot(&self.settings.scenario_name));
        }
        Ok(())
    }

    fn step(&mut self, world: &mut World) -> Result<()> {
        world.advance_turn();
        let ctx = TurnContext {
            turn: world.turn(),
            scenario_name: &self.settings.scenario_name,
        };
        debug!(turn = ctx.turn, "turn start");
        for system in &mut self.systems {
            let mut rng_stream = self.rng.stream(system.name());
            system
                .run(&ctx, world, &mut rng_stream)
                .with_context(|| format!("system {} failed on turn {}", system.name(), ctx.turn))?;
        }
        self.snapshot_writer
            .maybe_write(world, &self.settings.scenario_name)?;
        Ok(())
    }
}

pub struct TurnContext<'a> {
    pub turn: u64,
    pub scenario_name: &'a str,
}

pub trait System {
    fn name(&self) -> &str;
    fn run(&mut self, ctx: &TurnContext, world: &mut World, rng: &mut StreamRng<'_>)
        -> Result<()>;
}

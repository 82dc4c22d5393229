use anyhow::Result;
use tracing::info;

use crate::{
    engine::{System, TurnContext},
    rng::StreamRng,
    world::World,
};

/// Evaluates every achievement once per turn and tells players what they earned.
pub struct AchievementSystem;

impl AchievementSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AchievementSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for AchievementSystem {
    fn name(&self) -> &str {
        "achievements"
    }

    fn run(
        &mut self,
        ctx: &TurnContext,
        world: &mut World,
        rng: &mut StreamRng<'_>,
    ) -> Result<()> {
        let mut registry = std::mem::take(&mut world.achievements);
        for ach in registry.iter_mut() {
            let evaluation = ach.evaluate(world, rng);
            if let Some(first) = evaluation.credited {
                info!(
                    turn = ctx.turn,
                    achievement = ach.rule_name(),
                    player = first.raw(),
                    "achievement claimed"
                );
                world.notify(first, ach.first_msg());
            }
            for player in evaluation.achievers {
                if Some(player) == evaluation.credited || !ach.has(player) {
                    continue;
                }
                world.notify(player, ach.later_msg());
            }
        }
        world.achievements = registry;
        Ok(())
    }
}

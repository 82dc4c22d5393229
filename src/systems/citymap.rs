use anyhow::Result;
use tracing::debug;

use crate::{
    engine::{System, TurnContext},
    rng::StreamRng,
    world::World,
};

/// Rebuilds every AI player's citymap at the start of the turn.
pub struct CitymapSystem;

impl CitymapSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CitymapSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for CitymapSystem {
    fn name(&self) -> &str {
        "citymap"
    }

    fn run(
        &mut self,
        ctx: &TurnContext,
        world: &mut World,
        _rng: &mut StreamRng<'_>,
    ) -> Result<()> {
        let ai_players: Vec<_> = world
            .players()
            .filter(|player| player.ai)
            .map(|player| player.id)
            .collect();
        for player in ai_players {
            let mut citymap = world.citymaps.remove(&player).unwrap_or_default();
            citymap.rebuild_for_turn(world, player);
            debug!(
                turn = ctx.turn,
                player = player.raw(),
                reserved = citymap.reserved_count(),
                crowded = citymap.crowded_count(),
                "citymap rebuilt"
            );
            world.citymaps.insert(player, citymap);
        }
        Ok(())
    }
}

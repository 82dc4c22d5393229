use anyhow::Result;

use crate::{
    engine::{System, TurnContext},
    rng::StreamRng,
    world::World,
};

/// Accrues per-turn history for every city and player.
pub struct CultureSystem;

impl CultureSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CultureSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for CultureSystem {
    fn name(&self) -> &str {
        "culture"
    }

    fn run(
        &mut self,
        _ctx: &TurnContext,
        world: &mut World,
        _rng: &mut StreamRng<'_>,
    ) -> Result<()> {
        for city in world.cities.values_mut() {
            city.history += city.history_per_turn;
        }
        for player in world.players.values_mut() {
            player.history += player.history_per_turn;
        }
        Ok(())
    }
}

//! Achievements: per-player goals evaluated once per turn.
//!
//! An achievement is unclaimed until some player meets its condition. Unique
//! achievements then belong to that one player for good; shared ones keep
//! accepting new achievers every pass, while remembering who got there first.

mod kind;
mod registry;

use std::collections::BTreeSet;

use rand::Rng;
use serde::Serialize;
use tracing::error;

pub use kind::{
    literacy_score, map_known_reached, AchievementError, AchievementKind, LUCKY_ROLL_RANGE,
};
pub use registry::{AchievementRegistry, MAX_ACHIEVEMENT_TYPES};

use crate::world::{PlayerId, World};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AchievementId(u16);

impl AchievementId {
    pub fn new(raw: u16) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u16 {
        self.0
    }
}

/// Static description of an achievement, as a ruleset provides it.
#[derive(Debug, Clone)]
pub struct AchievementDefinition {
    pub rule_name: String,
    pub name: String,
    pub kind: AchievementKind,
    pub value: i32,
    pub unique: bool,
    pub culture: i32,
    pub first_msg: String,
    pub later_msg: String,
}

/// Outcome of one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Player credited as first achiever in this pass.
    pub credited: Option<PlayerId>,
    /// Every player that newly met the condition in this pass.
    pub achievers: Vec<PlayerId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Achievement {
    id: AchievementId,
    rule_name: String,
    name: String,
    kind: AchievementKind,
    value: i32,
    unique: bool,
    culture: i32,
    first: Option<PlayerId>,
    achievers: BTreeSet<PlayerId>,
    first_msg: String,
    later_msg: String,
}

impl Achievement {
    pub fn new(id: AchievementId, definition: AchievementDefinition) -> Self {
        Self {
            id,
            rule_name: definition.rule_name,
            name: definition.name,
            kind: definition.kind,
            value: definition.value,
            unique: definition.unique,
            culture: definition.culture,
            first: None,
            achievers: BTreeSet::new(),
            first_msg: definition.first_msg,
            later_msg: definition.later_msg,
        }
    }

    pub fn id(&self) -> AchievementId {
        self.id
    }

    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    pub fn name_translation(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &AchievementKind {
        &self.kind
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn unique(&self) -> bool {
        self.unique
    }

    pub fn culture(&self) -> i32 {
        self.culture
    }

    pub fn first(&self) -> Option<PlayerId> {
        self.first
    }

    pub fn achievers(&self) -> &BTreeSet<PlayerId> {
        &self.achievers
    }

    /// Message for the player credited first.
    pub fn first_msg(&self) -> &str {
        &self.first_msg
    }

    /// Message for players reaching it after the first.
    pub fn later_msg(&self) -> &str {
        &self.later_msg
    }

    pub fn has(&self, player: PlayerId) -> bool {
        self.achievers.contains(&player)
    }

    pub fn claimed(&self) -> bool {
        self.first.is_some()
    }

    /// Whether `player` newly meets the condition. Players who already hold the
    /// achievement, and everyone once a unique one is claimed, never do.
    pub fn check<R: Rng + ?Sized>(&self, world: &World, player: PlayerId, rng: &mut R) -> bool {
        if (self.unique && self.first.is_some()) || self.has(player) {
            return false;
        }
        match self.kind.is_met(self.value, world, player, rng) {
            Ok(met) => met,
            Err(err) => {
                error!(achievement = %self.rule_name, "{err}");
                false
            }
        }
    }

    /// Runs one pass over every player in slot order and credits a first
    /// achiever when the achievement is still unclaimed.
    ///
    /// Shared achievements mark and reward every qualifying player at once.
    /// Among simultaneous qualifiers the first achiever is drawn uniformly
    /// from `rng`; for unique achievements only that player is rewarded.
    pub fn evaluate<R: Rng + ?Sized>(&mut self, world: &mut World, rng: &mut R) -> Evaluation {
        let mut achievers = Vec::new();
        for player in world.player_ids() {
            if !self.check(world, player, rng) {
                continue;
            }
            if !self.unique {
                world.award_history(player, self.culture);
                self.achievers.insert(player);
            }
            achievers.push(player);
        }

        if self.first.is_some() || achievers.is_empty() {
            return Evaluation {
                credited: None,
                achievers,
            };
        }

        let credited = achievers[rng.gen_range(0..achievers.len())];
        self.first = Some(credited);
        if self.unique {
            world.award_history(credited, self.culture);
        }
        self.achievers.insert(credited);
        Evaluation {
            credited: Some(credited),
            achievers,
        }
    }

    pub fn evaluate_and_credit<R: Rng + ?Sized>(
        &mut self,
        world: &mut World,
        rng: &mut R,
    ) -> Option<PlayerId> {
        self.evaluate(world, rng).credited
    }
}

use std::collections::BTreeMap;
use std::ops::Index;

use super::{Achievement, AchievementDefinition, AchievementId};

pub const MAX_ACHIEVEMENT_TYPES: usize = 40;

/// All achievements of a game, keyed by id in ruleset order.
#[derive(Debug, Clone, Default)]
pub struct AchievementRegistry {
    entries: BTreeMap<AchievementId, Achievement>,
}

impl AchievementRegistry {
    /// Assigns ids 0.. in the order given. Callers must keep the list within
    /// [`MAX_ACHIEVEMENT_TYPES`].
    pub fn from_definitions(definitions: impl IntoIterator<Item = AchievementDefinition>) -> Self {
        let entries = definitions
            .into_iter()
            .enumerate()
            .map(|(index, definition)| {
                let id = AchievementId::new(index as u16);
                (id, Achievement::new(id, definition))
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<AchievementId> {
        self.entries.keys().copied().collect()
    }

    pub fn get(&self, id: AchievementId) -> Option<&Achievement> {
        self.entries.get(&id)
    }

    pub fn by_rule_name(&self, name: &str) -> Option<&Achievement> {
        self.entries
            .values()
            .find(|ach| ach.rule_name().eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Achievement> {
        self.entries.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Achievement> {
        self.entries.values_mut()
    }
}

impl Index<AchievementId> for AchievementRegistry {
    type Output = Achievement;

    fn index(&self, id: AchievementId) -> &Achievement {
        self.entries
            .get(&id)
            .unwrap_or_else(|| panic!("achievement id {} out of range", id.raw()))
    }
}

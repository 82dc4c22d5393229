//! Achievement definitions loaded from ruleset YAML.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::achievements::{
    AchievementDefinition, AchievementKind, AchievementRegistry, MAX_ACHIEVEMENT_TYPES,
};

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("achievement {0:?} defined more than once")]
    Duplicate(String),
    #[error("{found} achievement types defined, at most {max} allowed")]
    TooMany { found: usize, max: usize },
}

fn default_value() -> i32 {
    1
}

fn default_unique() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAchievement {
    pub name: String,
    #[serde(default)]
    pub rule_name: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_value")]
    pub value: i32,
    #[serde(default = "default_unique")]
    pub unique: bool,
    /// History points for achievers; `value` when omitted.
    #[serde(default)]
    pub culture: Option<i32>,
    #[serde(default)]
    pub first_msg: Option<String>,
    #[serde(default)]
    pub cons_msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRuleset {
    #[serde(default)]
    achievements: Vec<RawAchievement>,
}

pub fn load_achievements(path: impl AsRef<Path>) -> Result<AchievementRegistry, RulesError> {
    let text = std::fs::read_to_string(path)?;
    parse_achievements(&text)
}

pub fn parse_achievements(yaml: &str) -> Result<AchievementRegistry, RulesError> {
    let raw: RawRuleset = serde_yaml::from_str(yaml)?;
    compile_achievements(raw.achievements)
}

pub fn compile_achievements(raw: Vec<RawAchievement>) -> Result<AchievementRegistry, RulesError> {
    if raw.len() > MAX_ACHIEVEMENT_TYPES {
        return Err(RulesError::TooMany {
            found: raw.len(),
            max: MAX_ACHIEVEMENT_TYPES,
        });
    }
    let mut seen = BTreeSet::new();
    let mut definitions = Vec::with_capacity(raw.len());
    for entry in raw {
        let rule_name = entry.rule_name.unwrap_or_else(|| entry.name.clone());
        if !seen.insert(rule_name.to_ascii_lowercase()) {
            return Err(RulesError::Duplicate(rule_name));
        }
        let kind = AchievementKind::from_rule_name(&entry.kind);
        if let AchievementKind::Unknown(name) = &kind {
            warn!(achievement = %rule_name, kind = %name, "unknown achievement type, it can never be achieved");
        }
        definitions.push(AchievementDefinition {
            first_msg: entry
                .first_msg
                .unwrap_or_else(|| format!("You are the first to achieve {}!", entry.name)),
            later_msg: entry
                .cons_msg
                .unwrap_or_else(|| format!("You have achieved {}.", entry.name)),
            culture: entry.culture.unwrap_or(entry.value),
            rule_name,
            name: entry.name,
            kind,
            value: entry.value,
            unique: entry.unique,
        });
    }
    Ok(AchievementRegistry::from_definitions(definitions))
}

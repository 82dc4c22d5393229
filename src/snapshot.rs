use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::world::{World, WorldSnapshot};

#[derive(Serialize)]
struct SnapshotFile<'a> {
    written_at: DateTime<Utc>,
    #[serde(flatten)]
    world: &'a WorldSnapshot,
}

/// Writes `<dir>/<scenario>/turn_NNNNNN.json` every `interval_turns` turns; 0 disables.
pub struct SnapshotWriter {
    dir: PathBuf,
    interval_turns: u64,
}

impl SnapshotWriter {
    pub fn new(dir: impl AsRef<Path>, interval_turns: u64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            interval_turns,
        }
    }

    pub fn maybe_write(&self, world: &World, scenario: &str) -> Result<Option<PathBuf>> {
        if self.interval_turns == 0 || world.turn() % self.interval_turns != 0 {
            return Ok(None);
        }
        let dir = self.dir.join(scenario);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create snapshot dir {}", dir.display()))?;
        let path = dir.join(format!("turn_{:06}.json", world.turn()));
        let snapshot = world.snapshot(scenario);
        let file = SnapshotFile {
            written_at: Utc::now(),
            world: &snapshot,
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        Ok(Some(path))
    }
}

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use wumpus_logic::ResolutionConfig;

use crate::{
    error::WorldError,
    grid::{Grid, Position},
    percept::ObjectKind,
};

/// What the stepwise explorer does when no unvisited neighbour is provably safe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// Step into an unproven neighbour anyway. The agent may die.
    #[default]
    RiskyNeighbor,
    /// Stop exploring and report that no safe move exists.
    Halt,
}

/// `[explorer]` table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerSection {
    /// Policy applied when the safe frontier is empty.
    #[serde(default)]
    pub fallback: FallbackPolicy,
}

/// Episode configuration: grid, fixed objects, and engine limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeConfig {
    /// Edge length of the square grid.
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,
    /// Cell the agent starts on.
    #[serde(default = "default_agent_start")]
    pub agent_start: Position,
    /// Fixed wumpus cell, if any.
    #[serde(default)]
    pub wumpus: Option<Position>,
    /// Fixed gold cell, if any.
    #[serde(default)]
    pub gold: Option<Position>,
    /// Fixed pit cells.
    #[serde(default)]
    pub pits: Vec<Position>,
    /// Pit count used when the layout is randomized.
    #[serde(default = "default_random_pits")]
    pub random_pits: usize,
    /// Seed for randomized layouts; entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Step cap for stepwise episodes.
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Resolution limits.
    #[serde(default)]
    pub resolution: ResolutionConfig,
    /// Explorer options.
    #[serde(default)]
    pub explorer: ExplorerSection,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self::new(default_grid_size())
    }
}

impl EpisodeConfig {
    /// Empty layout on a `grid_size` grid with default limits.
    #[must_use]
    pub fn new(grid_size: usize) -> Self {
        Self {
            grid_size,
            agent_start: default_agent_start(),
            wumpus: None,
            gold: None,
            pits: Vec::new(),
            random_pits: default_random_pits(),
            seed: None,
            max_steps: default_max_steps(),
            resolution: ResolutionConfig::default(),
            explorer: ExplorerSection::default(),
        }
    }

    /// Loads and validates a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading episode config {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the start cell.
    #[must_use]
    pub fn with_start(mut self, position: Position) -> Self {
        self.agent_start = position;
        self
    }

    /// Places the wumpus.
    #[must_use]
    pub fn with_wumpus(mut self, position: Position) -> Self {
        self.wumpus = Some(position);
        self
    }

    /// Places the gold.
    #[must_use]
    pub fn with_gold(mut self, position: Position) -> Self {
        self.gold = Some(position);
        self
    }

    /// Adds a pit.
    #[must_use]
    pub fn with_pit(mut self, position: Position) -> Self {
        self.pits.push(position);
        self
    }

    /// Fixes the layout seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the explorer fallback policy.
    #[must_use]
    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.explorer.fallback = fallback;
        self
    }

    /// Sets the resolution limits.
    #[must_use]
    pub fn with_resolution(mut self, resolution: ResolutionConfig) -> Self {
        self.resolution = resolution;
        self
    }

    /// Fixed objects with their kinds, agent start first.
    #[must_use]
    pub fn placements(&self) -> Vec<(ObjectKind, Position)> {
        let mut placed = vec![(ObjectKind::Agent, self.agent_start)];
        placed.extend(self.wumpus.map(|pos| (ObjectKind::Wumpus, pos)));
        placed.extend(self.gold.map(|pos| (ObjectKind::Gold, pos)));
        placed.extend(self.pits.iter().map(|pos| (ObjectKind::Pit, *pos)));
        placed
    }

    /// Checks bounds, overlaps and limits, returning the grid on success.
    pub fn validate(&self) -> Result<Grid, WorldError> {
        let grid = Grid::new(self.grid_size)?;
        let placed = self.placements();
        for (idx, (kind, position)) in placed.iter().enumerate() {
            grid.check(*position)?;
            if let Some((other, _)) = placed[..idx].iter().find(|(_, pos)| pos == position) {
                return Err(WorldError::OverlappingObjects {
                    first: other.to_string(),
                    second: kind.to_string(),
                    position: *position,
                });
            }
        }
        if self.random_pits + 3 > grid.cell_count() {
            return Err(WorldError::InvalidConfig(format!(
                "{} random pits do not fit a {}x{} grid",
                self.random_pits, self.grid_size, self.grid_size
            )));
        }
        if self.max_steps == 0 {
            return Err(WorldError::InvalidConfig("max_steps must be positive".into()));
        }
        if self.resolution.max_rounds == 0 || self.resolution.max_clauses == 0 {
            return Err(WorldError::InvalidConfig(
                "resolution limits must be positive".into(),
            ));
        }
        Ok(grid)
    }
}

const fn default_grid_size() -> usize {
    4
}

const fn default_agent_start() -> Position {
    Position::new(0, 0)
}

const fn default_random_pits() -> usize {
    2
}

const fn default_max_steps() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn loads_toml_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("episode.toml");
        fs::write(
            &path,
            r#"
grid_size = 5
wumpus = [2, 2]
gold = [4, 4]
pits = [[1, 3], [3, 1]]

[resolution]
max_clauses = 5000

[explorer]
fallback = "halt"
"#,
        )
        .unwrap();
        let config = EpisodeConfig::load(&path).unwrap();
        assert_eq!(config.grid_size, 5);
        assert_eq!(config.agent_start, Position::new(0, 0));
        assert_eq!(config.gold, Some(Position::new(4, 4)));
        assert_eq!(config.pits.len(), 2);
        assert_eq!(config.resolution.max_clauses, 5000);
        assert_eq!(config.resolution.max_rounds, 64);
        assert_eq!(config.explorer.fallback, FallbackPolicy::Halt);
        assert_eq!(config.max_steps, 64);
    }

    #[test]
    fn rejects_overlapping_objects() {
        let config = EpisodeConfig::new(4)
            .with_wumpus(Position::new(2, 2))
            .with_pit(Position::new(2, 2));
        assert_eq!(
            config.validate(),
            Err(WorldError::OverlappingObjects {
                first: "wumpus".into(),
                second: "pit".into(),
                position: Position::new(2, 2),
            })
        );
        let on_start = EpisodeConfig::new(4).with_gold(Position::new(0, 0));
        assert!(matches!(
            on_start.validate(),
            Err(WorldError::OverlappingObjects { .. })
        ));
    }

    #[test]
    fn rejects_out_of_bounds_and_bad_sizes() {
        let config = EpisodeConfig::new(4).with_gold(Position::new(4, 0));
        assert!(matches!(
            config.validate(),
            Err(WorldError::InvalidPosition { .. })
        ));
        assert_eq!(
            EpisodeConfig::new(0).validate(),
            Err(WorldError::InvalidGridSize(0))
        );
        let crowded = EpisodeConfig {
            random_pits: 14,
            ..EpisodeConfig::new(4)
        };
        assert!(matches!(
            crowded.validate(),
            Err(WorldError::InvalidConfig(_))
        ));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(EpisodeConfig::from_toml_str("grid_size = \"big\"").is_err());
        assert!(EpisodeConfig::from_toml_str("grid_size = 1").is_err());
    }
}

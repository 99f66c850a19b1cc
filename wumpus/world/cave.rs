use std::collections::BTreeSet;

use rand::{rngs::SmallRng, seq::SliceRandom, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{
    config::EpisodeConfig,
    error::WorldError,
    grid::{Direction, Grid, Position},
    percept::{Hazard, ObjectKind, Percept},
};

/// Object placement of one cave.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldLayout {
    /// Wumpus cell.
    pub wumpus: Option<Position>,
    /// Gold cell.
    pub gold: Option<Position>,
    /// Pit cells.
    pub pits: Vec<Position>,
}

impl WorldLayout {
    /// Fixed placements from a configuration.
    #[must_use]
    pub fn from_config(config: &EpisodeConfig) -> Self {
        Self {
            wumpus: config.wumpus,
            gold: config.gold,
            pits: config.pits.clone(),
        }
    }

    /// Hazard on `position`, pits taking precedence.
    #[must_use]
    pub fn hazard_at(&self, position: Position) -> Option<Hazard> {
        if self.pits.contains(&position) {
            Some(Hazard::Pit)
        } else if self.wumpus == Some(position) {
            Some(Hazard::Wumpus)
        } else {
            None
        }
    }

    /// Every placed object as a fact the translator can record.
    #[must_use]
    pub fn facts(&self) -> Vec<(ObjectKind, Position)> {
        let mut facts = Vec::with_capacity(self.pits.len() + 2);
        facts.extend(self.wumpus.map(|pos| (ObjectKind::Wumpus, pos)));
        facts.extend(self.gold.map(|pos| (ObjectKind::Gold, pos)));
        facts.extend(self.pits.iter().map(|pos| (ObjectKind::Pit, *pos)));
        facts
    }

    /// Hazardous cells, pits first.
    #[must_use]
    pub fn hazard_cells(&self) -> Vec<Position> {
        self.pits.iter().copied().chain(self.wumpus).collect()
    }

    fn occupied(&self, start: Position) -> BTreeSet<Position> {
        let mut taken: BTreeSet<Position> = self.pits.iter().copied().collect();
        taken.insert(start);
        taken.extend(self.wumpus);
        taken.extend(self.gold);
        taken
    }
}

/// Result of trying to move one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    /// Cell after the attempt; unchanged on a bump.
    pub position: Position,
    /// Reading on that cell, with `bump` set when the wall was hit.
    pub percept: Percept,
}

/// Ground truth the agent cannot see directly.
#[derive(Debug, Clone)]
pub struct Cave {
    grid: Grid,
    start: Position,
    layout: WorldLayout,
}

impl Cave {
    /// Cave with exactly the configured placements.
    pub fn new(config: &EpisodeConfig) -> Result<Self, WorldError> {
        let grid = config.validate()?;
        Ok(Self {
            grid,
            start: config.agent_start,
            layout: WorldLayout::from_config(config),
        })
    }

    /// Keeps configured placements and fills the rest at random: the wumpus and
    /// gold when absent, and `random_pits` pits when no pit is configured.
    pub fn randomized(config: &EpisodeConfig, rng: &mut impl Rng) -> Result<Self, WorldError> {
        let mut cave = Self::new(config)?;
        if cave.layout.wumpus.is_none() {
            cave.layout.wumpus = cave.random_free_cell(rng);
        }
        if cave.layout.gold.is_none() {
            cave.layout.gold = cave.random_free_cell(rng);
        }
        if cave.layout.pits.is_empty() {
            for _ in 0..config.random_pits {
                if let Some(pit) = cave.random_free_cell(rng) {
                    cave.layout.pits.push(pit);
                }
            }
        }
        Ok(cave)
    }

    /// [`Cave::randomized`] driven by the configured seed, or entropy.
    pub fn seeded(config: &EpisodeConfig) -> Result<Self, WorldError> {
        let mut rng = config
            .seed
            .map_or_else(SmallRng::from_entropy, SmallRng::seed_from_u64);
        Self::randomized(config, &mut rng)
    }

    fn random_free_cell(&self, rng: &mut impl Rng) -> Option<Position> {
        let taken = self.layout.occupied(self.start);
        let free: Vec<Position> = self
            .grid
            .cells()
            .filter(|cell| !taken.contains(cell))
            .collect();
        free.choose(rng).copied()
    }

    /// Grid bounds.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Agent start cell.
    #[must_use]
    pub const fn start(&self) -> Position {
        self.start
    }

    /// Object placement.
    #[must_use]
    pub const fn layout(&self) -> &WorldLayout {
        &self.layout
    }

    /// Hazard on a cell.
    #[must_use]
    pub fn hazard_at(&self, position: Position) -> Option<Hazard> {
        self.layout.hazard_at(position)
    }

    /// Sensor reading on `position`. `bump` is always false here.
    #[must_use]
    pub fn sense(&self, position: Position) -> Percept {
        let mut percept = Percept::quiet();
        for neighbour in self.grid.adjacent(position) {
            percept.stench |= self.layout.wumpus == Some(neighbour);
            percept.breeze |= self.layout.pits.contains(&neighbour);
        }
        percept.glitter = self.layout.gold == Some(position);
        percept
    }

    /// Moves one step if the target is inside the grid, otherwise bumps.
    #[must_use]
    pub fn attempt_move(&self, from: Position, direction: Direction) -> MoveOutcome {
        let target = direction.step(from);
        if self.grid.contains(target) {
            MoveOutcome {
                position: target,
                percept: self.sense(target),
            }
        } else {
            MoveOutcome {
                position: from,
                percept: Percept {
                    bump: true,
                    ..self.sense(from)
                },
            }
        }
    }
}

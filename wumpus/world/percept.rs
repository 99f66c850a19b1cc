use std::fmt;

use serde::{Deserialize, Serialize};
use wumpus_logic::Predicate;

/// Sensor reading taken on one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Percept {
    /// The wumpus is on an orthogonal neighbour.
    pub stench: bool,
    /// A pit is on an orthogonal neighbour.
    pub breeze: bool,
    /// The gold is on this cell.
    pub glitter: bool,
    /// The last move hit the grid boundary.
    pub bump: bool,
}

impl Percept {
    /// A reading with no cue at all.
    #[must_use]
    pub fn quiet() -> Self {
        Self::default()
    }

    /// True when neither hazard cue is present.
    #[must_use]
    pub const fn is_calm(&self) -> bool {
        !self.stench && !self.breeze
    }
}

/// Objects the surrounding layer can place or reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// The wumpus.
    Wumpus,
    /// A pit.
    Pit,
    /// The gold.
    Gold,
    /// The agent itself.
    Agent,
}

impl ObjectKind {
    /// Predicate used for the ground fact of this object.
    #[must_use]
    pub const fn predicate(self) -> Predicate {
        match self {
            Self::Wumpus => Predicate::Wumpus,
            Self::Pit => Predicate::Pit,
            Self::Gold => Predicate::Gold,
            Self::Agent => Predicate::Agent,
        }
    }

    /// Whether entering a cell holding this object kills the agent.
    #[must_use]
    pub const fn hazard(self) -> Option<Hazard> {
        match self {
            Self::Wumpus => Some(Hazard::Wumpus),
            Self::Pit => Some(Hazard::Pit),
            Self::Gold | Self::Agent => None,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Wumpus => "wumpus",
            Self::Pit => "pit",
            Self::Gold => "gold",
            Self::Agent => "agent start",
        })
    }
}

/// Deadly cell contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hazard {
    /// Falling into a pit.
    Pit,
    /// Meeting the wumpus.
    Wumpus,
}

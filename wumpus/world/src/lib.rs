#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rust_2018_idioms,
    missing_docs
)]

//! Wumpus world model: grid geometry, percepts, the hidden cave, and the
//! bridge from observations to propositional knowledge.

/// Telemetry builder for episode components.
#[path = "../telemetry.rs"]
pub mod telemetry;

/// Error taxonomy for world-facing calls.
#[path = "../error.rs"]
pub mod error;

/// Positions, directions and grid bounds.
#[path = "../grid.rs"]
pub mod grid;

/// Percepts and placed object kinds.
#[path = "../percept.rs"]
pub mod percept;

/// Episode configuration loaded from TOML.
#[path = "../config.rs"]
pub mod config;

/// Ground-truth cave the agent explores.
#[path = "../cave.rs"]
pub mod cave;

/// Domain axioms grounded over the grid.
#[path = "../axioms.rs"]
pub mod axioms;

/// Percept-to-clause translation.
#[path = "../translator.rs"]
pub mod translator;

/// Safety and reachability queries.
#[path = "../oracle.rs"]
pub mod oracle;

/// Episode aggregate owning knowledge and agent state.
#[path = "../episode.rs"]
pub mod episode;

pub use cave::{Cave, MoveOutcome, WorldLayout};
pub use config::{EpisodeConfig, ExplorerSection, FallbackPolicy};
pub use episode::{AgentState, Episode};
pub use error::WorldError;
pub use grid::{Direction, Grid, Position};
pub use oracle::Oracle;
pub use percept::{Hazard, ObjectKind, Percept};
pub use telemetry::{WorldTelemetry, WorldTelemetryBuilder};
pub use translator::Translator;

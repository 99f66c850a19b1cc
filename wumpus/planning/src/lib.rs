#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Safety-restricted frontier search and the stepwise episode loop built on
//! top of the wumpus world model.

/// Breadth-first explorer, actions and explorer states.
#[path = "../explorer.rs"]
pub mod explorer;

/// Perceive, decide and act loop against a hidden cave.
#[path = "../runner.rs"]
pub mod runner;

/// Batch runs over randomized caves.
#[path = "../bench.rs"]
pub mod bench;

pub use bench::{run_benchmark, BenchmarkSummary};
pub use explorer::{Action, CancelToken, Explorer, ExplorerState, PathOutcome};
pub use runner::{EpisodeOutcome, EpisodeReport, EpisodeRunner};

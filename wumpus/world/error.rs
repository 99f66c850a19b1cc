use thiserror::Error;

use crate::grid::Position;

/// Errors raised by world-facing calls. Configuration variants are fatal for
/// the episode; `InvalidPosition` rejects a single call without side effects.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// The position lies outside `[0, grid_size)` on some axis.
    #[error("position {position} is outside the {grid_size}x{grid_size} grid")]
    InvalidPosition {
        /// Rejected position.
        position: Position,
        /// Edge length of the grid.
        grid_size: usize,
    },
    /// The grid size is unusable.
    #[error("grid size {0} is not supported (expected 2..=32)")]
    InvalidGridSize(usize),
    /// Two fixed objects share a cell.
    #[error("{first} and {second} both occupy {position}")]
    OverlappingObjects {
        /// First object label.
        first: String,
        /// Second object label.
        second: String,
        /// Shared cell.
        position: Position,
    },
    /// Any other malformed configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Hazard facts were recorded after the layout was declared complete.
    #[error("layout already sealed; hazard facts can no longer change")]
    LayoutSealed,
}

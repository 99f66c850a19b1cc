use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Largest supported grid edge.
pub const MAX_GRID_SIZE: usize = 32;

/// Integer cell coordinates. `y` grows downward, as on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(i32, i32)", into = "(i32, i32)")]
pub struct Position {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Position {
    /// Creates a position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Position {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl From<Position> for (i32, i32) {
    fn from(position: Position) -> Self {
        (position.x, position.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Grid-aligned move directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// `y + 1`.
    Down,
    /// `x + 1`.
    Right,
    /// `y - 1`.
    Up,
    /// `x - 1`.
    Left,
}

impl Direction {
    /// Neighbour order used everywhere: down, right, up, left.
    pub const ALL: [Self; 4] = [Self::Down, Self::Right, Self::Up, Self::Left];

    /// Coordinate delta of one step.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::Down => (0, 1),
            Self::Right => (1, 0),
            Self::Up => (0, -1),
            Self::Left => (-1, 0),
        }
    }

    /// Cell one step away, ignoring bounds.
    #[must_use]
    pub const fn step(self, from: Position) -> Position {
        let (dx, dy) = self.offset();
        Position::new(from.x + dx, from.y + dy)
    }

    /// Direction leading from `from` to an orthogonal neighbour `to`.
    #[must_use]
    pub fn between(from: Position, to: Position) -> Option<Self> {
        Self::ALL.into_iter().find(|dir| dir.step(from) == to)
    }
}

/// Square grid bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    size: usize,
}

impl Grid {
    /// Creates a `size x size` grid.
    pub fn new(size: usize) -> Result<Self, WorldError> {
        if !(2..=MAX_GRID_SIZE).contains(&size) {
            return Err(WorldError::InvalidGridSize(size));
        }
        Ok(Self { size })
    }

    /// Edge length.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Whether both coordinates lie in `[0, size)`.
    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        let bound = i32::try_from(self.size).unwrap_or(i32::MAX);
        (0..bound).contains(&position.x) && (0..bound).contains(&position.y)
    }

    /// Rejects out-of-bounds positions.
    pub fn check(&self, position: Position) -> Result<Position, WorldError> {
        if self.contains(position) {
            Ok(position)
        } else {
            Err(WorldError::InvalidPosition {
                position,
                grid_size: self.size,
            })
        }
    }

    /// In-bounds orthogonal neighbours in [`Direction::ALL`] order.
    pub fn adjacent(&self, position: Position) -> impl Iterator<Item = Position> + '_ {
        Direction::ALL
            .into_iter()
            .map(move |dir| dir.step(position))
            .filter(|next| self.contains(*next))
    }

    /// Every cell, column by column.
    pub fn cells(&self) -> impl Iterator<Item = Position> {
        let size = i32::try_from(self.size).unwrap_or(i32::MAX);
        (0..size).flat_map(move |x| (0..size).map(move |y| Position::new(x, y)))
    }

    /// Total number of cells.
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.size * self.size
    }
}

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_logging::LogLevel;
use tracing::debug;
use wumpus_logic::{Atom, Literal, Predicate};
use wumpus_world::{Episode, EpisodeConfig, FallbackPolicy, Percept, Position, WorldError};

/// Lifecycle of one explorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplorerState {
    /// Still looking for the goal.
    Exploring,
    /// The goal was reached or a path to it was planned.
    GoalFound,
    /// The agent entered a hazard.
    Dead,
    /// No safe route remains.
    NoPathFound,
}

/// Decision for one step of the stepwise mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Step onto an orthogonal neighbour.
    Move(Position),
    /// Pick up the gold on the current cell.
    Grab,
    /// Leave the cave from the start cell.
    Climb,
}

/// Result of a full-path search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathOutcome {
    /// Cells to enter in order, excluding the start and ending on the goal.
    Found(Vec<Position>),
    /// The safe frontier ran dry before the goal.
    NoPathFound,
    /// The search was cancelled between two frontier pops.
    Abandoned,
}

impl PathOutcome {
    /// The path, when one was found.
    #[must_use]
    pub fn path(&self) -> Option<&[Position]> {
        match self {
            Self::Found(path) => Some(path),
            Self::NoPathFound | Self::Abandoned => None,
        }
    }
}

/// Cooperative cancellation flag checked at every frontier pop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Fresh, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Frontier search restricted to cells the oracle certifies safe.
///
/// Neighbours are always expanded down, right, up, left, which also breaks
/// ties between equally short paths.
#[derive(Debug, Clone)]
pub struct Explorer {
    state: ExplorerState,
    fallback: FallbackPolicy,
    cancel: Option<CancelToken>,
}

impl Default for Explorer {
    fn default() -> Self {
        Self::new(FallbackPolicy::default())
    }
}

impl Explorer {
    /// Creates an explorer in the `Exploring` state.
    #[must_use]
    pub const fn new(fallback: FallbackPolicy) -> Self {
        Self {
            state: ExplorerState::Exploring,
            fallback,
            cancel: None,
        }
    }

    /// Explorer using the configured fallback policy.
    #[must_use]
    pub const fn from_config(config: &EpisodeConfig) -> Self {
        Self::new(config.explorer.fallback)
    }

    /// Attaches a cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> ExplorerState {
        self.state
    }

    /// Active fallback policy.
    #[must_use]
    pub const fn fallback(&self) -> FallbackPolicy {
        self.fallback
    }

    /// Records the agent's death. The explorer stays dead.
    pub fn mark_dead(&mut self) {
        self.state = ExplorerState::Dead;
    }

    /// Back to `Exploring`, e.g. after an episode reset.
    pub fn reset(&mut self) {
        self.state = ExplorerState::Exploring;
    }

    /// Breadth-first search from `start` to `goal` that only enters cells
    /// [`wumpus_world::Oracle::is_safe`] accepts. Moves to `GoalFound` or
    /// `NoPathFound`; an abandoned search leaves the state alone.
    pub fn plan_path(
        &mut self,
        episode: &Episode,
        start: Position,
        goal: Position,
    ) -> Result<PathOutcome, WorldError> {
        let oracle = episode.oracle();
        let mut verdicts: HashMap<Position, bool> = HashMap::new();
        let outcome = self.search(episode, start, goal, |cell| {
            if let Some(safe) = verdicts.get(&cell) {
                return Ok(*safe);
            }
            let safe = oracle.is_safe(cell)?;
            verdicts.insert(cell, safe);
            Ok(safe)
        })?;
        match &outcome {
            PathOutcome::Found(path) => {
                self.state = ExplorerState::GoalFound;
                debug!(start = %start, goal = %goal, steps = path.len(), "path planned");
            }
            PathOutcome::NoPathFound => {
                self.state = ExplorerState::NoPathFound;
                debug!(start = %start, goal = %goal, queried = verdicts.len(), "no safe path");
            }
            PathOutcome::Abandoned => {
                debug!(start = %start, goal = %goal, "search abandoned");
            }
        }
        Ok(outcome)
    }

    fn search(
        &self,
        episode: &Episode,
        start: Position,
        goal: Position,
        mut passable: impl FnMut(Position) -> Result<bool, WorldError>,
    ) -> Result<PathOutcome, WorldError> {
        let grid = episode.grid();
        grid.check(start)?;
        grid.check(goal)?;
        let mut frontier = VecDeque::from([(start, Vec::new())]);
        let mut seen = HashSet::from([start]);
        while let Some((cell, path)) = frontier.pop_front() {
            if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
                return Ok(PathOutcome::Abandoned);
            }
            if cell == goal {
                return Ok(PathOutcome::Found(path));
            }
            for next in grid.adjacent(cell) {
                if seen.contains(&next) || !passable(next)? {
                    continue;
                }
                seen.insert(next);
                let mut extended = path.clone();
                extended.push(next);
                frontier.push_back((next, extended));
            }
        }
        Ok(PathOutcome::NoPathFound)
    }

    /// Stepwise decision for the agent's current cell.
    ///
    /// Climbs once back on the start with the gold, heads home through safe
    /// cells while carrying it, grabs glittering gold, and otherwise enters
    /// the first unvisited neighbour that can be proven safe. When none can,
    /// the fallback policy decides. `None` means the explorer has stopped.
    pub fn next_move(
        &mut self,
        episode: &mut Episode,
        percept: &Percept,
    ) -> Result<Option<Action>, WorldError> {
        if !episode.agent().alive {
            self.state = ExplorerState::Dead;
        }
        if matches!(self.state, ExplorerState::Dead | ExplorerState::NoPathFound) {
            return Ok(None);
        }
        let agent = episode.agent();
        let position = agent.position;
        if agent.has_gold {
            return self.head_home(episode);
        }
        if percept.glitter {
            self.state = ExplorerState::GoalFound;
            return Ok(Some(Action::Grab));
        }

        let around: Vec<Position> = episode.grid().adjacent(position).collect();
        for next in &around {
            if !episode.agent().has_visited(*next) && episode.prove_safe(*next)? {
                return Ok(Some(Action::Move(*next)));
            }
        }

        match self.fallback {
            FallbackPolicy::Halt => {
                self.state = ExplorerState::NoPathFound;
                notify(episode, "explorer.halted", position, None);
                Ok(None)
            }
            FallbackPolicy::RiskyNeighbor => {
                let agent = episode.agent();
                let target = around
                    .iter()
                    .find(|next| !agent.has_visited(**next) && !proven_hazard(episode, **next))
                    .or_else(|| around.iter().find(|next| agent.has_visited(**next)))
                    .copied();
                if let Some(next) = target {
                    notify(episode, "explorer.risky_move", position, Some(next));
                } else {
                    self.state = ExplorerState::NoPathFound;
                    notify(episode, "explorer.halted", position, None);
                }
                Ok(target.map(Action::Move))
            }
        }
    }

    fn head_home(&self, episode: &Episode) -> Result<Option<Action>, WorldError> {
        let agent = episode.agent();
        if agent.position == agent.start {
            return Ok(Some(Action::Climb));
        }
        let outcome = self.search(episode, agent.position, agent.start, |cell| {
            Ok(agent.safe_cells.contains(&cell))
        })?;
        Ok(match outcome {
            PathOutcome::Found(path) => path.first().copied().map(Action::Move),
            PathOutcome::NoPathFound | PathOutcome::Abandoned => None,
        })
    }
}

/// Unproven cells stay candidates; only an entailed pit or wumpus rules one out.
fn proven_hazard(episode: &Episode, cell: Position) -> bool {
    let oracle = episode.oracle();
    [Predicate::Pit, Predicate::Wumpus]
        .into_iter()
        .any(|hazard| oracle.entails(&Literal::positive(Atom::at(hazard, cell.x, cell.y))))
}

fn notify(episode: &Episode, event_type: &str, from: Position, to: Option<Position>) {
    debug!(from = %from, ?to, event_type, "fallback applied");
    if let Some(telemetry) = episode.telemetry() {
        let payload = json!({ "from": from, "to": to });
        let _ = telemetry.log(LogLevel::Warn, event_type, payload.clone());
        let _ = telemetry.event(event_type, payload);
    }
}

use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_logging::LogLevel;
use tracing::info;
use wumpus_world::{Cave, Direction, Episode, Position, WorldError};

use crate::explorer::{Action, Explorer, ExplorerState, PathOutcome};

/// How a stepwise episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeOutcome {
    /// Left the cave from the start cell.
    Climbed,
    /// Entered a hazard.
    Died,
    /// The explorer stopped without a move.
    Halted,
    /// `max_steps` actions were taken.
    StepLimit,
}

/// Summary of one stepwise episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeReport {
    /// Episode identifier.
    pub episode_id: String,
    /// Terminal condition.
    pub outcome: EpisodeOutcome,
    /// Explorer state when the episode ended.
    pub state: ExplorerState,
    /// Cells occupied in order, starting with the start cell.
    pub trail: Vec<Position>,
    /// Actions taken.
    pub steps: usize,
    /// Whether the gold was picked up.
    pub grabbed: bool,
    /// Hazard cells the agent never entered.
    pub hazards_avoided: usize,
    /// Knowledge base size at the end.
    pub clauses: usize,
    /// No unit clause appears together with its negation.
    pub consistent: bool,
}

impl EpisodeReport {
    /// Climbed out carrying the gold.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.grabbed && matches!(self.outcome, EpisodeOutcome::Climbed)
    }
}

/// Drives the perceive, observe, decide, act cycle against a hidden cave.
#[derive(Debug, Clone, Default)]
pub struct EpisodeRunner {
    explorer: Explorer,
}

impl EpisodeRunner {
    /// Runner around an explorer.
    #[must_use]
    pub const fn new(explorer: Explorer) -> Self {
        Self { explorer }
    }

    /// The explorer, for inspecting its state.
    #[must_use]
    pub const fn explorer(&self) -> &Explorer {
        &self.explorer
    }

    /// Plans with full knowledge of the cave: every object is recorded, the
    /// layout is sealed, and a path from the agent to the gold is searched.
    pub fn plan(&mut self, episode: &mut Episode, cave: &Cave) -> Result<PathOutcome, WorldError> {
        let mut translator = episode.translator();
        translator.disclose_layout(cave.layout())?;
        translator.seal_layout();
        let Some(gold) = cave.layout().gold else {
            return Ok(PathOutcome::NoPathFound);
        };
        let start = episode.agent().position;
        let outcome = self.explorer.plan_path(episode, start, gold)?;
        emit(
            episode,
            LogLevel::Info,
            "episode.planned",
            json!({ "start": start, "goal": gold, "path": outcome.path() }),
        );
        Ok(outcome)
    }

    /// Runs one stepwise episode until the agent climbs out, dies, halts or
    /// uses up `max_steps`.
    pub fn run(&mut self, episode: &mut Episode, cave: &Cave) -> Result<EpisodeReport, WorldError> {
        let max_steps = episode.config().max_steps;
        let mut position = episode.agent().position;
        let mut percept = cave.sense(position);
        let mut trail = vec![position];
        let mut steps = 0;
        emit(
            episode,
            LogLevel::Info,
            "episode.started",
            json!({ "start": position, "max_steps": max_steps }),
        );

        let outcome = loop {
            {
                let mut translator = episode.translator();
                translator.observe(position, &percept)?;
                translator.observe_absence(position, &percept)?;
            }
            if steps >= max_steps {
                break EpisodeOutcome::StepLimit;
            }
            let Some(action) = self.explorer.next_move(episode, &percept)? else {
                break EpisodeOutcome::Halted;
            };
            steps += 1;
            match action {
                Action::Grab => {
                    episode.grab_gold();
                    emit(
                        episode,
                        LogLevel::Info,
                        "episode.goal_found",
                        json!({ "cell": position, "steps": steps }),
                    );
                }
                Action::Climb => break EpisodeOutcome::Climbed,
                Action::Move(next) => {
                    let Some(direction) = Direction::between(position, next) else {
                        return Err(WorldError::InvalidPosition {
                            position: next,
                            grid_size: episode.grid().size(),
                        });
                    };
                    let moved = cave.attempt_move(position, direction);
                    position = moved.position;
                    percept = moved.percept;
                    episode.move_agent(position)?;
                    trail.push(position);
                    if cave.hazard_at(position).is_some() {
                        episode.kill();
                        self.explorer.mark_dead();
                        break EpisodeOutcome::Died;
                    }
                    episode.translator().record_survived(position)?;
                }
            }
        };

        let hazards_avoided = cave
            .layout()
            .hazard_cells()
            .iter()
            .filter(|cell| !trail.contains(cell))
            .count();
        let report = EpisodeReport {
            episode_id: episode.id().to_string(),
            outcome,
            state: self.explorer.state(),
            trail,
            steps,
            grabbed: episode.agent().has_gold,
            hazards_avoided,
            clauses: episode.knowledge().len(),
            consistent: episode.knowledge().conflicting_units().is_empty(),
        };
        info!(
            episode = %report.episode_id,
            outcome = ?report.outcome,
            steps = report.steps,
            "episode finished"
        );
        emit(
            episode,
            LogLevel::Info,
            "episode.finished",
            json!({
                "outcome": report.outcome,
                "steps": report.steps,
                "grabbed": report.grabbed,
                "hazards_avoided": report.hazards_avoided,
            }),
        );
        Ok(report)
    }
}

fn emit(episode: &Episode, level: LogLevel, event_type: &str, payload: serde_json::Value) {
    if let Some(telemetry) = episode.telemetry() {
        let _ = telemetry.log(level, event_type, payload.clone());
        let _ = telemetry.event(event_type, payload);
    }
}

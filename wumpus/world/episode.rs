use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_logging::LogLevel;
use uuid::Uuid;
use wumpus_logic::{Atom, Clause, ClauseStore, Literal, Predicate, ResolutionEngine};

use crate::{
    axioms,
    config::EpisodeConfig,
    error::WorldError,
    grid::{Grid, Position},
    oracle::{self, Oracle},
    percept::ObjectKind,
    telemetry::WorldTelemetry,
    translator::Translator,
};

/// What the agent knows about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentState {
    /// Cell the episode started on.
    pub start: Position,
    /// Current cell.
    pub position: Position,
    /// False once the agent entered a hazard.
    pub alive: bool,
    /// True after grabbing the gold.
    pub has_gold: bool,
    /// Cells entered and survived.
    pub visited: BTreeSet<Position>,
    /// Cells proven or known safe.
    pub safe_cells: BTreeSet<Position>,
}

impl AgentState {
    fn new(start: Position) -> Self {
        Self {
            start,
            position: start,
            alive: true,
            has_gold: false,
            visited: BTreeSet::new(),
            safe_cells: BTreeSet::new(),
        }
    }

    /// Whether the agent already survived `position`.
    #[must_use]
    pub fn has_visited(&self, position: Position) -> bool {
        self.visited.contains(&position)
    }
}

/// One game: configuration, knowledge base and agent state.
///
/// Components never hold the episode; they borrow it for one call through
/// [`Episode::translator`] and [`Episode::oracle`].
#[derive(Debug)]
pub struct Episode {
    id: Uuid,
    started_at: DateTime<Utc>,
    config: EpisodeConfig,
    grid: Grid,
    pub(crate) knowledge: ClauseStore,
    engine: ResolutionEngine,
    pub(crate) agent: AgentState,
    pub(crate) sealed: bool,
    pub(crate) observed: BTreeSet<Position>,
    telemetry: Option<WorldTelemetry>,
}

impl Episode {
    /// Validates the configuration and seeds the knowledge base.
    pub fn new(config: EpisodeConfig) -> Result<Self, WorldError> {
        let grid = config.validate()?;
        let engine = ResolutionEngine::new(config.resolution);
        let mut episode = Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            agent: AgentState::new(config.agent_start),
            config,
            grid,
            knowledge: ClauseStore::new(),
            engine,
            sealed: false,
            observed: BTreeSet::new(),
            telemetry: None,
        };
        episode.seed()?;
        Ok(episode)
    }

    /// Attaches telemetry sinks.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: WorldTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    fn seed(&mut self) -> Result<(), WorldError> {
        let start = self.agent.start;
        let added = self.knowledge.extend(axioms::eager_axioms(&self.grid));
        self.knowledge.add(Clause::fact(Atom::at(
            Predicate::Reachable,
            start.x,
            start.y,
        )));
        let mut translator = self.translator();
        translator.record_fact(ObjectKind::Agent, start)?;
        translator.record_survived(start)?;
        tracing::debug!(episode = %self.id, axioms = added, "knowledge base seeded");
        Ok(())
    }

    /// Clears knowledge and agent state back to the episode start.
    pub fn reset(&mut self) -> Result<(), WorldError> {
        self.knowledge.clear();
        self.agent = AgentState::new(self.config.agent_start);
        self.sealed = false;
        self.observed.clear();
        self.started_at = Utc::now();
        self.seed()?;
        self.log(
            LogLevel::Info,
            "episode.reset",
            json!({ "id": self.id, "started_at": self.started_at }),
        );
        Ok(())
    }

    /// Episode identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// When the episode was created or last reset.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Configuration the episode was built from.
    #[must_use]
    pub const fn config(&self) -> &EpisodeConfig {
        &self.config
    }

    /// Grid bounds.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Knowledge base content.
    #[must_use]
    pub const fn knowledge(&self) -> &ClauseStore {
        &self.knowledge
    }

    /// Resolution engine configured for this episode.
    #[must_use]
    pub const fn engine(&self) -> ResolutionEngine {
        self.engine
    }

    /// Agent state.
    #[must_use]
    pub const fn agent(&self) -> &AgentState {
        &self.agent
    }

    /// Whether the hazard layout was declared complete.
    #[must_use]
    pub const fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Attached telemetry, if any.
    #[must_use]
    pub const fn telemetry(&self) -> Option<&WorldTelemetry> {
        self.telemetry.as_ref()
    }

    /// Borrows the translator that feeds this episode's knowledge base.
    pub fn translator(&mut self) -> Translator<'_> {
        Translator::new(self)
    }

    /// Borrows the read-only query interface.
    #[must_use]
    pub const fn oracle(&self) -> Oracle<'_> {
        Oracle::new(self)
    }

    /// Decides safety like [`Oracle::is_safe`] and records a proven cell in
    /// `safe_cells`. Honors `retain_derivations`.
    pub fn prove_safe(&mut self, position: Position) -> Result<bool, WorldError> {
        self.grid.check(position)?;
        if self.agent.safe_cells.contains(&position) || position == self.agent.start {
            return Ok(true);
        }
        let query = Literal::positive(Atom::at(Predicate::Safe, position.x, position.y));
        let outcome = self.engine.entails_retaining(&mut self.knowledge, &query);
        let safe = oracle::settle(outcome, &query, self.telemetry.as_ref());
        if safe {
            self.agent.safe_cells.insert(position);
            self.log(
                LogLevel::Debug,
                "episode.cell_proven_safe",
                json!({ "cell": position }),
            );
        }
        Ok(safe)
    }

    /// Moves the agent onto `position` without judging the cell.
    pub fn move_agent(&mut self, position: Position) -> Result<(), WorldError> {
        self.grid.check(position)?;
        self.agent.position = position;
        Ok(())
    }

    /// Marks the gold as carried.
    pub fn grab_gold(&mut self) {
        if !self.agent.has_gold {
            self.agent.has_gold = true;
            self.event("episode.gold_grabbed", json!({ "cell": self.agent.position }));
        }
    }

    /// Marks the agent dead on its current cell.
    pub fn kill(&mut self) {
        if self.agent.alive {
            self.agent.alive = false;
            let payload = json!({ "cell": self.agent.position });
            self.log(LogLevel::Warn, "episode.agent_died", payload.clone());
            self.event("episode.agent_died", payload);
        }
    }

    pub(crate) fn log(&self, level: LogLevel, message: &str, metadata: Value) {
        if let Some(telemetry) = &self.telemetry {
            let _ = telemetry.log(level, message, metadata);
        }
    }

    pub(crate) fn event(&self, event_type: &str, payload: Value) {
        if let Some(telemetry) = &self.telemetry {
            let _ = telemetry.event(event_type, payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(predicate: Predicate, x: i32, y: i32) -> Clause {
        Clause::fact(Atom::at(predicate, x, y))
    }

    #[test]
    fn new_episode_knows_its_start() {
        let episode = Episode::new(EpisodeConfig::new(4)).unwrap();
        let start = Position::new(0, 0);
        assert!(episode.agent().has_visited(start));
        assert!(episode.agent().safe_cells.contains(&start));
        assert!(episode.knowledge().contains(&fact(Predicate::Agent, 0, 0)));
        assert!(episode.knowledge().contains(&fact(Predicate::Reachable, 0, 0)));
        assert!(episode.oracle().is_safe(start).unwrap());
    }

    #[test]
    fn invalid_configuration_is_fatal() {
        let config = EpisodeConfig::new(4)
            .with_wumpus(Position::new(1, 1))
            .with_gold(Position::new(1, 1));
        assert!(matches!(
            Episode::new(config),
            Err(WorldError::OverlappingObjects { .. })
        ));
    }

    #[test]
    fn prove_safe_records_cell() {
        let mut episode = Episode::new(EpisodeConfig::new(3)).unwrap();
        episode.translator().seal_layout();
        let target = Position::new(2, 2);
        assert!(episode.prove_safe(target).unwrap());
        assert!(episode.agent().safe_cells.contains(&target));
    }

    #[test]
    fn reset_restores_fresh_knowledge() {
        let mut episode = Episode::new(EpisodeConfig::new(3)).unwrap();
        let fresh = episode.knowledge().len();
        episode
            .translator()
            .record_fact(ObjectKind::Pit, Position::new(1, 1))
            .unwrap();
        episode.translator().seal_layout();
        episode.move_agent(Position::new(0, 1)).unwrap();
        episode.kill();
        episode.reset().unwrap();
        assert_eq!(episode.knowledge().len(), fresh);
        assert!(!episode.is_sealed());
        assert!(episode.agent().alive);
        assert_eq!(episode.agent().position, Position::new(0, 0));
    }

    #[test]
    fn moves_are_bounds_checked() {
        let mut episode = Episode::new(EpisodeConfig::new(3)).unwrap();
        assert!(episode.move_agent(Position::new(3, 0)).is_err());
        assert_eq!(episode.agent().position, Position::new(0, 0));
    }

    #[tokio::test]
    async fn episode_with_event_telemetry_drops_inside_runtime() {
        let bus = std::sync::Arc::new(shared_event_bus::MemoryEventBus::new(16));
        let telemetry = WorldTelemetry::builder("world")
            .event_publisher(bus.clone())
            .build()
            .unwrap();
        let mut episode = Episode::new(EpisodeConfig::new(3))
            .unwrap()
            .with_telemetry(telemetry);
        episode.kill();
        drop(episode);
        tokio::task::yield_now().await;
        assert_eq!(bus.events_of("episode.agent_died").len(), 1);
    }
}

use futures::future::join_all;
use serde_json::json;
use shared_logging::LogLevel;
use tracing::warn;
use wumpus_logic::{Atom, KnowledgeSnapshot, Literal, LogicError, Predicate, ResolutionEngine};

use crate::{episode::Episode, error::WorldError, grid::Position, telemetry::WorldTelemetry};

/// Domain queries over an episode's knowledge base. Queries never mutate
/// the episode.
#[derive(Debug, Clone, Copy)]
pub struct Oracle<'a> {
    episode: &'a Episode,
}

impl<'a> Oracle<'a> {
    pub(crate) const fn new(episode: &'a Episode) -> Self {
        Self { episode }
    }

    /// True for the start cell, a visited cell, or when `Safe(position)` is
    /// entailed. An undecided query counts as unsafe.
    pub fn is_safe(&self, position: Position) -> Result<bool, WorldError> {
        self.episode.grid().check(position)?;
        let agent = self.episode.agent();
        if position == agent.start || agent.has_visited(position) {
            return Ok(true);
        }
        Ok(self.entails(&Literal::positive(Atom::at(
            Predicate::Safe,
            position.x,
            position.y,
        ))))
    }

    /// True when `Reachable(position)` is entailed.
    pub fn is_reachable(&self, position: Position) -> Result<bool, WorldError> {
        self.episode.grid().check(position)?;
        Ok(self.entails(&Literal::positive(Atom::at(
            Predicate::Reachable,
            position.x,
            position.y,
        ))))
    }

    /// Raw entailment check with exhaustion mapped to `false`.
    #[must_use]
    pub fn entails(&self, query: &Literal) -> bool {
        let outcome = self
            .episode
            .engine()
            .entails(self.episode.knowledge().all(), query);
        settle(outcome, query, self.episode.telemetry())
    }

    /// Decides `Safe(c)` for every cell against a frozen snapshot, one
    /// blocking task per cell. Results keep the order of `cells`.
    pub async fn precompute_safety(
        engine: ResolutionEngine,
        snapshot: &KnowledgeSnapshot,
        cells: Vec<Position>,
    ) -> Vec<(Position, bool)> {
        let tasks = cells.into_iter().map(|cell| {
            let snapshot = snapshot.clone();
            let handle = tokio::task::spawn_blocking(move || {
                let query = Literal::positive(Atom::at(Predicate::Safe, cell.x, cell.y));
                let outcome = engine.entails(snapshot.all(), &query);
                settle(outcome, &query, None)
            });
            async move {
                match handle.await {
                    Ok(safe) => (cell, safe),
                    Err(err) => {
                        warn!(cell = %cell, error = %err, "safety task failed");
                        (cell, false)
                    }
                }
            }
        });
        join_all(tasks).await
    }
}

/// Collapses an undecided query to `false`, reporting the cap breach.
pub(crate) fn settle(
    outcome: Result<bool, LogicError>,
    query: &Literal,
    telemetry: Option<&WorldTelemetry>,
) -> bool {
    match outcome {
        Ok(entailed) => entailed,
        Err(err) => {
            warn!(query = %query, error = %err, "query undecided, treating as false");
            if let Some(telemetry) = telemetry {
                let payload = match err {
                    LogicError::ResolutionExhausted { rounds, clauses } => {
                        json!({ "query": query.to_string(), "rounds": rounds, "clauses": clauses })
                    }
                    other => json!({ "query": query.to_string(), "error": other.to_string() }),
                };
                let _ = telemetry.log(
                    LogLevel::Warn,
                    "oracle.resolution_exhausted",
                    payload.clone(),
                );
                let _ = telemetry.event("oracle.resolution_exhausted", payload);
            }
            false
        }
    }
}

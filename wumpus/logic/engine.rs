use std::collections::{BTreeSet, HashMap, HashSet};

use indexmap::{map::Entry, IndexMap};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{clause::Clause, error::LogicError, literal::Literal, store::ClauseStore};

/// Bounds and options for one entailment query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Saturation rounds allowed before giving up.
    pub max_rounds: usize,
    /// Working-set size allowed before giving up.
    pub max_clauses: usize,
    /// Fold query-independent derivations back into the store.
    pub retain_derivations: bool,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            max_rounds: 64,
            max_clauses: 20_000,
            retain_derivations: false,
        }
    }
}

/// Result of one refutation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionOutcome {
    /// Whether the query is entailed.
    pub entailed: bool,
    /// Rounds executed, including the one that settled the query.
    pub rounds: usize,
    /// Clauses added to the working set, in the order they were added.
    pub derived: Vec<Clause>,
    /// Subset of `derived` that does not depend on the negated query.
    pub learned: Vec<Clause>,
}

/// Where a working clause came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provenance {
    /// Knowledge base content or a derivation from it alone.
    Given,
    /// Depends on the negated query.
    Query,
}

impl Provenance {
    const fn join(self, other: Self) -> Self {
        match (self, other) {
            (Self::Given, Self::Given) => Self::Given,
            _ => Self::Query,
        }
    }
}

/// Scratch clause set local to one query.
#[derive(Debug, Default)]
struct WorkingSet {
    clauses: IndexMap<Clause, Provenance>,
    occurrences: HashMap<Literal, Vec<usize>>,
    units: HashSet<Literal>,
}

impl WorkingSet {
    fn insert(&mut self, clause: Clause, provenance: Provenance) -> bool {
        if self.clauses.contains_key(&clause) {
            return false;
        }
        let idx = self.clauses.len();
        for literal in clause.literals() {
            self.occurrences.entry(*literal).or_default().push(idx);
        }
        if let Some(unit) = clause.as_unit() {
            self.units.insert(*unit);
        }
        self.clauses.insert(clause, provenance);
        true
    }

    fn len(&self) -> usize {
        self.clauses.len()
    }

    fn get(&self, idx: usize) -> (&Clause, Provenance) {
        let (clause, provenance) = self
            .clauses
            .get_index(idx)
            .unwrap_or_else(|| unreachable!("working index {idx} out of range"));
        (clause, *provenance)
    }

    /// Earlier clauses holding the complement of some literal of clause `idx`.
    fn partners(&self, idx: usize) -> BTreeSet<usize> {
        let (clause, _) = self.get(idx);
        clause
            .literals()
            .filter_map(|literal| self.occurrences.get(&literal.negate()))
            .flatten()
            .copied()
            .filter(|&other| other < idx)
            .collect()
    }

    /// A resolvent is redundant if it is already known, is a tautology, or
    /// contains a literal that is held as a unit.
    fn is_redundant(&self, clause: &Clause) -> bool {
        self.clauses.contains_key(clause)
            || clause.is_tautology()
            || clause.literals().any(|literal| self.units.contains(literal))
    }
}

/// Refutation-based resolution over ground clauses.
///
/// To decide `KB ⊨ Q` the engine adds `¬Q` to a scratch copy of the clause set
/// and saturates it round by round until either the empty clause appears
/// (entailed) or a round produces nothing new (not entailed).
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolutionEngine {
    config: ResolutionConfig,
}

impl ResolutionEngine {
    /// Creates an engine with the given limits.
    #[must_use]
    pub const fn new(config: ResolutionConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ResolutionConfig {
        &self.config
    }

    /// Decides whether `query` follows from `clauses`.
    pub fn entails<'a>(
        &self,
        clauses: impl IntoIterator<Item = &'a Clause>,
        query: &Literal,
    ) -> Result<bool, LogicError> {
        self.prove(clauses, query).map(|outcome| outcome.entailed)
    }

    /// Queries the store and, when `retain_derivations` is set, folds the
    /// query-independent derivations back into it.
    pub fn entails_retaining(
        &self,
        store: &mut ClauseStore,
        query: &Literal,
    ) -> Result<bool, LogicError> {
        let outcome = self.prove(store.all(), query)?;
        if self.config.retain_derivations {
            let added = store.extend(outcome.learned);
            debug!(query = %query, added, "retained derivations");
        }
        Ok(outcome.entailed)
    }

    /// Full refutation run, exposing the derived clauses.
    ///
    /// Every round resolves each pair of working clauses in which at least
    /// one member was added by the previous round (all pairs in round one).
    /// Pairs are visited in ascending index order and resolved on the first
    /// complementary literal of the older clause, so identical inputs derive
    /// identical clause sequences.
    pub fn prove<'a>(
        &self,
        clauses: impl IntoIterator<Item = &'a Clause>,
        query: &Literal,
    ) -> Result<ResolutionOutcome, LogicError> {
        let mut working = WorkingSet::default();
        for clause in clauses {
            if clause.is_empty() {
                debug!(query = %query, "knowledge base holds the empty clause");
                return Ok(ResolutionOutcome {
                    entailed: true,
                    rounds: 0,
                    derived: Vec::new(),
                    learned: Vec::new(),
                });
            }
            working.insert(clause.clone(), Provenance::Given);
        }
        working.insert(Clause::unit(query.negate()), Provenance::Query);

        let mut derived = Vec::new();
        let mut learned = Vec::new();
        let mut frontier = 0;
        for round in 1..=self.config.max_rounds {
            let end = working.len();
            let mut fresh: IndexMap<Clause, Provenance> = IndexMap::new();
            for j in frontier..end {
                for i in working.partners(j) {
                    let (left, left_origin) = working.get(i);
                    let (right, right_origin) = working.get(j);
                    let Some(resolvent) = left.resolve(right) else {
                        continue;
                    };
                    if resolvent.is_empty() {
                        debug!(query = %query, round, "refutation found");
                        return Ok(ResolutionOutcome {
                            entailed: true,
                            rounds: round,
                            derived,
                            learned,
                        });
                    }
                    if working.is_redundant(&resolvent) {
                        continue;
                    }
                    let origin = left_origin.join(right_origin);
                    match fresh.entry(resolvent) {
                        Entry::Occupied(mut slot) => {
                            if origin == Provenance::Given {
                                slot.insert(origin);
                            }
                        }
                        Entry::Vacant(slot) => {
                            slot.insert(origin);
                        }
                    }
                }
                if end + fresh.len() > self.config.max_clauses {
                    warn!(
                        query = %query,
                        round,
                        clauses = end + fresh.len(),
                        "resolution clause cap reached"
                    );
                    return Err(LogicError::ResolutionExhausted {
                        rounds: round,
                        clauses: end + fresh.len(),
                    });
                }
            }
            if fresh.is_empty() {
                debug!(query = %query, round, clauses = end, "saturated without refutation");
                return Ok(ResolutionOutcome {
                    entailed: false,
                    rounds: round,
                    derived,
                    learned,
                });
            }
            debug!(query = %query, round, fresh = fresh.len(), "round complete");
            frontier = end;
            for (clause, origin) in fresh {
                derived.push(clause.clone());
                if origin == Provenance::Given {
                    learned.push(clause.clone());
                }
                working.insert(clause, origin);
            }
        }
        warn!(query = %query, rounds = self.config.max_rounds, "resolution round cap reached");
        Err(LogicError::ResolutionExhausted {
            rounds: self.config.max_rounds,
            clauses: working.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::{Atom, Predicate};

    fn lit(predicate: Predicate, x: i32, y: i32) -> Literal {
        Literal::positive(Atom::at(predicate, x, y))
    }

    fn safe_rule(x: i32, y: i32) -> Clause {
        Clause::implication(
            [lit(Predicate::Pit, x, y).negate(), lit(Predicate::Wumpus, x, y).negate()],
            lit(Predicate::Safe, x, y),
        )
    }

    #[test]
    fn unit_query_settles_in_one_round() {
        let mut store = ClauseStore::new();
        store.add(Clause::fact(Atom::at(Predicate::Gold, 2, 2)));
        let engine = ResolutionEngine::default();
        let outcome = engine
            .prove(store.all(), &lit(Predicate::Gold, 2, 2))
            .unwrap();
        assert!(outcome.entailed);
        assert_eq!(outcome.rounds, 1);
    }

    #[test]
    fn chained_implication_is_entailed() {
        let mut store = ClauseStore::new();
        store.add(safe_rule(3, 3));
        store.add(Clause::unit(lit(Predicate::Pit, 3, 3).negate()));
        store.add(Clause::unit(lit(Predicate::Wumpus, 3, 3).negate()));
        let engine = ResolutionEngine::default();
        assert!(engine.entails(store.all(), &lit(Predicate::Safe, 3, 3)).unwrap());
    }

    #[test]
    fn pit_blocks_safety() {
        let mut store = ClauseStore::new();
        store.add(safe_rule(1, 1));
        store.add(Clause::fact(Atom::at(Predicate::Pit, 1, 1)));
        let engine = ResolutionEngine::default();
        assert!(!engine.entails(store.all(), &lit(Predicate::Safe, 1, 1)).unwrap());
    }

    #[test]
    fn inconsistent_store_entails_anything() {
        let mut store = ClauseStore::new();
        let p = lit(Predicate::Breeze, 0, 0);
        store.add(Clause::unit(p));
        store.add(Clause::unit(p.negate()));
        let engine = ResolutionEngine::default();
        assert!(engine.entails(store.all(), &lit(Predicate::Wumpus, 7, 7)).unwrap());
        assert!(engine.entails(store.all(), &lit(Predicate::Wumpus, 7, 7).negate()).unwrap());
    }

    #[test]
    fn empty_store_entails_nothing() {
        let engine = ResolutionEngine::default();
        let outcome = engine.prove(std::iter::empty(), &lit(Predicate::Safe, 0, 0)).unwrap();
        assert!(!outcome.entailed);
        assert!(outcome.derived.is_empty());
    }

    #[test]
    fn identical_runs_derive_identical_sequences() {
        let mut store = ClauseStore::new();
        store.add(Clause::disjunctive_implication(
            lit(Predicate::Breeze, 1, 1),
            [lit(Predicate::Pit, 0, 1), lit(Predicate::Pit, 2, 1), lit(Predicate::Pit, 1, 0)],
        ));
        store.add(Clause::unit(lit(Predicate::Breeze, 1, 1)));
        store.add(Clause::unit(lit(Predicate::Pit, 0, 1).negate()));
        store.add(safe_rule(2, 1));
        let engine = ResolutionEngine::default();
        let query = lit(Predicate::Safe, 2, 1);
        let first = engine.prove(store.all(), &query).unwrap();
        let second = engine.prove(store.all(), &query).unwrap();
        assert_eq!(first, second);
        assert!(!first.entailed);
        assert!(!first.derived.is_empty());
    }

    #[test]
    fn clause_cap_surfaces_exhaustion() {
        let mut store = ClauseStore::new();
        store.add(safe_rule(0, 0));
        store.add(Clause::unit(lit(Predicate::Pit, 0, 0).negate()));
        store.add(Clause::unit(lit(Predicate::Wumpus, 0, 0).negate()));
        let engine = ResolutionEngine::new(ResolutionConfig {
            max_clauses: 4,
            ..ResolutionConfig::default()
        });
        let err = engine
            .entails(store.all(), &lit(Predicate::Safe, 0, 0))
            .unwrap_err();
        assert!(matches!(err, LogicError::ResolutionExhausted { .. }));
    }

    #[test]
    fn round_cap_surfaces_exhaustion() {
        let mut store = ClauseStore::new();
        store.add(safe_rule(0, 0));
        store.add(Clause::unit(lit(Predicate::Pit, 0, 0).negate()));
        store.add(Clause::unit(lit(Predicate::Wumpus, 0, 0).negate()));
        let engine = ResolutionEngine::new(ResolutionConfig {
            max_rounds: 1,
            ..ResolutionConfig::default()
        });
        assert_eq!(
            engine.entails(store.all(), &lit(Predicate::Safe, 0, 0)),
            Err(LogicError::ResolutionExhausted {
                rounds: 1,
                clauses: 7,
            })
        );
    }

    #[test]
    fn retention_keeps_only_query_independent_clauses() {
        let mut store = ClauseStore::new();
        store.add(safe_rule(2, 2));
        store.add(Clause::unit(lit(Predicate::Pit, 2, 2).negate()));
        store.add(Clause::unit(lit(Predicate::Wumpus, 2, 2).negate()));
        let engine = ResolutionEngine::new(ResolutionConfig {
            retain_derivations: true,
            ..ResolutionConfig::default()
        });
        let before = store.len();
        assert!(engine
            .entails_retaining(&mut store, &lit(Predicate::Safe, 2, 2))
            .unwrap());
        assert!(store.len() > before);
        assert!(store.holds_unit(&lit(Predicate::Safe, 2, 2)));
        assert!(!store.contains(&Clause::new([
            lit(Predicate::Pit, 2, 2),
            lit(Predicate::Wumpus, 2, 2),
        ])));
    }

    #[test]
    fn empty_clause_in_store_entails_everything() {
        let mut store = ClauseStore::new();
        store.add(Clause::empty());
        let engine = ResolutionEngine::default();
        assert!(engine.entails(store.all(), &lit(Predicate::Safe, 0, 0)).unwrap());
        assert!(engine
            .entails(store.all(), &lit(Predicate::Safe, 0, 0).negate())
            .unwrap());
    }

    #[test]
    fn config_fills_missing_fields_from_defaults() {
        let config: ResolutionConfig = serde_json::from_str(r#"{ "max_rounds": 8 }"#).unwrap();
        assert_eq!(config.max_rounds, 8);
        assert_eq!(config.max_clauses, ResolutionConfig::default().max_clauses);
        assert!(!config.retain_derivations);
    }
}

use std::sync::Arc;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::{clause::Clause, literal::Literal};

/// Duplicate-free, insertion-ordered set of clauses.
///
/// Iteration order is insertion order, which keeps resolution runs over the
/// same store reproducible.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClauseStore {
    clauses: IndexSet<Clause>,
}

impl ClauseStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `clause` unless a structurally identical one is present.
    /// Returns whether the store grew.
    pub fn add(&mut self, clause: Clause) -> bool {
        self.clauses.insert(clause)
    }

    /// Adds every clause, returning how many were new.
    pub fn extend(&mut self, clauses: impl IntoIterator<Item = Clause>) -> usize {
        clauses
            .into_iter()
            .filter(|clause| self.clauses.insert(clause.clone()))
            .count()
    }

    /// Membership by literal-set equality.
    #[must_use]
    pub fn contains(&self, clause: &Clause) -> bool {
        self.clauses.contains(clause)
    }

    /// True when `literal` is held as a unit clause.
    #[must_use]
    pub fn holds_unit(&self, literal: &Literal) -> bool {
        self.clauses.contains(&Clause::unit(*literal))
    }

    /// All clauses in insertion order.
    pub fn all(&self) -> impl ExactSizeIterator<Item = &Clause> + '_ {
        self.clauses.iter()
    }

    /// Number of stored clauses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// True when nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Drops every clause (episode reset).
    pub fn clear(&mut self) {
        self.clauses.clear();
    }

    /// Unit clauses whose negation is also a unit clause, in insertion order.
    #[must_use]
    pub fn conflicting_units(&self) -> Vec<Literal> {
        self.clauses
            .iter()
            .filter_map(Clause::as_unit)
            .filter(|literal| !literal.is_negated() && self.holds_unit(&literal.negate()))
            .copied()
            .collect()
    }

    /// Immutable copy that can be queried from other threads.
    #[must_use]
    pub fn snapshot(&self) -> KnowledgeSnapshot {
        KnowledgeSnapshot {
            clauses: self.clauses.iter().cloned().collect(),
        }
    }
}

/// Frozen clause set shared across concurrent queries.
#[derive(Debug, Clone)]
pub struct KnowledgeSnapshot {
    clauses: Arc<[Clause]>,
}

impl KnowledgeSnapshot {
    /// Clauses in the order they had in the store.
    pub fn all(&self) -> impl ExactSizeIterator<Item = &Clause> + '_ {
        self.clauses.iter()
    }

    /// Number of clauses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// True for a snapshot of an empty store.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::{Atom, Predicate};

    fn pit(x: i32, y: i32) -> Literal {
        Literal::positive(Atom::at(Predicate::Pit, x, y))
    }

    #[test]
    fn repeated_adds_do_not_grow_store() {
        let mut store = ClauseStore::new();
        assert!(store.add(Clause::new([pit(0, 1), pit(1, 0)])));
        assert!(!store.add(Clause::new([pit(1, 0), pit(0, 1)])));
        assert_eq!(store.extend([Clause::unit(pit(0, 1)), Clause::unit(pit(0, 1))]), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut store = ClauseStore::new();
        store.add(Clause::unit(pit(3, 3)));
        store.add(Clause::unit(pit(0, 0)));
        store.add(Clause::unit(pit(1, 1)));
        let order: Vec<String> = store.all().map(ToString::to_string).collect();
        assert_eq!(order, vec!["Pit(3,3)", "Pit(0,0)", "Pit(1,1)"]);
    }

    #[test]
    fn detects_conflicting_units() {
        let mut store = ClauseStore::new();
        store.add(Clause::unit(pit(2, 2)));
        assert!(store.conflicting_units().is_empty());
        store.add(Clause::unit(pit(2, 2).negate()));
        assert_eq!(store.conflicting_units(), vec![pit(2, 2)]);
    }

    #[test]
    fn snapshot_is_detached() {
        let mut store = ClauseStore::new();
        store.add(Clause::unit(pit(1, 2)));
        let snapshot = store.snapshot();
        store.add(Clause::unit(pit(2, 1)));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn store_survives_json_round_trip() {
        let mut store = ClauseStore::new();
        store.add(Clause::new([pit(0, 1), pit(1, 0).negate()]));
        store.add(Clause::unit(pit(2, 2)));
        let text = serde_json::to_string(&store).unwrap();
        let restored: ClauseStore = serde_json::from_str(&text).unwrap();
        let before: Vec<&Clause> = store.all().collect();
        let after: Vec<&Clause> = restored.all().collect();
        assert_eq!(before, after);
    }
}

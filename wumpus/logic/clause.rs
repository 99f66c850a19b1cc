use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

use crate::literal::{Atom, Literal};

/// A disjunction of literals. The empty clause is a derived contradiction.
///
/// Literals are kept in a sorted set, so two clauses with the same literals
/// compare, hash and print identically regardless of construction order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Clause {
    literals: BTreeSet<Literal>,
}

impl Clause {
    /// Builds a clause from any literal collection; duplicates collapse.
    pub fn new(literals: impl IntoIterator<Item = Literal>) -> Self {
        Self {
            literals: literals.into_iter().collect(),
        }
    }

    /// The empty clause.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Single-literal clause.
    #[must_use]
    pub fn unit(literal: Literal) -> Self {
        Self::new([literal])
    }

    /// Positive unit fact.
    #[must_use]
    pub fn fact(atom: Atom) -> Self {
        Self::unit(Literal::positive(atom))
    }

    /// `A1 ∧ … ∧ An → B` in clause form `{¬A1, …, ¬An, B}`.
    pub fn implication(
        antecedents: impl IntoIterator<Item = Literal>,
        consequent: Literal,
    ) -> Self {
        Self::new(
            antecedents
                .into_iter()
                .map(|literal| literal.negate())
                .chain([consequent]),
        )
    }

    /// `A → B1 ∨ … ∨ Bn` in clause form `{¬A, B1, …, Bn}`.
    pub fn disjunctive_implication(
        antecedent: Literal,
        consequents: impl IntoIterator<Item = Literal>,
    ) -> Self {
        Self::new([antecedent.negate()].into_iter().chain(consequents))
    }

    /// True for the contradiction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Number of literals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    /// The literal of a unit clause.
    #[must_use]
    pub fn as_unit(&self) -> Option<&Literal> {
        if self.literals.len() == 1 {
            self.literals.first()
        } else {
            None
        }
    }

    /// Literals in scan order.
    pub fn literals(&self) -> impl ExactSizeIterator<Item = &Literal> + '_ {
        self.literals.iter()
    }

    /// Membership test.
    #[must_use]
    pub fn contains(&self, literal: &Literal) -> bool {
        self.literals.contains(literal)
    }

    /// True when the clause holds some literal together with its negation.
    #[must_use]
    pub fn is_tautology(&self) -> bool {
        self.literals
            .iter()
            .filter(|literal| !literal.is_negated())
            .any(|literal| self.literals.contains(&literal.negate()))
    }

    /// Resolves on the first literal of `self` (in scan order) whose negation
    /// occurs in `other`. Returns `None` when no complementary pair exists.
    #[must_use]
    pub fn resolve(&self, other: &Self) -> Option<Self> {
        let pivot = self
            .literals
            .iter()
            .find(|literal| other.literals.contains(&literal.negate()))?;
        let complement = pivot.negate();
        let literals = self
            .literals
            .iter()
            .filter(|literal| *literal != pivot)
            .chain(other.literals.iter().filter(|literal| **literal != complement))
            .copied()
            .collect();
        Some(Self { literals })
    }
}

impl FromIterator<Literal> for Clause {
    fn from_iter<T: IntoIterator<Item = Literal>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.literals.is_empty() {
            return f.write_str("□");
        }
        for (idx, literal) in self.literals.iter().enumerate() {
            if idx > 0 {
                f.write_str(" ∨ ")?;
            }
            write!(f, "{literal}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Predicate;

    fn pit(x: i32, y: i32) -> Literal {
        Literal::positive(Atom::at(Predicate::Pit, x, y))
    }

    fn breeze(x: i32, y: i32) -> Literal {
        Literal::positive(Atom::at(Predicate::Breeze, x, y))
    }

    #[test]
    fn structural_equality_ignores_order() {
        let a = Clause::new([pit(0, 1), breeze(0, 0).negate()]);
        let b = Clause::new([breeze(0, 0).negate(), pit(0, 1), pit(0, 1)]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn resolving_units_yields_empty_clause() {
        let resolvent = Clause::unit(pit(1, 1))
            .resolve(&Clause::unit(pit(1, 1).negate()))
            .unwrap();
        assert!(resolvent.is_empty());
        assert_eq!(resolvent.to_string(), "□");
    }

    #[test]
    fn resolvent_drops_only_the_pivot_pair() {
        let rule = Clause::disjunctive_implication(breeze(0, 0), [pit(1, 0), pit(0, 1)]);
        let fact = Clause::unit(breeze(0, 0));
        let resolvent = fact.resolve(&rule).unwrap();
        assert_eq!(resolvent, Clause::new([pit(1, 0), pit(0, 1)]));
    }

    #[test]
    fn no_complement_means_no_resolvent() {
        let a = Clause::new([pit(0, 1)]);
        let b = Clause::new([pit(0, 1), breeze(0, 0)]);
        assert!(a.resolve(&b).is_none());
    }

    #[test]
    fn implication_negates_antecedents() {
        let safe = Literal::positive(Atom::at(Predicate::Safe, 2, 2));
        let wumpus = Literal::positive(Atom::at(Predicate::Wumpus, 2, 2));
        let clause = Clause::implication([pit(2, 2).negate(), wumpus.negate()], safe);
        assert_eq!(clause, Clause::new([pit(2, 2), wumpus, safe]));
        assert!(!clause.is_tautology());
        assert!(Clause::new([pit(2, 2), pit(2, 2).negate()]).is_tautology());
    }

    #[test]
    fn unit_accessor() {
        assert_eq!(Clause::unit(pit(3, 3)).as_unit(), Some(&pit(3, 3)));
        assert!(Clause::new([pit(3, 3), pit(2, 2)]).as_unit().is_none());
        assert!(Clause::empty().as_unit().is_none());
    }
}

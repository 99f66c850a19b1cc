//! Ground instances of the domain rules.
//!
//! Cell-local rules are instantiated for every cell when an episode starts.
//! Percept rules mention every neighbour of a cell and are only needed once a
//! cell has been observed, so the translator instantiates them lazily.

use wumpus_logic::{Atom, Clause, Literal, Predicate};

use crate::grid::{Grid, Position};

const fn at(predicate: Predicate, cell: Position) -> Atom {
    Atom::at(predicate, cell.x, cell.y)
}

fn pos(predicate: Predicate, cell: Position) -> Literal {
    Literal::positive(at(predicate, cell))
}

fn neg(predicate: Predicate, cell: Position) -> Literal {
    Literal::negative(at(predicate, cell))
}

/// Adjacency fact between two cells.
#[must_use]
pub const fn adjacency(from: Position, to: Position) -> Atom {
    Atom::adjacent(from.x, from.y, to.x, to.y)
}

/// Rules seeded into every fresh knowledge base:
///
/// * `¬Pit(c) ∧ ¬Wumpus(c) → Safe(c)`
/// * `Agent(c) → Safe(c)`
/// * `Adjacent(c, n)` for each in-bounds neighbour
/// * `Safe(c) ∧ Adjacent(c, n) → Reachable(n)`
#[must_use]
pub fn eager_axioms(grid: &Grid) -> Vec<Clause> {
    let mut clauses = Vec::new();
    for cell in grid.cells() {
        clauses.push(Clause::implication(
            [neg(Predicate::Pit, cell), neg(Predicate::Wumpus, cell)],
            pos(Predicate::Safe, cell),
        ));
        clauses.push(Clause::implication(
            [pos(Predicate::Agent, cell)],
            pos(Predicate::Safe, cell),
        ));
        for next in grid.adjacent(cell) {
            let link = adjacency(cell, next);
            clauses.push(Clause::fact(link));
            clauses.push(Clause::implication(
                [pos(Predicate::Safe, cell), Literal::positive(link)],
                pos(Predicate::Reachable, next),
            ));
        }
    }
    clauses
}

/// Percept rules anchored on `cell`:
///
/// * `Breeze(c) → Pit(n1) ∨ … ∨ Pit(nk)` and `Pit(ni) → Breeze(c)`
/// * `Stench(c) → Wumpus(n1) ∨ … ∨ Wumpus(nk)` and `Wumpus(ni) → Stench(c)`
#[must_use]
pub fn percept_axioms(grid: &Grid, cell: Position) -> Vec<Clause> {
    let around: Vec<Position> = grid.adjacent(cell).collect();
    let mut clauses = Vec::with_capacity(2 + 2 * around.len());
    for (cue, hazard) in [
        (Predicate::Breeze, Predicate::Pit),
        (Predicate::Stench, Predicate::Wumpus),
    ] {
        clauses.push(Clause::disjunctive_implication(
            pos(cue, cell),
            around.iter().map(|next| pos(hazard, *next)),
        ));
        clauses.extend(
            around
                .iter()
                .map(|next| Clause::implication([pos(hazard, *next)], pos(cue, cell))),
        );
    }
    clauses
}

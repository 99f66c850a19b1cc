#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rust_2018_idioms,
    missing_docs
)]

//! Propositional knowledge representation: ground literals, clauses, an
//! insertion-ordered clause store, and refutation-based resolution.

/// Error taxonomy for the logic layer.
#[path = "../error.rs"]
pub mod error;

/// Predicates, ground atoms and literals.
#[path = "../literal.rs"]
pub mod literal;

/// Disjunctive clauses and the binary resolution rule.
#[path = "../clause.rs"]
pub mod clause;

/// Duplicate-free clause store backing a knowledge base.
#[path = "../store.rs"]
pub mod store;

/// Saturation-based resolution engine.
#[path = "../engine.rs"]
pub mod engine;

pub use clause::Clause;
pub use engine::{ResolutionConfig, ResolutionEngine, ResolutionOutcome};
pub use error::LogicError;
pub use literal::{Atom, Literal, Predicate};
pub use store::{ClauseStore, KnowledgeSnapshot};

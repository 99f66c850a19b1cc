use thiserror::Error;

use crate::literal::Predicate;

/// Errors surfaced by the logic layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LogicError {
    /// Saturation hit the configured round or clause cap before settling.
    #[error("resolution exhausted after {rounds} rounds with {clauses} clauses")]
    ResolutionExhausted {
        /// Rounds completed when the cap was hit.
        rounds: usize,
        /// Size of the working set when the cap was hit.
        clauses: usize,
    },
    /// An atom was built with the wrong number of arguments.
    #[error("{predicate} takes {expected} arguments, got {found}")]
    ArityMismatch {
        /// Offending predicate.
        predicate: Predicate,
        /// Arity the predicate requires.
        expected: usize,
        /// Arity supplied.
        found: usize,
    },
}

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LogicError;

/// Widest argument tuple any predicate takes (`Adjacent(x, y, nx, ny)`).
pub const MAX_ARITY: usize = 4;

/// Predicate symbols of the grid domain.
///
/// Variant order is the scan order used when resolving, so it is part of the
/// engine's determinism contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Predicate {
    /// `Adjacent(x, y, nx, ny)`: the two cells share an edge.
    Adjacent,
    /// `Agent(x, y)`: the agent stands on the cell.
    Agent,
    /// `Breeze(x, y)`: a breeze is felt on the cell.
    Breeze,
    /// `Gold(x, y)`: the gold lies on the cell.
    Gold,
    /// `Pit(x, y)`: the cell holds a pit.
    Pit,
    /// `Reachable(x, y)`: the cell can be entered along safe cells.
    Reachable,
    /// `Safe(x, y)`: the cell holds no hazard.
    Safe,
    /// `Stench(x, y)`: a stench is smelled on the cell.
    Stench,
    /// `Wumpus(x, y)`: the wumpus lives on the cell.
    Wumpus,
}

impl Predicate {
    /// Number of integer arguments the predicate takes.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Adjacent => 4,
            _ => 2,
        }
    }

    /// Symbol used when printing literals.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Adjacent => "Adjacent",
            Self::Agent => "Agent",
            Self::Breeze => "Breeze",
            Self::Gold => "Gold",
            Self::Pit => "Pit",
            Self::Reachable => "Reachable",
            Self::Safe => "Safe",
            Self::Stench => "Stench",
            Self::Wumpus => "Wumpus",
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A predicate applied to a ground argument tuple.
///
/// Unused argument slots are always zero so derived equality and hashing are
/// structural over the meaningful prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Atom {
    predicate: Predicate,
    args: [i32; MAX_ARITY],
}

impl Atom {
    /// Builds an atom, checking the argument count against the predicate.
    pub fn new(predicate: Predicate, args: &[i32]) -> Result<Self, LogicError> {
        if args.len() != predicate.arity() {
            return Err(LogicError::ArityMismatch {
                predicate,
                expected: predicate.arity(),
                found: args.len(),
            });
        }
        let mut slots = [0; MAX_ARITY];
        slots[..args.len()].copy_from_slice(args);
        Ok(Self {
            predicate,
            args: slots,
        })
    }

    /// Cell atom such as `Pit(x, y)`. Meant for the two-argument predicates.
    #[must_use]
    pub const fn at(predicate: Predicate, x: i32, y: i32) -> Self {
        Self {
            predicate,
            args: [x, y, 0, 0],
        }
    }

    /// `Adjacent(x, y, nx, ny)`.
    #[must_use]
    pub const fn adjacent(x: i32, y: i32, nx: i32, ny: i32) -> Self {
        Self {
            predicate: Predicate::Adjacent,
            args: [x, y, nx, ny],
        }
    }

    /// Predicate symbol.
    #[must_use]
    pub const fn predicate(&self) -> Predicate {
        self.predicate
    }

    /// Meaningful arguments, in order.
    #[must_use]
    pub fn args(&self) -> &[i32] {
        &self.args[..self.predicate.arity()]
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.predicate)?;
        for (idx, arg) in self.args().iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(")")
    }
}

/// An atom or its negation.
///
/// Ordering puts the positive literal of an atom directly before its negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    atom: Atom,
    negated: bool,
}

impl Literal {
    /// Positive literal.
    #[must_use]
    pub const fn positive(atom: Atom) -> Self {
        Self {
            atom,
            negated: false,
        }
    }

    /// Negative literal.
    #[must_use]
    pub const fn negative(atom: Atom) -> Self {
        Self {
            atom,
            negated: true,
        }
    }

    /// The same atom with the opposite sign.
    #[must_use]
    pub const fn negate(&self) -> Self {
        Self {
            atom: self.atom,
            negated: !self.negated,
        }
    }

    /// True when both literals share the atom and differ in sign.
    #[must_use]
    pub fn is_complementary(&self, other: &Self) -> bool {
        self.atom == other.atom && self.negated != other.negated
    }

    /// Underlying atom.
    #[must_use]
    pub const fn atom(&self) -> &Atom {
        &self.atom
    }

    /// Whether the literal carries a negation.
    #[must_use]
    pub const fn is_negated(&self) -> bool {
        self.negated
    }
}

impl From<Atom> for Literal {
    fn from(atom: Atom) -> Self {
        Self::positive(atom)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("¬")?;
        }
        write!(f, "{}", self.atom)
    }
}

use serde_json::json;
use shared_logging::LogLevel;
use wumpus_logic::{Atom, Clause, Literal, Predicate};

use crate::{
    axioms,
    cave::WorldLayout,
    episode::Episode,
    error::WorldError,
    grid::Position,
    percept::{ObjectKind, Percept},
};

/// Turns observations and placed objects into clauses of one episode.
///
/// Every call validates its position first; a rejected call leaves the
/// knowledge base untouched.
#[derive(Debug)]
pub struct Translator<'a> {
    episode: &'a mut Episode,
}

impl<'a> Translator<'a> {
    pub(crate) fn new(episode: &'a mut Episode) -> Self {
        Self { episode }
    }

    /// Feeds one percept. Adds `Stench`, `Breeze` and `Gold` facts for the
    /// flags that are set; cleared flags add nothing.
    pub fn observe(&mut self, position: Position, percept: &Percept) -> Result<(), WorldError> {
        self.episode.grid().check(position)?;
        self.instantiate_percept_axioms(position)?;
        let mut added = 0;
        for (flag, predicate) in [
            (percept.stench, Predicate::Stench),
            (percept.breeze, Predicate::Breeze),
            (percept.glitter, Predicate::Gold),
        ] {
            if flag && self.add(Clause::fact(at(predicate, position))) {
                added += 1;
            }
        }
        self.episode.log(
            LogLevel::Debug,
            "translator.observe",
            json!({ "cell": position, "percept": percept, "added": added }),
        );
        Ok(())
    }

    /// Records cues known to be missing: `¬Stench` and `¬Breeze` for every
    /// cleared flag of a complete reading.
    pub fn observe_absence(
        &mut self,
        position: Position,
        percept: &Percept,
    ) -> Result<(), WorldError> {
        self.episode.grid().check(position)?;
        self.instantiate_percept_axioms(position)?;
        for (flag, predicate) in [
            (percept.stench, Predicate::Stench),
            (percept.breeze, Predicate::Breeze),
        ] {
            if !flag {
                self.add(Clause::unit(Literal::negative(at(predicate, position))));
            }
        }
        Ok(())
    }

    /// Records a ground fact about a placed or revealed object. Returns
    /// whether the fact was new.
    pub fn record_fact(
        &mut self,
        kind: ObjectKind,
        position: Position,
    ) -> Result<bool, WorldError> {
        self.episode.grid().check(position)?;
        let clause = Clause::fact(at(kind.predicate(), position));
        if self.episode.knowledge.contains(&clause) {
            return Ok(false);
        }
        if self.episode.sealed && kind.hazard().is_some() {
            return Err(WorldError::LayoutSealed);
        }
        self.add(clause);
        self.episode.log(
            LogLevel::Debug,
            "translator.fact",
            json!({ "kind": kind, "cell": position }),
        );
        Ok(true)
    }

    /// Records that the agent stands on `position` alive: neither hazard is
    /// there and the cell counts as visited and safe.
    pub fn record_survived(&mut self, position: Position) -> Result<(), WorldError> {
        self.episode.grid().check(position)?;
        for predicate in [Predicate::Pit, Predicate::Wumpus] {
            self.add(Clause::unit(Literal::negative(at(predicate, position))));
        }
        let agent = &mut self.episode.agent;
        agent.visited.insert(position);
        agent.safe_cells.insert(position);
        Ok(())
    }

    /// Adds the percept rules anchored on `position` the first time the cell
    /// is observed. Returns the number of new clauses.
    pub fn instantiate_percept_axioms(&mut self, position: Position) -> Result<usize, WorldError> {
        let grid = *self.episode.grid();
        grid.check(position)?;
        if !self.episode.observed.insert(position) {
            return Ok(0);
        }
        Ok(self
            .episode
            .knowledge
            .extend(axioms::percept_axioms(&grid, position)))
    }

    /// Declares the recorded hazards exhaustive: every cell without a pit
    /// fact gets `¬Pit`, every cell without a wumpus fact gets `¬Wumpus`.
    /// Later hazard facts fail with [`WorldError::LayoutSealed`].
    pub fn seal_layout(&mut self) -> usize {
        let grid = *self.episode.grid();
        let mut added = 0;
        for cell in grid.cells() {
            for predicate in [Predicate::Pit, Predicate::Wumpus] {
                let atom = at(predicate, cell);
                if !self.episode.knowledge.contains(&Clause::fact(atom))
                    && self.add(Clause::unit(Literal::negative(atom)))
                {
                    added += 1;
                }
            }
        }
        self.episode.sealed = true;
        self.episode
            .log(LogLevel::Info, "translator.sealed", json!({ "added": added }));
        added
    }

    /// Records every object of a layout. Returns the number of new facts.
    pub fn disclose_layout(&mut self, layout: &WorldLayout) -> Result<usize, WorldError> {
        let facts = layout.facts();
        for (_, position) in &facts {
            self.episode.grid().check(*position)?;
        }
        let mut added = 0;
        for (kind, position) in facts {
            if self.record_fact(kind, position)? {
                added += 1;
            }
        }
        Ok(added)
    }

    fn add(&mut self, clause: Clause) -> bool {
        self.episode.knowledge.add(clause)
    }
}

const fn at(predicate: Predicate, position: Position) -> Atom {
    Atom::at(predicate, position.x, position.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EpisodeConfig;

    fn episode() -> Episode {
        Episode::new(EpisodeConfig::new(4)).unwrap()
    }

    #[test]
    fn observe_adds_only_positive_cues() {
        let mut episode = episode();
        let cell = Position::new(1, 0);
        let percept = Percept {
            breeze: true,
            glitter: true,
            ..Percept::quiet()
        };
        episode.translator().observe(cell, &percept).unwrap();
        let knowledge = episode.knowledge();
        assert!(knowledge.contains(&Clause::fact(at(Predicate::Breeze, cell))));
        assert!(knowledge.contains(&Clause::fact(at(Predicate::Gold, cell))));
        assert!(!knowledge.contains(&Clause::unit(Literal::negative(at(
            Predicate::Stench,
            cell
        )))));
    }

    #[test]
    fn absence_adds_negative_cues() {
        let mut episode = episode();
        let cell = Position::new(0, 0);
        let percept = Percept {
            stench: true,
            ..Percept::quiet()
        };
        episode.translator().observe_absence(cell, &percept).unwrap();
        let knowledge = episode.knowledge();
        assert!(knowledge.contains(&Clause::unit(Literal::negative(at(
            Predicate::Breeze,
            cell
        )))));
        assert!(!knowledge.contains(&Clause::unit(Literal::negative(at(
            Predicate::Stench,
            cell
        )))));
    }

    #[test]
    fn percept_rules_are_instantiated_once() {
        let mut episode = episode();
        let cell = Position::new(2, 2);
        let first = episode.translator().instantiate_percept_axioms(cell).unwrap();
        assert_eq!(first, 10);
        let second = episode.translator().instantiate_percept_axioms(cell).unwrap();
        assert_eq!(second, 0);
    }

    #[test]
    fn out_of_bounds_calls_leave_knowledge_untouched() {
        let mut episode = episode();
        let before = episode.knowledge().len();
        let outside = Position::new(4, 1);
        let percept = Percept {
            breeze: true,
            ..Percept::quiet()
        };
        let mut translator = episode.translator();
        assert!(translator.observe(outside, &percept).is_err());
        assert!(translator.observe_absence(outside, &percept).is_err());
        assert!(translator.record_fact(ObjectKind::Pit, outside).is_err());
        assert!(translator.record_survived(outside).is_err());
        assert_eq!(episode.knowledge().len(), before);
    }

    #[test]
    fn sealing_rejects_new_hazards() {
        let mut episode = episode();
        let pit = Position::new(2, 1);
        let mut translator = episode.translator();
        assert!(translator.record_fact(ObjectKind::Pit, pit).unwrap());
        assert!(!translator.record_fact(ObjectKind::Pit, pit).unwrap());
        let added = translator.seal_layout();
        // Start cell already carries both negatives.
        assert_eq!(added, 2 * 16 - 2 - 1);
        assert_eq!(
            translator.record_fact(ObjectKind::Wumpus, Position::new(3, 3)),
            Err(WorldError::LayoutSealed)
        );
        assert!(!translator.record_fact(ObjectKind::Pit, pit).unwrap());
        assert!(translator
            .record_fact(ObjectKind::Gold, Position::new(3, 3))
            .unwrap());
        assert!(episode.is_sealed());
    }

    #[test]
    fn disclose_records_whole_layout() {
        let mut episode = episode();
        let layout = WorldLayout {
            wumpus: Some(Position::new(3, 0)),
            gold: Some(Position::new(3, 3)),
            pits: vec![Position::new(1, 1), Position::new(2, 2)],
        };
        assert_eq!(episode.translator().disclose_layout(&layout).unwrap(), 4);
        assert_eq!(episode.translator().disclose_layout(&layout).unwrap(), 0);
        assert!(episode
            .knowledge()
            .contains(&Clause::fact(at(Predicate::Wumpus, Position::new(3, 0)))));
    }
}

use wumpus_logic::{Atom, Clause, Literal, Predicate};
use wumpus_world::{Episode, EpisodeConfig, ObjectKind, Percept, Position, WorldError};

fn safe(x: i32, y: i32) -> Literal {
    Literal::positive(Atom::at(Predicate::Safe, x, y))
}

fn prove(episode: &Episode, query: &Literal) -> bool {
    episode
        .engine()
        .entails(episode.knowledge().all(), query)
        .unwrap()
}

#[test]
fn pit_fact_never_proves_safety() {
    let mut episode = Episode::new(EpisodeConfig::new(4)).unwrap();
    episode
        .translator()
        .record_fact(ObjectKind::Pit, Position::new(1, 1))
        .unwrap();
    assert!(!prove(&episode, &safe(1, 1)));
    assert!(!prove(&episode, &safe(3, 3)));

    for predicate in [Predicate::Pit, Predicate::Wumpus] {
        let negated = Clause::unit(Literal::negative(Atom::at(predicate, 3, 3)));
        assert!(!episode.knowledge().contains(&negated));
    }
    episode.translator().seal_layout();
    assert!(prove(&episode, &safe(3, 3)));
    assert!(!prove(&episode, &safe(1, 1)));
}

#[test]
fn contradictory_units_entail_everything() {
    let mut episode = Episode::new(EpisodeConfig::new(3)).unwrap();
    let cell = Position::new(2, 2);
    episode
        .translator()
        .record_fact(ObjectKind::Wumpus, cell)
        .unwrap();
    episode.translator().record_survived(cell).unwrap();
    assert_eq!(episode.knowledge().conflicting_units().len(), 1);
    assert!(prove(&episode, &safe(1, 2)));
    assert!(prove(
        &episode,
        &Literal::negative(Atom::at(Predicate::Gold, 0, 1))
    ));
}

#[test]
fn repeated_observations_do_not_grow_knowledge() {
    let mut episode = Episode::new(EpisodeConfig::new(4)).unwrap();
    let cell = Position::new(1, 0);
    let percept = Percept {
        stench: true,
        ..Percept::quiet()
    };
    episode.translator().observe(cell, &percept).unwrap();
    episode.translator().observe_absence(cell, &percept).unwrap();
    let size = episode.knowledge().len();
    for _ in 0..3 {
        episode.translator().observe(cell, &percept).unwrap();
        episode.translator().observe_absence(cell, &percept).unwrap();
        episode.translator().record_survived(cell).unwrap();
    }
    assert_eq!(episode.knowledge().len(), size + 2);
}

#[test]
fn absent_breeze_clears_neighbours() {
    let mut episode = Episode::new(EpisodeConfig::new(4)).unwrap();
    let start = Position::new(0, 0);
    episode
        .translator()
        .observe_absence(start, &Percept::quiet())
        .unwrap();
    assert!(episode.oracle().is_safe(Position::new(0, 1)).unwrap());
    assert!(episode.oracle().is_safe(Position::new(1, 0)).unwrap());
    assert!(!episode.oracle().is_safe(Position::new(1, 1)).unwrap());
}

#[test]
fn eight_by_eight_saturation_terminates() {
    let episode = Episode::new(EpisodeConfig::new(8)).unwrap();
    let outcome = episode
        .engine()
        .prove(episode.knowledge().all(), &safe(7, 7))
        .unwrap();
    assert!(!outcome.entailed);
    assert!(outcome.rounds <= episode.config().resolution.max_rounds);
    assert!(outcome.derived.len() < episode.config().resolution.max_clauses);

    let mut sealed = Episode::new(EpisodeConfig::new(8)).unwrap();
    sealed.translator().seal_layout();
    assert!(sealed.oracle().is_safe(Position::new(7, 7)).unwrap());
    assert!(sealed.oracle().is_reachable(Position::new(7, 7)).unwrap());
}

#[test]
fn invalid_positions_are_rejected_without_mutation() {
    let mut episode = Episode::new(EpisodeConfig::new(4)).unwrap();
    let before: Vec<Clause> = episode.knowledge().all().cloned().collect();
    let outside = Position::new(0, 4);
    assert_eq!(
        episode.translator().record_fact(ObjectKind::Gold, outside),
        Err(WorldError::InvalidPosition {
            position: outside,
            grid_size: 4,
        })
    );
    assert!(episode
        .translator()
        .instantiate_percept_axioms(outside)
        .is_err());
    assert!(episode.oracle().is_safe(outside).is_err());
    let after: Vec<Clause> = episode.knowledge().all().cloned().collect();
    assert_eq!(before, after);
}

use zipper_bot::engine::{Engine, EngineConfig, GoalDecision};
use zipper_core::distribution::possible_rolls;
use zipper_core::scoring::{Match, enumerate_matches};

#[test]
fn best_match_never_loses_value_against_banking() {
    let mut engine = Engine::new(EngineConfig::new(2));
    for roll in possible_rolls(3) {
        let choice = engine.best_match(roll, 0.0);
        let top = enumerate_matches(roll)[0];
        if top.is_scoring() {
            assert!(choice.value >= top.score, "roll {roll}: {choice:?}");
            assert!(choice.matched.used.is_subset_of(&roll));
        } else {
            assert_eq!(choice.matched, Match::NONE);
            assert_eq!(choice.value, 0.0);
        }
    }
}

#[test]
fn goal_decisions_are_legal_for_every_roll() {
    let mut engine = Engine::default();
    let goal = 250.0;
    for n in 1..=6 {
        for roll in possible_rolls(n) {
            for pot in [0.0, 100.0, 200.0] {
                match engine.decide(roll, pot, goal) {
                    GoalDecision::NoLegalMove => {
                        assert!(
                            enumerate_matches(roll)
                                .iter()
                                .all(|m| !m.is_scoring() || pot + m.score > goal),
                            "roll {roll} with pot {pot} had a legal move"
                        );
                    }
                    GoalDecision::Bank { matched, turns } | GoalDecision::Reroll { matched, turns } => {
                        assert!(pot + matched.score <= goal);
                        assert!(matched.used.is_subset_of(&roll));
                        assert!(turns >= 0.0);
                    }
                }
            }
        }
    }
}

#[test]
fn nearer_goals_need_fewer_turns() {
    let mut engine = Engine::default();
    let near = engine.expected_turns(6, 0.0, 100.0);
    let far = engine.expected_turns(6, 0.0, 400.0);
    assert!(near < far, "near = {near}, far = {far}");
}

#[test]
fn off_grid_targets_are_unreachable() {
    let mut engine = Engine::default();
    assert!(engine.p_score(6, 50) > 0.0);
    assert_eq!(engine.p_score(6, 75), 0.0);
    assert_eq!(engine.p_score(3, 120), 0.0);
}

use super::Engine;
use zipper_core::model::dice::{Dice, MAX_DICE};
use zipper_core::model::turn::reroll_count;
use zipper_core::scoring::Match;

/// A bust costs `goal / BUST_PENALTY_SCALE` turns.
pub const BUST_PENALTY_SCALE: f64 = 1000.0;

/// Outcome of the goal-relative policy for one roll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GoalDecision {
    /// Nothing in the roll scores without overshooting the goal.
    NoLegalMove,
    /// Take `matched` and end the turn.
    Bank { matched: Match, turns: f64 },
    /// Take `matched` and roll the remaining dice.
    Reroll { matched: Match, turns: f64 },
}

impl GoalDecision {
    pub fn matched(&self) -> Option<Match> {
        match self {
            GoalDecision::NoLegalMove => None,
            GoalDecision::Bank { matched, .. } | GoalDecision::Reroll { matched, .. } => {
                Some(*matched)
            }
        }
    }

    /// Expected turns still needed after this decision.
    pub fn turns(&self) -> Option<f64> {
        match self {
            GoalDecision::NoLegalMove => None,
            GoalDecision::Bank { turns, .. } | GoalDecision::Reroll { turns, .. } => Some(*turns),
        }
    }

    pub fn is_reroll(&self) -> bool {
        matches!(self, GoalDecision::Reroll { .. })
    }

    /// The cheaper way to play `matched`. Banking wins ties.
    pub(crate) fn cheaper(matched: Match, bank_turns: f64, reroll_turns: f64) -> Self {
        if bank_turns <= reroll_turns {
            GoalDecision::Bank {
                matched,
                turns: bank_turns,
            }
        } else {
            GoalDecision::Reroll {
                matched,
                turns: reroll_turns,
            }
        }
    }
}

impl Engine {
    /// Picks the match from `dice` minimising the expected number of turns to
    /// reach `goal` exactly, with `pot` already collected this turn. A match
    /// taking the pot past the goal is never legal.
    pub fn decide(&mut self, dice: Dice, pot: f64, goal: f64) -> GoalDecision {
        let in_hand = dice.len();
        let candidates = self.matches(dice);
        let mut best = GoalDecision::NoLegalMove;
        let mut best_turns = f64::INFINITY;
        for candidate in candidates.iter() {
            if !candidate.is_scoring() {
                continue;
            }
            let banked = pot + candidate.score;
            if banked > goal {
                continue;
            }
            if banked == goal {
                return GoalDecision::Bank {
                    matched: *candidate,
                    turns: 0.0,
                };
            }

            let bank_turns = 1.0 + self.expected_turns(MAX_DICE, 0.0, goal - banked);
            let next = reroll_count(in_hand, candidate.used.len());
            let reroll_turns = self.expected_turns(next, banked, goal);

            // Earlier (higher-scoring) candidates keep ties.
            let option = GoalDecision::cheaper(*candidate, bank_turns, reroll_turns);
            if let Some(turns) = option.turns() {
                if turns < best_turns {
                    best_turns = turns;
                    best = option;
                }
            }
        }
        best
    }

    /// Expected further turns to reach `goal` when about to roll `num_dice`
    /// dice with `pot` collected this turn.
    pub fn expected_turns(&mut self, num_dice: usize, pot: f64, goal: f64) -> f64 {
        let key = (num_dice, pot as i64, goal as i64);
        if let Some(&turns) = self.turns.get(&key) {
            return turns;
        }
        let turns = self.expected_turns_uncached(num_dice, pot, goal);
        self.turns.insert(key, turns);
        turns
    }

    fn expected_turns_uncached(&mut self, num_dice: usize, pot: f64, goal: f64) -> f64 {
        let mut total = 0.0;
        let rolls = self.rolls(num_dice);
        for &(roll, p) in rolls.iter() {
            total += match self.decide(roll, pot, goal).turns() {
                Some(turns) => turns * p,
                None => p * (goal / BUST_PENALTY_SCALE),
            };
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::GoalDecision;
    use crate::engine::Engine;
    use zipper_core::model::dice::Dice;
    use zipper_core::scoring::Match;

    fn dice(faces: &[u8]) -> Dice {
        Dice::from_faces(faces).expect("valid faces")
    }

    #[test]
    fn exact_goal_is_banked() {
        let mut engine = Engine::default();
        let decision = engine.decide(dice(&[1, 2, 3, 4]), 200.0, 300.0);
        assert_eq!(
            decision,
            GoalDecision::Bank {
                matched: Match::new(100.0, dice(&[1])),
                turns: 0.0,
            }
        );
    }

    #[test]
    fn overshooting_moves_are_illegal() {
        let mut engine = Engine::default();
        // Three ones would overshoot; only a single one fits.
        let decision = engine.decide(dice(&[1, 1, 1, 2]), 0.0, 100.0);
        assert_eq!(decision.matched(), Some(Match::new(100.0, dice(&[1]))));
        assert_eq!(decision.turns(), Some(0.0));

        let decision = engine.decide(dice(&[1, 1, 1]), 250.0, 300.0);
        assert_eq!(decision, GoalDecision::NoLegalMove);
    }

    #[test]
    fn bust_roll_has_no_legal_move() {
        let mut engine = Engine::default();
        assert_eq!(
            engine.decide(dice(&[2, 3, 4, 6]), 0.0, 500.0),
            GoalDecision::NoLegalMove
        );
    }

    #[test]
    fn decisions_never_overshoot() {
        let mut engine = Engine::default();
        let goal = 300.0;
        for faces in [
            [1u8, 1, 1, 5, 5, 5],
            [1, 2, 3, 4, 5, 6],
            [2, 2, 4, 4, 6, 6],
            [5, 5, 5, 2, 3, 4],
            [1, 5, 2, 2, 3, 4],
        ] {
            for pot in [0.0, 50.0, 150.0, 250.0] {
                let decision = engine.decide(dice(&faces), pot, goal);
                if let Some(matched) = decision.matched() {
                    assert!(
                        pot + matched.score <= goal,
                        "{faces:?} with pot {pot} picked {matched:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn expected_turns_are_positive_and_cached() {
        let mut engine = Engine::default();
        let turns = engine.expected_turns(6, 0.0, 200.0);
        assert!(turns > 0.0, "turns = {turns}");
        let cached = engine.cache_stats().turns;
        assert_eq!(engine.expected_turns(6, 0.0, 200.0), turns);
        assert_eq!(engine.cache_stats().turns, cached);
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "actual {actual}, expected {expected}"
        );
    }

    #[test]
    fn one_die_to_fifty_costs_the_bust_penalty() {
        let mut engine = Engine::default();
        // A 5 lands on 50. A 1 overshoots and the rest never score, so five
        // faces in six bust at 50 / 1000 turns.
        assert_close(engine.expected_turns(1, 0.0, 50.0), 5.0 / 6.0 * 0.05);
    }

    #[test]
    fn six_dice_to_fifty_need_a_five() {
        let mut engine = Engine::default();
        // Any roll showing a 5 finishes; every other scoring pick overshoots.
        let miss = (5.0f64 / 6.0).powi(6);
        assert_close(engine.expected_turns(6, 0.0, 50.0), miss * 0.05);
    }

    #[test]
    fn reroll_cost_uses_remaining_dice() {
        let mut engine = Engine::default();
        // Banking costs 1 + E(6, 0, 50) ~ 1.017; rolling the last die on 50
        // costs 5/6 of a 100 / 1000 bust.
        let decision = engine.decide(dice(&[5, 2]), 0.0, 100.0);
        assert!(decision.is_reroll(), "{decision:?}");
        assert_eq!(decision.matched(), Some(Match::new(50.0, dice(&[5]))));
        assert_close(decision.turns().expect("turns"), 5.0 / 6.0 * 0.1);
    }

    #[test]
    fn bank_cost_is_one_turn_plus_a_fresh_start() {
        let mut engine = Engine::default();
        // Rolling one die on 1950 busts 5/6 of the time at 2000 / 1000 turns,
        // which is worse than banking and starting over for the last 50.
        let decision = engine.decide(dice(&[5, 2]), 1900.0, 2000.0);
        let fresh = (5.0f64 / 6.0).powi(6) * 0.05;
        match decision {
            GoalDecision::Bank { matched, turns } => {
                assert_eq!(matched, Match::new(50.0, dice(&[5])));
                assert_close(turns, 1.0 + fresh);
            }
            other => panic!("expected a bank, got {other:?}"),
        }
        assert_close(engine.expected_turns(1, 1950.0, 2000.0), 5.0 / 6.0 * 2.0);
    }

    #[test]
    fn ties_go_to_banking() {
        let pick = Match::new(50.0, dice(&[5]));
        assert_eq!(
            GoalDecision::cheaper(pick, 1.25, 1.25),
            GoalDecision::Bank {
                matched: pick,
                turns: 1.25,
            }
        );
        assert!(GoalDecision::cheaper(pick, 1.25, 1.0).is_reroll());
        assert!(!GoalDecision::cheaper(pick, 1.0, 1.25).is_reroll());
    }

    #[test]
    fn reroll_flag_matches_variant() {
        let mut engine = Engine::default();
        let decision = engine.decide(dice(&[5, 2, 3, 4, 6, 6]), 0.0, 500.0);
        match decision {
            GoalDecision::Reroll { matched, .. } | GoalDecision::Bank { matched, .. } => {
                assert_eq!(matched.used, dice(&[5]));
                assert_eq!(decision.is_reroll(), matches!(decision, GoalDecision::Reroll { .. }));
            }
            GoalDecision::NoLegalMove => panic!("a single five is legal"),
        }
    }
}

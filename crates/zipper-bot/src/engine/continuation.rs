use super::Engine;
use tracing::{Level, event};
use zipper_core::model::dice::Dice;
use zipper_core::model::turn::reroll_count;
use zipper_core::scoring::Match;

/// Best match for a roll under the open-ended continuation framing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Choice {
    pub matched: Match,
    pub value: f64,
    /// `false` when stopping with `matched` is worth at least as much as
    /// rolling on.
    pub reroll: bool,
}

impl Choice {
    const NONE: Choice = Choice {
        matched: Match::NONE,
        value: 0.0,
        reroll: false,
    };
}

impl Engine {
    /// Best match to take from `dice` with `delta` points already on the
    /// line, and the expected value of taking it.
    pub fn best_match(&mut self, dice: Dice, delta: f64) -> Choice {
        self.best_match_at(dice, delta, 0)
    }

    /// Expected value of a fresh roll of `num_dice` dice played optimally.
    pub fn expected_value(&mut self, num_dice: usize) -> f64 {
        self.expected(num_dice, 0).0
    }

    /// Expected value of rolling `num_dice` dice at `depth`, and the
    /// probability that the roll scores at all.
    ///
    /// An entry cached at any depth `<= depth` answers the query, the
    /// shallowest first. Such an entry was computed with more remaining
    /// budget, not less, so this is an approximation rather than an exact
    /// cache hit.
    pub(crate) fn expected(&mut self, num_dice: usize, depth: usize) -> (f64, f64) {
        for d in 0..=depth {
            if let Some(&hit) = self.continuation.get(&(num_dice, d)) {
                return hit;
            }
        }
        let result = self.expected_uncached(num_dice, depth);
        self.continuation.insert((num_dice, depth), result);
        result
    }

    fn expected_uncached(&mut self, num_dice: usize, depth: usize) -> (f64, f64) {
        if depth >= self.config.max_depth() {
            return (0.0, 0.0);
        }
        let mut expected = 0.0;
        let mut p_score = 0.0;
        let rolls = self.rolls(num_dice);
        for &(roll, p) in rolls.iter() {
            let choice = self.best_match_at(roll, 0.0, depth + 1);
            if choice.value > 0.0 {
                expected += choice.value * p;
                p_score += p;
            }
        }
        (expected, p_score)
    }

    fn best_match_at(&mut self, dice: Dice, delta: f64, depth: usize) -> Choice {
        let in_hand = dice.len();
        let candidates = self.matches(dice);
        let mut best = Choice::NONE;
        for (idx, candidate) in candidates.iter().enumerate() {
            if !candidate.is_scoring() {
                continue;
            }
            let next = reroll_count(in_hand, candidate.used.len());
            let (expected, p) = self.expected(next, depth);
            let carried = candidate.score + delta;
            let rolling = p * carried + expected;
            // Only the top match may stop: it sets aside every scoring die.
            let (value, reroll) = if idx == 0 && carried >= rolling {
                (carried, false)
            } else {
                (rolling, true)
            };
            if depth == 0 && tracing::enabled!(Level::TRACE) {
                event!(
                    target: "zipper_bot::engine",
                    Level::TRACE,
                    roll = %dice,
                    used = %candidate.used,
                    score = candidate.score,
                    delta,
                    value,
                    reroll,
                );
            }
            if value > best.value {
                best = Choice {
                    matched: *candidate,
                    value,
                    reroll,
                };
            }
        }
        best
    }
}

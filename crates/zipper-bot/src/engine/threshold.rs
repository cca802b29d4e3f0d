use super::Engine;
use zipper_core::model::turn::reroll_count;

/// Scores move in steps of 50 points.
pub const SCORE_STEP: u32 = 50;

impl Engine {
    /// Probability of banking at least `target` points in a single turn that
    /// starts by rolling `num_dice` dice. Non-positive targets yield 0.
    pub fn p_score(&mut self, num_dice: usize, target: i64) -> f64 {
        let key = (num_dice, target);
        if let Some(&p) = self.threshold.get(&key) {
            return p;
        }
        let p = self.p_score_uncached(num_dice, target);
        self.threshold.insert(key, p);
        p
    }

    /// `p_score` for every target `50, 100, ..., max_score`.
    pub fn threshold_curve(&mut self, num_dice: usize, max_score: u32) -> Vec<(u32, f64)> {
        (1..=max_score / SCORE_STEP)
            .map(|step| {
                let target = step * SCORE_STEP;
                (target, self.p_score(num_dice, target as i64))
            })
            .collect()
    }

    fn p_score_uncached(&mut self, num_dice: usize, target: i64) -> f64 {
        if target <= 0 {
            return 0.0;
        }
        let mut total = 0.0;
        let rolls = self.rolls(num_dice);
        for &(roll, prob) in rolls.iter() {
            let candidates = self.matches(roll);
            let mut best = 0.0;
            for (idx, candidate) in candidates.iter().enumerate() {
                if !candidate.is_scoring() {
                    continue;
                }
                let points = candidate.score as i64;
                if points > target {
                    continue;
                }
                if idx == 0 && points == target {
                    best = prob;
                    break;
                }
                let next = reroll_count(num_dice, candidate.used.len());
                let p = prob * self.p_score(next, target - points);
                if p > best {
                    best = p;
                }
            }
            total += best;
        }
        total
    }
}

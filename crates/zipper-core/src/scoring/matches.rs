use std::collections::{BTreeMap, BTreeSet};

use super::rule::score;
use crate::model::dice::Dice;
use serde::{Deserialize, Serialize};

/// One way to bank points from a roll: the points and the dice set aside.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub score: f64,
    pub used: Dice,
}

impl Match {
    /// The "bank nothing" entry.
    pub const NONE: Match = Match {
        score: 0.0,
        used: Dice::EMPTY,
    };

    pub const fn new(score: f64, used: Dice) -> Self {
        Self { score, used }
    }

    pub fn is_scoring(&self) -> bool {
        self.score > 0.0
    }

    /// Extends this match with another scoring pick.
    pub fn with(self, pick: Dice, points: f64) -> Self {
        Self {
            score: self.score + points,
            used: self.used + pick,
        }
    }
}

/// Every distinct sub-multiset of `roll` that scores on its own.
pub fn scoring_combos(roll: &Dice) -> Vec<Dice> {
    let positions = roll.len() as u32;
    let mut seen = BTreeSet::new();
    let mut combos = Vec::new();
    for mask in 1..(1u32 << positions) {
        let combo = roll.mask(mask);
        if seen.insert(combo) && score(&combo) > 0.0 {
            combos.push(combo);
        }
    }
    combos
}

/// Enumerates every achievable `(score, used)` pair for `roll`, keeping the
/// best score for each distinct set of dice used. Sorted by score
/// descending; the last entry is always [`Match::NONE`].
pub fn enumerate_matches(roll: Dice) -> Vec<Match> {
    let mut best: BTreeMap<Dice, f64> = BTreeMap::new();
    let mut stack = vec![(roll, Match::NONE)];

    while let Some((remainder, current)) = stack.pop() {
        match best.get(&current.used) {
            Some(&seen) if seen >= current.score => continue,
            _ => {
                best.insert(current.used, current.score);
            }
        }
        if remainder.is_empty() {
            continue;
        }
        for combo in scoring_combos(&remainder) {
            let points = score(&combo);
            stack.push((remainder - combo, current.with(combo, points)));
        }
    }

    let mut matches: Vec<Match> = best
        .into_iter()
        .map(|(used, score)| Match::new(score, used))
        .collect();
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches
}

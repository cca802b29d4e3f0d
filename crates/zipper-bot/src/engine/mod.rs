//! Memoized expectation engine for the Zipper turn.
//!
//! - `continuation`: expected value of continuing from a fresh roll, and the
//!   open-ended best-match policy built on it.
//! - `threshold`: probability of reaching a target score within one turn.
//! - `turns`: expected turns to reach a goal exactly, and the goal-relative
//!   decision policy.
//!
//! Every recurrence is a pure function of its key, so each cache entry is
//! computed once and never changes. An engine is not meant to be shared
//! between threads; build one per agent.

mod continuation;
mod threshold;
mod turns;

pub use continuation::Choice;
pub use turns::{BUST_PENALTY_SCALE, GoalDecision};

use std::collections::HashMap;
use std::rc::Rc;

use tracing::{Level, event};
use zipper_core::distribution::roll_distribution;
use zipper_core::model::dice::Dice;
use zipper_core::scoring::{Match, enumerate_matches};

pub const DEFAULT_MAX_DEPTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    max_depth: usize,
}

impl EngineConfig {
    pub const fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn from_env() -> Self {
        Self::from_reader(|key| std::env::var(key).ok())
    }

    /// Number of future rolls the continuation search models.
    pub const fn max_depth(self) -> usize {
        self.max_depth
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let max_depth = read("ZIPPER_MAX_DEPTH")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|depth| *depth > 0)
            .unwrap_or(DEFAULT_MAX_DEPTH);
        Self { max_depth }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

/// Entry counts for each cache, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub rolls: usize,
    pub matches: usize,
    pub continuation: usize,
    pub threshold: usize,
    pub turns: usize,
}

#[derive(Debug, Default)]
pub struct Engine {
    config: EngineConfig,
    rolls: HashMap<usize, Rc<[(Dice, f64)]>>,
    matches: HashMap<Dice, Rc<[Match]>>,
    /// (dice, depth) -> (expected value, probability of scoring)
    continuation: HashMap<(usize, usize), (f64, f64)>,
    /// (dice, target) -> probability
    threshold: HashMap<(usize, i64), f64>,
    /// (dice, pot, goal) -> expected turns
    turns: HashMap<(usize, i64, i64), f64>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            rolls: self.rolls.len(),
            matches: self.matches.len(),
            continuation: self.continuation.len(),
            threshold: self.threshold.len(),
            turns: self.turns.len(),
        }
    }

    pub fn log_cache_stats(&self, label: &str) {
        if !tracing::enabled!(Level::DEBUG) {
            return;
        }
        let stats = self.cache_stats();
        event!(
            target: "zipper_bot::engine",
            Level::DEBUG,
            label,
            max_depth = self.config.max_depth(),
            rolls = stats.rolls,
            matches = stats.matches,
            continuation = stats.continuation,
            threshold = stats.threshold,
            turns = stats.turns,
        );
    }

    /// Weighted outcomes of rolling `num_dice` dice.
    pub(crate) fn rolls(&mut self, num_dice: usize) -> Rc<[(Dice, f64)]> {
        self.rolls
            .entry(num_dice)
            .or_insert_with(|| roll_distribution(num_dice).into())
            .clone()
    }

    /// Enumerated matches for `roll`, best first, ending with `Match::NONE`.
    pub(crate) fn matches(&mut self, roll: Dice) -> Rc<[Match]> {
        self.matches
            .entry(roll)
            .or_insert_with(|| enumerate_matches(roll).into())
            .clone()
    }
}

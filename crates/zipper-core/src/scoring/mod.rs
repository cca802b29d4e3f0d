//! Point values for dice.
//!
//! - `rule`: the scoring table, applied to exact multisets only.
//! - `matches`: every way a full roll can be split into scoring picks.

mod matches;
mod rule;

pub use matches::{Match, enumerate_matches, scoring_combos};
pub use rule::{Pattern, score};

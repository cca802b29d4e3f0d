//! Dice, scoring and roll probabilities for the Zipper dice game.

pub mod distribution;
pub mod model;
pub mod scoring;

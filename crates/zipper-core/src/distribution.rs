//! Exact outcome distribution for rolling a handful of dice.

use crate::model::dice::{Dice, FACES};

/// Every distinct multiset obtainable by rolling `num_dice` dice, in face
/// order (face 1 counts ascending first).
pub fn possible_rolls(num_dice: usize) -> Vec<Dice> {
    let mut rolls = Vec::new();
    fill_rolls(1, 0, num_dice, Dice::EMPTY, &mut rolls);
    rolls
}

fn fill_rolls(face: u8, len: usize, goal_len: usize, partial: Dice, out: &mut Vec<Dice>) {
    if face as usize > FACES {
        // A choice sequence that falls short of `goal_len` is simply dropped.
        if len == goal_len {
            out.push(partial);
        }
        return;
    }
    for freq in 0..=(goal_len - len) {
        fill_rolls(
            face + 1,
            len + freq,
            goal_len,
            partial.with_freq(face, freq as u8),
            out,
        );
    }
}

/// Probability of rolling exactly `dice`: the multinomial mass
/// `n! / prod(count!) / 6^n`.
pub fn probability(dice: &Dice) -> f64 {
    let n = dice.len();
    let mut mass = factorial(n);
    for &count in dice.counts() {
        mass /= factorial(count as usize);
    }
    mass / (FACES as f64).powi(n as i32)
}

/// The distribution of `num_dice` dice as `(roll, probability)` pairs.
pub fn roll_distribution(num_dice: usize) -> Vec<(Dice, f64)> {
    possible_rolls(num_dice)
        .into_iter()
        .map(|roll| {
            let p = probability(&roll);
            (roll, p)
        })
        .collect()
}

fn factorial(n: usize) -> f64 {
    (1..=n).fold(1.0, |acc, k| acc * k as f64)
}

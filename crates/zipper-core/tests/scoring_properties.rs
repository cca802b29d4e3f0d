use std::collections::HashSet;

use zipper_core::distribution::{possible_rolls, roll_distribution};
use zipper_core::model::dice::Dice;
use zipper_core::scoring::{Match, enumerate_matches, score};

fn expected_points(dice: &Dice) -> f64 {
    let mut counts: Vec<u8> = dice.counts().iter().copied().filter(|&c| c > 0).collect();
    counts.sort_unstable();
    match (dice.len(), counts.as_slice()) {
        (6, [1, 1, 1, 1, 1, 1]) => 1500.0,
        (6, [6]) => 2000.0,
        (6, [2, 2, 2]) => 750.0,
        (3, [3]) if dice.freq(1) == 3 => 1000.0,
        (3, [3]) => {
            let face = (2..=6).find(|&f| dice.freq(f) == 3).expect("triple face");
            100.0 * face as f64
        }
        (1, _) if dice.freq(1) == 1 => 100.0,
        (1, _) if dice.freq(5) == 1 => 50.0,
        _ => 0.0,
    }
}

#[test]
fn scoring_rule_matches_table_for_every_multiset() {
    for n in 0..=6 {
        for roll in possible_rolls(n) {
            assert_eq!(score(&roll), expected_points(&roll), "roll {roll}");
            if matches!(n, 2 | 4 | 5) {
                assert_eq!(score(&roll), 0.0, "roll {roll}");
            }
        }
    }
}

#[test]
fn enumerator_invariants_hold_for_every_roll() {
    for n in 1..=6 {
        for roll in possible_rolls(n) {
            let matches = enumerate_matches(roll);
            assert_eq!(matches.last(), Some(&Match::NONE), "roll {roll}");

            let unique: HashSet<Dice> = matches.iter().map(|m| m.used).collect();
            assert_eq!(unique.len(), matches.len(), "roll {roll}");

            for m in &matches {
                assert!(m.used.is_subset_of(&roll), "roll {roll}, used {}", m.used);
                assert!(m.score >= score(&m.used), "roll {roll}, used {}", m.used);
            }

            let top = matches[0].score;
            assert!(matches.iter().all(|m| m.score <= top));
        }
    }
}

#[test]
fn scoring_mass_of_six_dice() {
    // Probability that six dice contain any scoring pick.
    let p: f64 = roll_distribution(6)
        .into_iter()
        .filter(|(roll, _)| enumerate_matches(*roll)[0].is_scoring())
        .map(|(_, p)| p)
        .sum();
    let bust = 1.0 - p;
    // Six dice without a 1, a 5, a triple, or three pairs.
    assert!(bust > 0.0 && bust < 0.05, "bust probability {bust}");
}

#[test]
fn add_then_sub_restores_every_contained_multiset() {
    for n in 0..=6 {
        for roll in possible_rolls(n) {
            for mask in 0..(1u32 << n) {
                let part = roll.mask(mask);
                assert!(part.is_subset_of(&roll), "{part} not in {roll}");
                assert_eq!((roll + part) - part, roll, "roll {roll}, part {part}");
                assert_eq!((roll - part) + part, roll, "roll {roll}, part {part}");
                assert_eq!(roll.checked_sub(part).map(|rest| rest + part), Some(roll));
            }
        }
    }
}

use crate::model::dice::Dice;
use core::fmt;
use serde::Serialize;

/// Scoring patterns, matched against an *exact* multiset.
///
/// | Pattern        | Dice | Points     |
/// |----------------|------|------------|
/// | Straight       | 6    | 1500       |
/// | Six of a kind  | 6    | 2000       |
/// | Three pairs    | 6    | 750        |
/// | Three ones     | 3    | 1000       |
/// | Three of a kind| 3    | 100 × face |
/// | Single one     | 1    | 100        |
/// | Single five    | 1    | 50         |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    Straight,
    SixOfAKind,
    ThreePairs,
    ThreeOnes,
    ThreeOfAKind { face: u8 },
    SingleOne,
    SingleFive,
}

impl Pattern {
    /// Classifies `dice` as a whole. Extra unrelated dice make the multiset
    /// match nothing.
    pub fn classify(dice: &Dice) -> Option<Pattern> {
        let count = dice.len();
        let distinct = dice.distinct();
        match count {
            6 if distinct == 6 => Some(Pattern::Straight),
            6 if distinct == 1 => Some(Pattern::SixOfAKind),
            6 if dice.counts().iter().filter(|&&c| c == 2).count() == 3 => {
                Some(Pattern::ThreePairs)
            }
            3 if dice.freq(1) == 3 => Some(Pattern::ThreeOnes),
            3 if distinct == 1 => match (2..=6).find(|&face| dice.freq(face) > 0) {
                Some(face) => Some(Pattern::ThreeOfAKind { face }),
                None => unreachable!("three of a kind without a face: {dice}"),
            },
            1 if dice.freq(1) == 1 => Some(Pattern::SingleOne),
            1 if dice.freq(5) == 1 => Some(Pattern::SingleFive),
            _ => None,
        }
    }

    pub fn points(self) -> f64 {
        match self {
            Pattern::Straight => 1500.0,
            Pattern::SixOfAKind => 2000.0,
            Pattern::ThreePairs => 750.0,
            Pattern::ThreeOnes => 1000.0,
            Pattern::ThreeOfAKind { face } => 100.0 * face as f64,
            Pattern::SingleOne => 100.0,
            Pattern::SingleFive => 50.0,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Straight => f.write_str("straight"),
            Pattern::SixOfAKind => f.write_str("six of a kind"),
            Pattern::ThreePairs => f.write_str("three pairs"),
            Pattern::ThreeOnes => f.write_str("three ones"),
            Pattern::ThreeOfAKind { face } => write!(f, "three {face}s"),
            Pattern::SingleOne => f.write_str("single one"),
            Pattern::SingleFive => f.write_str("single five"),
        }
    }
}

/// Points for an exact multiset, 0 when it matches no pattern.
pub fn score(dice: &Dice) -> f64 {
    Pattern::classify(dice).map_or(0.0, Pattern::points)
}

#[cfg(test)]
mod tests {
    use super::{Pattern, score};
    use crate::model::dice::Dice;

    fn dice(faces: &[u8]) -> Dice {
        Dice::from_faces(faces).expect("valid faces")
    }

    #[test]
    fn six_dice_patterns() {
        assert_eq!(score(&dice(&[1, 2, 3, 4, 5, 6])), 1500.0);
        assert_eq!(score(&dice(&[4, 4, 4, 4, 4, 4])), 2000.0);
        assert_eq!(score(&dice(&[2, 2, 4, 4, 6, 6])), 750.0);
        assert_eq!(score(&dice(&[1, 1, 5, 5, 3, 3])), 750.0);
    }

    #[test]
    fn three_dice_patterns() {
        assert_eq!(score(&dice(&[1, 1, 1])), 1000.0);
        for face in 2..=6u8 {
            assert_eq!(score(&dice(&[face; 3])), 100.0 * face as f64);
        }
    }

    #[test]
    fn single_dice_patterns() {
        assert_eq!(score(&dice(&[1])), 100.0);
        assert_eq!(score(&dice(&[5])), 50.0);
        for face in [2u8, 3, 4, 6] {
            assert_eq!(score(&dice(&[face])), 0.0);
        }
    }

    #[test]
    fn non_matching_multisets_score_zero() {
        assert_eq!(score(&Dice::EMPTY), 0.0);
        assert_eq!(score(&dice(&[1, 1])), 0.0);
        assert_eq!(score(&dice(&[1, 5])), 0.0);
        assert_eq!(score(&dice(&[1, 1, 1, 1])), 0.0);
        assert_eq!(score(&dice(&[5, 5, 5, 5, 5])), 0.0);
        assert_eq!(score(&dice(&[1, 1, 5])), 0.0);
        assert_eq!(score(&dice(&[1, 1, 1, 2, 2, 2])), 0.0);
        assert_eq!(score(&dice(&[2, 2, 2, 2, 3, 3])), 0.0);
        assert_eq!(score(&dice(&[1, 2, 3, 4, 5, 5])), 0.0);
    }

    #[test]
    fn patterns_are_named() {
        assert_eq!(
            Pattern::classify(&dice(&[4, 4, 4])),
            Some(Pattern::ThreeOfAKind { face: 4 })
        );
        assert_eq!(Pattern::ThreeOfAKind { face: 4 }.to_string(), "three 4s");
        assert_eq!(Pattern::classify(&dice(&[3])), None);
    }
}

use core::fmt;
use core::ops::{Add, Sub};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of faces on a die, and the most dice a player ever holds.
pub const FACES: usize = 6;
pub const MAX_DICE: usize = 6;

/// Multiset of dice faces. Index `i` holds the count of face `i + 1`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "[u8; FACES]", into = "[u8; FACES]")]
pub struct Dice([u8; FACES]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("die face {face} is not in range 1-6")]
    FaceOutOfRange { face: u8 },
    #[error("{count} dice exceeds the maximum of six")]
    TooManyDice { count: usize },
}

impl Dice {
    pub const EMPTY: Dice = Dice([0; FACES]);

    /// Builds a multiset from per-face counts, e.g. `[2, 0, 0, 0, 1, 0]`.
    pub fn try_from_counts(counts: [u8; FACES]) -> Result<Self, DiceError> {
        let count = total(&counts);
        if count > MAX_DICE {
            return Err(DiceError::TooManyDice { count });
        }
        Ok(Self(counts))
    }

    /// Builds a multiset from individual face values, e.g. `[1, 1, 5]`.
    pub fn from_faces(faces: &[u8]) -> Result<Self, DiceError> {
        if faces.len() > MAX_DICE {
            return Err(DiceError::TooManyDice { count: faces.len() });
        }
        let mut counts = [0u8; FACES];
        for &face in faces {
            if !(1..=FACES as u8).contains(&face) {
                return Err(DiceError::FaceOutOfRange { face });
            }
            counts[face as usize - 1] += 1;
        }
        Ok(Self(counts))
    }

    pub const fn counts(&self) -> &[u8; FACES] {
        &self.0
    }

    /// Count of dice showing `face` (1-6).
    pub fn freq(&self, face: u8) -> u8 {
        debug_assert!((1..=FACES as u8).contains(&face));
        self.0[face as usize - 1]
    }

    pub(crate) fn with_freq(mut self, face: u8, freq: u8) -> Self {
        debug_assert!((1..=FACES as u8).contains(&face));
        self.0[face as usize - 1] = freq;
        self
    }

    pub fn len(&self) -> usize {
        self.0.iter().map(|&count| count as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&count| count == 0)
    }

    /// Number of faces that appear at least once.
    pub fn distinct(&self) -> usize {
        self.0.iter().filter(|&&count| count > 0).count()
    }

    /// Entrywise `self <= other`.
    pub fn is_subset_of(&self, other: &Dice) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a <= b)
    }

    pub fn checked_sub(self, other: Dice) -> Option<Dice> {
        let mut counts = self.0;
        for (slot, &taken) in counts.iter_mut().zip(other.0.iter()) {
            *slot = slot.checked_sub(taken)?;
        }
        Some(Dice(counts))
    }

    /// Selects dice by position. Positions run over the faces in ascending
    /// order, so `[1, 2, 3].mask(0b101)` is `[1, 3]`.
    pub fn mask(&self, mask: u32) -> Dice {
        let mut result = [0u8; FACES];
        let mut position = 0;
        for (slot, &count) in result.iter_mut().zip(self.0.iter()) {
            for _ in 0..count {
                if mask & (1 << position) != 0 {
                    *slot += 1;
                }
                position += 1;
            }
        }
        Dice(result)
    }

    /// Face values in ascending order.
    pub fn faces(&self) -> impl Iterator<Item = u8> + '_ {
        self.0
            .iter()
            .enumerate()
            .flat_map(|(idx, &count)| std::iter::repeat_n(idx as u8 + 1, count as usize))
    }
}

impl Add for Dice {
    type Output = Dice;

    fn add(self, other: Dice) -> Dice {
        let mut counts = self.0;
        for (slot, &extra) in counts.iter_mut().zip(other.0.iter()) {
            *slot += extra;
        }
        Dice(counts)
    }
}

impl Sub for Dice {
    type Output = Dice;

    /// Panics when `other` is not contained in `self`.
    fn sub(self, other: Dice) -> Dice {
        match self.checked_sub(other) {
            Some(rest) => rest,
            None => panic!("invalid subtraction: {other} is not contained in {self}"),
        }
    }
}

const fn total(counts: &[u8; FACES]) -> usize {
    let mut sum = 0;
    let mut idx = 0;
    while idx < FACES {
        sum += counts[idx] as usize;
        idx += 1;
    }
    sum
}

impl TryFrom<[u8; FACES]> for Dice {
    type Error = DiceError;

    fn try_from(counts: [u8; FACES]) -> Result<Self, Self::Error> {
        Dice::try_from_counts(counts)
    }
}

impl From<Dice> for [u8; FACES] {
    fn from(dice: Dice) -> Self {
        dice.0
    }
}

impl TryFrom<&[u8]> for Dice {
    type Error = DiceError;

    fn try_from(faces: &[u8]) -> Result<Self, Self::Error> {
        Dice::from_faces(faces)
    }
}

impl fmt::Display for Dice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (idx, face) in self.faces().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{face}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::{Dice, DiceError};

    fn dice(faces: &[u8]) -> Dice {
        Dice::from_faces(faces).expect("valid faces")
    }

    #[test]
    fn counts_faces() {
        let roll = dice(&[1, 1, 5, 6]);
        assert_eq!(roll.freq(1), 2);
        assert_eq!(roll.freq(5), 1);
        assert_eq!(roll.freq(3), 0);
        assert_eq!(roll.len(), 4);
        assert_eq!(roll.distinct(), 3);
    }

    #[test]
    fn rejects_out_of_range_faces() {
        assert_eq!(
            Dice::from_faces(&[1, 7]),
            Err(DiceError::FaceOutOfRange { face: 7 })
        );
        assert_eq!(
            Dice::from_faces(&[0]),
            Err(DiceError::FaceOutOfRange { face: 0 })
        );
        assert_eq!(
            Dice::from_faces(&[1; 7]),
            Err(DiceError::TooManyDice { count: 7 })
        );
    }

    #[test]
    fn mask_selects_positions_in_face_order() {
        let roll = dice(&[3, 1, 2]);
        assert_eq!(roll.mask(0b101), dice(&[1, 3]));
        assert_eq!(roll.mask(0b010), dice(&[2]));
        assert_eq!(roll.mask(0), Dice::EMPTY);
    }

    #[test]
    fn add_and_sub_are_inverse() {
        let whole = dice(&[1, 1, 2, 5, 5, 6]);
        let part = dice(&[1, 5, 6]);
        assert_eq!((whole + part) - part, whole);
        assert_eq!((whole - part) + part, whole);
        assert!(part.is_subset_of(&whole));
        assert!(!whole.is_subset_of(&part));
    }

    #[test]
    #[should_panic(expected = "invalid subtraction")]
    fn sub_panics_when_not_contained() {
        let _ = dice(&[1, 2]) - dice(&[3]);
    }

    #[test]
    fn checked_sub_reports_missing_dice() {
        assert_eq!(dice(&[1, 2]).checked_sub(dice(&[3])), None);
        assert_eq!(dice(&[1, 2]).checked_sub(dice(&[2])), Some(dice(&[1])));
    }

    #[test]
    fn displays_sorted_faces() {
        assert_eq!(dice(&[6, 1, 5, 1]).to_string(), "[1 1 5 6]");
        assert_eq!(Dice::EMPTY.to_string(), "[]");
    }

    #[test]
    fn serializes_as_count_array() {
        let json = serde_json::to_string(&dice(&[1, 5, 5])).expect("serialize");
        assert_eq!(json, "[1,0,0,0,2,0]");
        let back: Dice = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, dice(&[1, 5, 5]));
        assert!(serde_json::from_str::<Dice>("[4,0,0,0,3,0]").is_err());
    }

    #[test]
    fn counts_are_capped_at_six_dice() {
        assert_eq!(
            Dice::try_from_counts([2, 0, 0, 0, 1, 0]),
            Ok(dice(&[1, 1, 5]))
        );
        assert_eq!(Dice::try_from_counts([0; 6]), Ok(Dice::EMPTY));
        assert_eq!(
            Dice::try_from_counts([6, 0, 0, 0, 0, 1]),
            Err(DiceError::TooManyDice { count: 7 })
        );
        assert_eq!(
            Dice::try_from_counts([255, 255, 0, 0, 0, 0]),
            Err(DiceError::TooManyDice { count: 510 })
        );
    }
}

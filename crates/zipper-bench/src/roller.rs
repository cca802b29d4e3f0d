use rand::{Rng, SeedableRng, rngs::StdRng};
use zipper_core::model::dice::{Dice, DiceError, FACES, MAX_DICE};

/// Throws fair six-sided dice from a seeded stream.
#[derive(Debug, Clone)]
pub struct DiceRoller {
    rng: StdRng,
}

impl DiceRoller {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Rolls `count` dice. Nobody holds more than six.
    pub fn roll(&mut self, count: usize) -> Result<Dice, DiceError> {
        if count > MAX_DICE {
            return Err(DiceError::TooManyDice { count });
        }
        let mut counts = [0u8; FACES];
        for _ in 0..count {
            counts[self.rng.gen_range(0..FACES)] += 1;
        }
        Dice::try_from_counts(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::DiceRoller;
    use zipper_core::model::dice::DiceError;

    #[test]
    fn rolls_requested_number_of_dice() {
        let mut roller = DiceRoller::seeded(7);
        for count in 0..=6 {
            assert_eq!(roller.roll(count).expect("in range").len(), count);
        }
        assert_eq!(roller.roll(9), Err(DiceError::TooManyDice { count: 9 }));
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = DiceRoller::seeded(99);
        let mut b = DiceRoller::seeded(99);
        for _ in 0..50 {
            assert_eq!(a.roll(6).expect("six dice"), b.roll(6).expect("six dice"));
        }
    }

    #[test]
    fn every_face_shows_up() {
        let mut roller = DiceRoller::seeded(1);
        let mut seen = [0u32; 6];
        for _ in 0..200 {
            let dice = roller.roll(6).expect("six dice");
            for face in 1..=6u8 {
                seen[usize::from(face - 1)] += u32::from(dice.freq(face));
            }
        }
        assert!(seen.iter().all(|&n| n > 0), "seen = {seen:?}");
    }
}

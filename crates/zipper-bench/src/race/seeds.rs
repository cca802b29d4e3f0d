use rand::{RngCore, SeedableRng, rngs::StdRng};

/// Per-game dice seeds drawn from the run seed. Every agent replays the same
/// seed for a given game, so results pair up game by game.
pub struct GameSeeds {
    rng: StdRng,
    remaining: usize,
}

impl GameSeeds {
    pub fn new(run_seed: u64, games: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(run_seed),
            remaining: games,
        }
    }
}

impl Iterator for GameSeeds {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.rng.next_u64())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for GameSeeds {}

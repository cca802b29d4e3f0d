pub mod dice;
pub mod turn;

pub use dice::{Dice, DiceError, FACES, MAX_DICE};
pub use turn::{Turn, TurnError, TurnPhase, reroll_count};

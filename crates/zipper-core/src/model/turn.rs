use crate::model::dice::{Dice, MAX_DICE};
use crate::scoring::Match;
use serde::Serialize;
use thiserror::Error;

/// Dice to roll next after setting aside `used` of `in_hand` dice. Using every
/// held die earns a fresh hand of six.
pub const fn reroll_count(in_hand: usize, used: usize) -> usize {
    let count = in_hand.saturating_sub(used);
    if count == 0 { MAX_DICE } else { count }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum TurnPhase {
    Rolling { dice: usize },
    Busted,
    Complete { banked: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error("turn is already over")]
    Finished,
    #[error("match uses {used} dice but only {in_hand} are in hand")]
    TooManyDice { used: usize, in_hand: usize },
    #[error("match does not score")]
    NotScoring,
}

/// One player's turn: roll, set aside scoring dice, then bank or reroll.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pot: f64,
    phase: TurnPhase,
    history: Vec<Dice>,
}

impl Turn {
    pub fn new() -> Self {
        Self {
            pot: 0.0,
            phase: TurnPhase::Rolling { dice: MAX_DICE },
            history: Vec::new(),
        }
    }

    pub fn pot(&self) -> f64 {
        self.pot
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        !matches!(self.phase, TurnPhase::Rolling { .. })
    }

    /// Dice to throw next, or `None` once the turn has ended.
    pub fn dice_in_hand(&self) -> Option<usize> {
        match self.phase {
            TurnPhase::Rolling { dice } => Some(dice),
            _ => None,
        }
    }

    /// Dice set aside so far, in pick order.
    pub fn history(&self) -> &[Dice] {
        &self.history
    }

    /// A roll with nothing to take: the pot is forfeited.
    pub fn bust(&mut self) -> Result<(), TurnError> {
        self.ensure_rolling()?;
        self.pot = 0.0;
        self.phase = TurnPhase::Busted;
        Ok(())
    }

    /// Sets `pick` aside and stops. Returns the banked total.
    pub fn bank(&mut self, pick: &Match) -> Result<f64, TurnError> {
        self.take(pick)?;
        let banked = self.pot;
        self.phase = TurnPhase::Complete { banked };
        Ok(banked)
    }

    /// Sets `pick` aside and keeps rolling with the remaining dice.
    pub fn set_aside(&mut self, pick: &Match) -> Result<usize, TurnError> {
        let in_hand = self.take(pick)?;
        let next = reroll_count(in_hand, pick.used.len());
        self.phase = TurnPhase::Rolling { dice: next };
        Ok(next)
    }

    fn take(&mut self, pick: &Match) -> Result<usize, TurnError> {
        let in_hand = self.ensure_rolling()?;
        if !pick.is_scoring() {
            return Err(TurnError::NotScoring);
        }
        let used = pick.used.len();
        if used > in_hand {
            return Err(TurnError::TooManyDice { used, in_hand });
        }
        self.pot += pick.score;
        self.history.push(pick.used);
        Ok(in_hand)
    }

    fn ensure_rolling(&self) -> Result<usize, TurnError> {
        self.dice_in_hand().ok_or(TurnError::Finished)
    }
}

impl Default for Turn {
    fn default() -> Self {
        Self::new()
    }
}

use super::{Policy, TurnAction, TurnContext, best_legal, log_decision};
use zipper_core::scoring::enumerate_matches;

pub const DEFAULT_BANK_AT: f64 = 300.0;

/// Baseline player: always takes the biggest legal pick and banks once the
/// pot reaches `bank_at`.
#[derive(Debug, Clone, Copy)]
pub struct GreedyPolicy {
    bank_at: f64,
}

impl GreedyPolicy {
    pub fn new(bank_at: f64) -> Self {
        Self { bank_at }
    }

    pub fn bank_at(&self) -> f64 {
        self.bank_at
    }
}

impl Default for GreedyPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_BANK_AT)
    }
}

impl Policy for GreedyPolicy {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn choose(&mut self, ctx: &TurnContext) -> TurnAction {
        let action = match best_legal(ctx, &enumerate_matches(ctx.roll)) {
            None => TurnAction::Bust,
            Some(pick) if ctx.reaches_goal(&pick) || ctx.pot + pick.score >= self.bank_at => {
                TurnAction::Bank(pick)
            }
            Some(pick) => TurnAction::Reroll(pick),
        };
        log_decision(self.name(), ctx, &action, None, "bank_threshold");
        action
    }
}

use super::{Policy, TurnAction, TurnContext, best_legal, log_decision};
use crate::engine::{CacheStats, Engine, EngineConfig};
use zipper_core::scoring::enumerate_matches;

/// Plays for the highest expected turn score, ignoring the goal except to
/// stay legal.
#[derive(Debug)]
pub struct ValuePolicy {
    engine: Engine,
}

impl ValuePolicy {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            engine: Engine::new(config),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

impl Policy for ValuePolicy {
    fn name(&self) -> &'static str {
        "value"
    }

    fn choose(&mut self, ctx: &TurnContext) -> TurnAction {
        let choice = self.engine.best_match(ctx.roll, ctx.pot);
        let pick = choice.matched;

        let (action, reason) = if !pick.is_scoring() {
            (TurnAction::Bust, "no_scoring_match")
        } else if ctx.is_legal(&pick) {
            if ctx.reaches_goal(&pick) {
                (TurnAction::Bank(pick), "reaches_goal")
            } else if choice.reroll {
                (TurnAction::Reroll(pick), "continuation_value")
            } else {
                (TurnAction::Bank(pick), "stop_value")
            }
        } else {
            // The value-maximising pick overshoots: bank the best pick that fits.
            match best_legal(ctx, &enumerate_matches(ctx.roll)) {
                Some(fallback) => (TurnAction::Bank(fallback), "overshoot_fallback"),
                None => (TurnAction::Bust, "overshoot_no_fit"),
            }
        };

        log_decision(self.name(), ctx, &action, Some(choice.value), reason);
        action
    }

    fn cache_stats(&self) -> Option<CacheStats> {
        Some(self.engine.cache_stats())
    }
}

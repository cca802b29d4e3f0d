use super::{Policy, TurnAction, TurnContext, log_decision};
use crate::engine::{CacheStats, Engine, EngineConfig, GoalDecision};

/// Minimises the expected number of turns needed to land on the goal.
#[derive(Debug)]
pub struct GoalPolicy {
    engine: Engine,
}

impl GoalPolicy {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            engine: Engine::new(config),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

impl Policy for GoalPolicy {
    fn name(&self) -> &'static str {
        "goal"
    }

    fn choose(&mut self, ctx: &TurnContext) -> TurnAction {
        let decision = self.engine.decide(ctx.roll, ctx.pot, ctx.remaining());
        let action = match decision {
            GoalDecision::NoLegalMove => TurnAction::Bust,
            GoalDecision::Bank { matched, .. } => TurnAction::Bank(matched),
            GoalDecision::Reroll { matched, .. } => TurnAction::Reroll(matched),
        };
        log_decision(self.name(), ctx, &action, decision.turns(), "expected_turns");
        action
    }

    fn cache_stats(&self) -> Option<CacheStats> {
        Some(self.engine.cache_stats())
    }
}

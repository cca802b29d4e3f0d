mod goal;
mod greedy;
mod value;

pub use goal::GoalPolicy;
pub use greedy::GreedyPolicy;
pub use value::ValuePolicy;

use crate::engine::CacheStats;
use tracing::{Level, event};
use zipper_core::model::dice::Dice;
use zipper_core::scoring::Match;

/// What a player sees when deciding on a roll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnContext {
    pub roll: Dice,
    /// Points set aside earlier in this turn.
    pub pot: f64,
    /// Points banked in earlier turns.
    pub total: f64,
    pub goal: f64,
}

impl TurnContext {
    /// Points still needed to finish, counting from the start of this turn.
    pub fn remaining(&self) -> f64 {
        self.goal - self.total
    }

    /// Whether taking `pick` is allowed: it must score, come from the roll,
    /// and keep the running total at or below the goal.
    pub fn is_legal(&self, pick: &Match) -> bool {
        pick.is_scoring()
            && pick.used.is_subset_of(&self.roll)
            && self.pot + pick.score <= self.remaining()
    }

    pub fn reaches_goal(&self, pick: &Match) -> bool {
        self.pot + pick.score == self.remaining()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TurnAction {
    Bank(Match),
    Reroll(Match),
    /// Nothing legal to take; the pot is lost.
    Bust,
}

impl TurnAction {
    pub fn matched(&self) -> Option<Match> {
        match self {
            TurnAction::Bank(pick) | TurnAction::Reroll(pick) => Some(*pick),
            TurnAction::Bust => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TurnAction::Bank(_) => "bank",
            TurnAction::Reroll(_) => "reroll",
            TurnAction::Bust => "bust",
        }
    }
}

/// Unified interface for Zipper players.
pub trait Policy {
    fn name(&self) -> &'static str;

    /// Choose what to do with the current roll.
    fn choose(&mut self, ctx: &TurnContext) -> TurnAction;

    /// Cache sizes of the policy's engine, if it has one.
    fn cache_stats(&self) -> Option<CacheStats> {
        None
    }
}

/// Highest-scoring legal pick from the enumerated `candidates`.
pub(crate) fn best_legal(ctx: &TurnContext, candidates: &[Match]) -> Option<Match> {
    candidates.iter().copied().find(|pick| ctx.is_legal(pick))
}

fn decision_logging_enabled() -> bool {
    std::env::var("ZIPPER_DECISION_DETAILS")
        .map(|raw| matches!(raw.trim(), "1" | "true" | "TRUE" | "on" | "ON"))
        .unwrap_or(false)
}

pub(crate) fn log_decision(
    policy: &'static str,
    ctx: &TurnContext,
    action: &TurnAction,
    value: Option<f64>,
    reason: &str,
) {
    if !tracing::enabled!(Level::INFO) || !decision_logging_enabled() {
        return;
    }

    let picked = action
        .matched()
        .map(|pick| pick.used.to_string())
        .unwrap_or_default();

    event!(
        target: "zipper_bot::decision",
        Level::INFO,
        policy,
        roll = %ctx.roll,
        pot = ctx.pot,
        total = ctx.total,
        goal = ctx.goal,
        action = action.label(),
        picked = %picked,
        value = ?value,
        reason,
    );
}

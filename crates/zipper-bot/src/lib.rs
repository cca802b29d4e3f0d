pub mod engine;
pub mod policy;

pub use engine::{
    CacheStats, Choice, DEFAULT_MAX_DEPTH, Engine, EngineConfig, GoalDecision,
};
pub use policy::{GoalPolicy, GreedyPolicy, Policy, TurnAction, TurnContext, ValuePolicy};

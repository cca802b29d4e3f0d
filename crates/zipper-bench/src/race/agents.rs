use thiserror::Error;
use zipper_bot::{EngineConfig, GoalPolicy, GreedyPolicy, Policy, ValuePolicy};

use crate::config::{AgentConfig, AgentKind, AgentParams};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid parameters for agent '{name}': {source}")]
    InvalidParams {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("parameter '{param}' does not apply to {kind:?} agent '{name}'")]
    UnusedParam {
        name: String,
        kind: AgentKind,
        param: &'static str,
    },
}

/// Validated recipe for an agent's policy. The runner spawns one per agent
/// and keeps it for the whole run.
#[derive(Debug, Clone)]
pub struct AgentBlueprint {
    pub name: String,
    pub kind: AgentKind,
    params: AgentParams,
}

impl AgentBlueprint {
    pub fn from_configs(configs: &[AgentConfig]) -> Result<Vec<Self>, AgentError> {
        configs.iter().map(Self::from_config).collect()
    }

    pub fn from_config(config: &AgentConfig) -> Result<Self, AgentError> {
        let params = config
            .parsed_params()
            .map_err(|source| AgentError::InvalidParams {
                name: config.name.clone(),
                source,
            })?;

        let unused = match config.kind {
            AgentKind::Value | AgentKind::Goal => params.bank_at.map(|_| "bank_at"),
            AgentKind::Greedy => params.max_depth.map(|_| "max_depth"),
        };
        if let Some(param) = unused {
            return Err(AgentError::UnusedParam {
                name: config.name.clone(),
                kind: config.kind,
                param,
            });
        }

        Ok(Self {
            name: config.name.clone(),
            kind: config.kind,
            params,
        })
    }

    fn engine_config(&self) -> EngineConfig {
        let base = EngineConfig::from_env();
        match self.params.max_depth {
            Some(depth) => base.with_max_depth(depth),
            None => base,
        }
    }

    pub fn spawn_policy(&self) -> Box<dyn Policy> {
        match self.kind {
            AgentKind::Value => Box::new(ValuePolicy::new(self.engine_config())),
            AgentKind::Goal => Box::new(GoalPolicy::new(self.engine_config())),
            AgentKind::Greedy => Box::new(
                self.params
                    .bank_at
                    .map(GreedyPolicy::new)
                    .unwrap_or_default(),
            ),
        }
    }
}

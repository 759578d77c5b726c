//! Strategy capability contract

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

use support_agent_core::{EmotionCategory, InterventionResult, RiskLevel};

/// Everything a strategy may consult when generating a response
#[derive(Debug, Clone)]
pub struct TechniqueContext {
    pub session_id: String,
    pub user_text: String,
    pub risk_level: RiskLevel,
    pub emotion: EmotionCategory,
    /// Session context plus extracted facts plus (on a revision pass)
    /// the injected rejection reasons
    pub facts: HashMap<String, serde_json::Value>,
    pub turn_count: u64,
}

#[derive(Debug, Error)]
pub enum TechniqueError {
    #[error("strategy '{strategy}' failed: {message}")]
    Failed { strategy: String, message: String },
}

impl TechniqueError {
    pub fn failed(strategy: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            strategy: strategy.into(),
            message: message.into(),
        }
    }
}

/// One pluggable intervention strategy
///
/// `applicable` must be cheap and side-effect free; `apply` may call out
/// to generation backends and is always invoked under the orchestrator's
/// timeout.
#[async_trait]
pub trait Technique: Send + Sync {
    /// Stable registry name
    fn name(&self) -> &str;

    /// Static priority weight; higher wins selection
    fn priority(&self) -> u32;

    /// Whether this strategy fits the current turn
    fn applicable(
        &self,
        risk: RiskLevel,
        emotion: EmotionCategory,
        facts: &HashMap<String, serde_json::Value>,
    ) -> bool;

    /// Generate a candidate intervention for the turn
    async fn apply(&self, ctx: &TechniqueContext) -> Result<InterventionResult, TechniqueError>;
}

//! Strategy selection and timeout-bounded invocation
//!
//! Selection is fully deterministic: applicable strategies are ordered by
//! priority (descending), least-recent use, then name, and an
//! anti-repetition rule skips any strategy applied on both of the two
//! preceding turns. Invocation wraps `Technique::apply` in a timeout and
//! substitutes a safe generic response on failure, so a broken strategy
//! can never fail the turn.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::warn;

use support_agent_config::EngineConfig;
use support_agent_core::InterventionResult;

use crate::contract::{Technique, TechniqueContext};
use crate::registry::TechniqueRegistry;

const SUBSTITUTE_TEXT: &str =
    "I'm here with you. Take whatever time you need — what would feel most \
     helpful to talk about right now?";

pub struct TechniqueOrchestrator {
    registry: TechniqueRegistry,
    strategy_timeout: Duration,
}

impl TechniqueOrchestrator {
    pub fn new(registry: TechniqueRegistry, strategy_timeout: Duration) -> Self {
        Self {
            registry,
            strategy_timeout,
        }
    }

    pub fn from_config(registry: TechniqueRegistry, config: &EngineConfig) -> Self {
        Self::new(registry, Duration::from_millis(config.strategy_timeout_ms))
    }

    pub fn registry(&self) -> &TechniqueRegistry {
        &self.registry
    }

    /// Pick the strategy for this turn.
    ///
    /// `recent` holds the applied strategy names of the most recent turns,
    /// oldest first. Equal-priority ties go to the least recently used
    /// candidate (never-used first, name ascending last). A candidate
    /// that appears on both of the last two turns is skipped; if the
    /// skip empties the candidate set the top-ranked candidate is used
    /// anyway rather than failing the turn.
    pub fn select(
        &self,
        ctx: &TechniqueContext,
        recent: &[String],
    ) -> Option<Arc<dyn Technique>> {
        let mut candidates: Vec<Arc<dyn Technique>> = self
            .registry
            .iter()
            .filter(|t| t.applicable(ctx.risk_level, ctx.emotion, &ctx.facts))
            .cloned()
            .collect();

        // Index of the most recent use; `None` means never used.
        let last_used = |name: &str| recent.iter().rposition(|r| r.as_str() == name);
        candidates.sort_by(|a, b| {
            b.priority()
                .cmp(&a.priority())
                .then_with(|| match (last_used(a.name()), last_used(b.name())) {
                    (None, None) => std::cmp::Ordering::Equal,
                    (None, Some(_)) => std::cmp::Ordering::Less,
                    (Some(_), None) => std::cmp::Ordering::Greater,
                    (Some(a_pos), Some(b_pos)) => a_pos.cmp(&b_pos),
                })
                .then_with(|| a.name().cmp(b.name()))
        });

        let last_two: Vec<&str> = recent
            .iter()
            .rev()
            .take(2)
            .map(String::as_str)
            .collect();

        let repeated = |name: &str| last_two.len() == 2 && last_two.iter().all(|r| *r == name);

        candidates
            .iter()
            .find(|t| !repeated(t.name()))
            .or_else(|| candidates.first())
            .cloned()
    }

    /// Run the strategy under the configured timeout.
    ///
    /// Timeouts and strategy errors are logged and absorbed: the caller
    /// always receives a usable result for the supervision gate.
    pub async fn invoke(
        &self,
        technique: &Arc<dyn Technique>,
        ctx: &TechniqueContext,
    ) -> InterventionResult {
        match timeout(self.strategy_timeout, technique.apply(ctx)).await {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                warn!(
                    session_id = %ctx.session_id,
                    strategy = technique.name(),
                    error = %err,
                    "strategy failed, substituting generic response"
                );
                self.substitute(technique.name())
            }
            Err(_) => {
                warn!(
                    session_id = %ctx.session_id,
                    strategy = technique.name(),
                    timeout_ms = self.strategy_timeout.as_millis() as u64,
                    "strategy timed out, substituting generic response"
                );
                self.substitute(technique.name())
            }
        }
    }

    fn substitute(&self, strategy_name: &str) -> InterventionResult {
        InterventionResult::new(strategy_name, SUBSTITUTE_TEXT, 0.3)
            .with_metadata("substituted", serde_json::json!(true))
    }
}

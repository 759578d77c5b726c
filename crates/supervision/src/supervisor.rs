//! Supervision gate
//!
//! Order matters: the deny-list screen runs before any scoring and a
//! match rejects outright. Scores never rehabilitate a critical issue.

use std::collections::HashMap;

use tracing::debug;

use support_agent_config::SupervisionConfig;
use support_agent_core::{InterventionResult, QualityDimension, SupervisionVerdict};

use crate::deny::DenyListScreen;
use crate::scoring;

/// Turn context the gate scores against
#[derive(Debug, Clone)]
pub struct SupervisionContext {
    pub session_id: String,
    pub user_text: String,
}

pub struct ResponseSupervisor {
    screen: DenyListScreen,
    safety_minimum: f32,
    overall_minimum: f32,
    weights: HashMap<QualityDimension, f32>,
}

impl ResponseSupervisor {
    pub fn new(config: &SupervisionConfig) -> Self {
        let sum: f32 = config.dimension_weights.values().sum();
        let weights = config
            .dimension_weights
            .iter()
            .map(|(k, v)| (*k, if sum > 0.0 { v / sum } else { 0.0 }))
            .collect();
        Self {
            screen: DenyListScreen::new(&config.deny_list),
            safety_minimum: config.safety_minimum,
            overall_minimum: config.overall_minimum,
            weights,
        }
    }

    /// Gate one candidate response. Stateless per call.
    pub fn supervise(
        &self,
        candidate: &InterventionResult,
        context: &SupervisionContext,
    ) -> SupervisionVerdict {
        let mut critical_issues = Vec::new();
        let mut warnings = Vec::new();

        for phrase in self.screen.matches(&candidate.response_text) {
            critical_issues.push(format!("deny-listed phrase: '{phrase}'"));
        }

        let scores = HashMap::from([
            (
                QualityDimension::Empathy,
                scoring::empathy(&candidate.response_text),
            ),
            (
                QualityDimension::Safety,
                scoring::safety(&candidate.response_text),
            ),
            (
                QualityDimension::BoundaryRespect,
                scoring::boundary_respect(&candidate.response_text),
            ),
            (
                QualityDimension::Relevance,
                scoring::relevance(&candidate.response_text, &context.user_text),
            ),
        ]);

        let safety = scores[&QualityDimension::Safety];
        if safety < self.safety_minimum {
            critical_issues.push(format!(
                "safety score {safety:.2} below minimum {:.2}",
                self.safety_minimum
            ));
        }

        let overall: f32 = QualityDimension::ALL
            .iter()
            .map(|d| scores[d] * self.weights.get(d).copied().unwrap_or(0.0))
            .sum();

        // Secondary-dimension shortfalls are soft signals only.
        for dimension in [
            QualityDimension::Empathy,
            QualityDimension::BoundaryRespect,
            QualityDimension::Relevance,
        ] {
            if scores[&dimension] < self.overall_minimum {
                warnings.push(format!(
                    "{} score {:.2} below {:.2}",
                    dimension.display_name(),
                    scores[&dimension],
                    self.overall_minimum
                ));
            }
        }

        let approved = critical_issues.is_empty() && overall >= self.overall_minimum;
        if !approved && overall < self.overall_minimum {
            warnings.push(format!(
                "weighted overall {overall:.2} below minimum {:.2}",
                self.overall_minimum
            ));
        }

        let revision_hint = if approved {
            None
        } else {
            let mut failed: Vec<&str> = Vec::new();
            if !critical_issues.is_empty() {
                failed.push("remove harmful or dismissive phrasing");
            }
            if overall < self.overall_minimum {
                failed.push("respond with more warmth and direct acknowledgment");
            }
            Some(failed.join("; "))
        };

        debug!(
            session_id = %context.session_id,
            strategy = %candidate.strategy_name,
            approved,
            overall,
            criticals = critical_issues.len(),
            "supervision verdict"
        );

        SupervisionVerdict::new(approved, scores, critical_issues, warnings, revision_hint)
    }
}

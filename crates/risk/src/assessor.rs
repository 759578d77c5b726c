//! Turn risk assessment
//!
//! Merge policy is max-of(keyword, classifier), never average. An
//! explicit imminent-category keyword match forces IMMINENT regardless of
//! classifier output. Classifier unavailability or timeout degrades the
//! assessment to keyword-only mode; it never blocks the turn.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use support_agent_config::RiskConfig;
use support_agent_core::{RiskAssessment, RiskClassifier, RiskLevel};

use crate::keyword::{level_for_score, KeywordScanner};

/// Context key carrying the session's current risk score into assessment
pub const SESSION_RISK_KEY: &str = "session_risk_score";

pub struct RiskAssessor {
    scanner: KeywordScanner,
    classifier: Option<Arc<dyn RiskClassifier>>,
    config: RiskConfig,
}

impl RiskAssessor {
    pub fn new(config: RiskConfig) -> Self {
        Self {
            scanner: KeywordScanner::new(&config),
            classifier: None,
            config,
        }
    }

    /// Attach the external classifier provider
    pub fn with_classifier(mut self, classifier: Arc<dyn RiskClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Assess one turn's danger level.
    ///
    /// `context` may carry `session_risk_score` from the working session
    /// copy; an elevated session keeps the floor at MODERATE so risk
    /// does not vanish between consecutive turns.
    pub async fn assess(
        &self,
        text: &str,
        context: &HashMap<String, serde_json::Value>,
    ) -> RiskAssessment {
        let scan = self.scanner.scan(text);

        // Forced IMMINENT path: no classifier output can lower it.
        if scan.imminent_match {
            return RiskAssessment::new(RiskLevel::Imminent, scan.score, scan.factors);
        }

        let mut score = scan.score;
        let mut factors = scan.factors;
        let mut degraded = false;

        match &self.classifier {
            Some(classifier) => {
                let timeout = Duration::from_millis(self.config.classifier_timeout_ms);
                match tokio::time::timeout(timeout, classifier.score(text)).await {
                    Ok(Ok(classifier_score)) => {
                        let classifier_score = classifier_score.clamp(0.0, 1.0);
                        if classifier_score > score {
                            factors.push(format!("classifier:{:.2}", classifier_score));
                        }
                        score = score.max(classifier_score);
                    },
                    Ok(Err(e)) => {
                        tracing::warn!(
                            classifier = classifier.name(),
                            error = %e,
                            "Classifier unavailable, degrading to keyword-only risk"
                        );
                        degraded = true;
                    },
                    Err(_elapsed) => {
                        tracing::warn!(
                            classifier = classifier.name(),
                            timeout_ms = self.config.classifier_timeout_ms,
                            "Classifier timed out, degrading to keyword-only risk"
                        );
                        degraded = true;
                    },
                }
            },
            None => {
                // No classifier configured: keyword-only is the normal
                // mode, not a degradation.
            },
        }

        // Session carryover: an already-elevated session keeps a MODERATE
        // floor for this turn's blended score.
        if let Some(session_score) = context.get(SESSION_RISK_KEY).and_then(|v| v.as_f64()) {
            if session_score as f32 >= self.config.high_threshold
                && score < self.config.moderate_threshold
            {
                score = self.config.moderate_threshold;
                factors.push("session_risk_carryover".to_string());
            }
        }

        let level = level_for_score(&self.config, score);
        let assessment = RiskAssessment::new(level, score, factors);
        if degraded {
            assessment.degraded()
        } else {
            assessment
        }
    }
}

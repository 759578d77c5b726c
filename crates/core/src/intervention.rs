//! Intervention and supervision types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::risk::RiskLevel;

/// Output of one intervention strategy application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterventionResult {
    pub strategy_name: String,
    pub response_text: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub confidence: f32,
}

impl InterventionResult {
    pub fn new(
        strategy_name: impl Into<String>,
        response_text: impl Into<String>,
        confidence: f32,
    ) -> Self {
        Self {
            strategy_name: strategy_name.into(),
            response_text: response_text.into(),
            metadata: HashMap::new(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Independent quality dimensions scored by the supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityDimension {
    Empathy,
    Safety,
    BoundaryRespect,
    Relevance,
}

impl QualityDimension {
    pub const ALL: [QualityDimension; 4] = [
        QualityDimension::Empathy,
        QualityDimension::Safety,
        QualityDimension::BoundaryRespect,
        QualityDimension::Relevance,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            QualityDimension::Empathy => "empathy",
            QualityDimension::Safety => "safety",
            QualityDimension::BoundaryRespect => "boundary_respect",
            QualityDimension::Relevance => "relevance",
        }
    }
}

/// Verdict of the response supervision gate
///
/// Invariant: non-empty `critical_issues` forces `approved == false`.
/// The constructors enforce this, so a verdict can never claim approval
/// while carrying a critical issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisionVerdict {
    approved: bool,
    pub dimension_scores: HashMap<QualityDimension, f32>,
    pub critical_issues: Vec<String>,
    pub warnings: Vec<String>,
    pub revision_hint: Option<String>,
}

impl SupervisionVerdict {
    pub fn new(
        approved: bool,
        dimension_scores: HashMap<QualityDimension, f32>,
        critical_issues: Vec<String>,
        warnings: Vec<String>,
        revision_hint: Option<String>,
    ) -> Self {
        Self {
            approved: approved && critical_issues.is_empty(),
            dimension_scores,
            critical_issues,
            warnings,
            revision_hint,
        }
    }

    pub fn approved(&self) -> bool {
        self.approved && self.critical_issues.is_empty()
    }

    pub fn score(&self, dimension: QualityDimension) -> Option<f32> {
        self.dimension_scores.get(&dimension).copied()
    }
}

/// Public result of one handled turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub response_text: String,
    pub risk_level: RiskLevel,
    /// `None` when the canonical fallback was delivered
    pub applied_strategy: Option<String>,
}

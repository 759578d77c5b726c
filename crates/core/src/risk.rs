//! Risk assessment types

use serde::{Deserialize, Serialize};

/// Assessed danger level for a turn
///
/// Ordered: comparisons are used for threshold checks, so variant order
/// matters.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    None,
    Low,
    Moderate,
    High,
    Imminent,
}

impl RiskLevel {
    /// Escalation is required at High or above
    pub fn requires_escalation(&self) -> bool {
        *self >= RiskLevel::High
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RiskLevel::None => "none",
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::High => "high",
            RiskLevel::Imminent => "imminent",
        }
    }
}

/// Result of assessing one turn's risk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    /// Blended score in [0, 1] the level was derived from
    pub score: f32,
    /// Human-readable signals that contributed to the level
    pub contributing_factors: Vec<String>,
    /// Derived from `level`, carried for the escalation sink contract
    pub requires_escalation: bool,
    /// True when the external classifier was unavailable and the
    /// assessment fell back to keyword-only mode
    pub degraded: bool,
}

impl RiskAssessment {
    pub fn new(level: RiskLevel, score: f32, contributing_factors: Vec<String>) -> Self {
        Self {
            level,
            score: score.clamp(0.0, 1.0),
            contributing_factors,
            requires_escalation: level.requires_escalation(),
            degraded: false,
        }
    }

    pub fn degraded(mut self) -> Self {
        self.degraded = true;
        self
    }
}

/// Coarse emotional category derived from a turn's text
///
/// Used to gate intervention strategy applicability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmotionCategory {
    Distress,
    Anxiety,
    Sadness,
    Anger,
    Confusion,
    #[default]
    Neutral,
    Positive,
}

impl EmotionCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            EmotionCategory::Distress => "distress",
            EmotionCategory::Anxiety => "anxiety",
            EmotionCategory::Sadness => "sadness",
            EmotionCategory::Anger => "anger",
            EmotionCategory::Confusion => "confusion",
            EmotionCategory::Neutral => "neutral",
            EmotionCategory::Positive => "positive",
        }
    }
}

//! Resource referral strategy
//!
//! Points the user at concrete external support. Applies when moderate
//! risk is present or when context extraction flagged isolation.

use async_trait::async_trait;
use std::collections::HashMap;

use support_agent_core::{EmotionCategory, InterventionResult, RiskLevel};

use super::pick;
use crate::contract::{Technique, TechniqueContext, TechniqueError};

const ISOLATION_FLAG: &str = "isolation";

const TEMPLATES: &[&str] = &[
    "You shouldn't have to carry this alone. Alongside talking here, it may \
     help to connect with a counselor or a local support line — would you \
     be open to looking at some options together?",
    "There are people whose whole job is to help with exactly this. A \
     therapist, a peer support group, or a warmline can all be a starting \
     point — would any of those feel approachable to you?",
    "Reaching out here already took courage. The next step could be a small \
     one: many communities have free support lines you can text or call \
     any time. Would it help if we talked about what's available?",
];

pub struct ResourceReferralTechnique;

impl ResourceReferralTechnique {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ResourceReferralTechnique {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Technique for ResourceReferralTechnique {
    fn name(&self) -> &str {
        "resource_referral"
    }

    fn priority(&self) -> u32 {
        60
    }

    fn applicable(
        &self,
        risk: RiskLevel,
        _emotion: EmotionCategory,
        facts: &HashMap<String, serde_json::Value>,
    ) -> bool {
        let isolated = facts
            .get(ISOLATION_FLAG)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);
        risk >= RiskLevel::Moderate || isolated
    }

    async fn apply(&self, ctx: &TechniqueContext) -> Result<InterventionResult, TechniqueError> {
        let text = pick(TEMPLATES, ctx.turn_count);
        Ok(InterventionResult::new(self.name(), text, 0.7))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolation_flag_enables() {
        let technique = ResourceReferralTechnique::new();
        let mut facts = HashMap::new();
        assert!(!technique.applicable(RiskLevel::Low, EmotionCategory::Sadness, &facts));

        facts.insert(ISOLATION_FLAG.into(), serde_json::json!(true));
        assert!(technique.applicable(RiskLevel::Low, EmotionCategory::Sadness, &facts));
    }

    #[test]
    fn test_moderate_risk_enables() {
        let technique = ResourceReferralTechnique::new();
        let facts = HashMap::new();
        assert!(technique.applicable(RiskLevel::Moderate, EmotionCategory::Neutral, &facts));
    }
}

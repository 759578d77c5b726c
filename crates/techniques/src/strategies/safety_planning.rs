//! Safety planning strategy
//!
//! Highest-priority non-crisis strategy. Applies from moderate risk
//! upward and keeps the conversation anchored on concrete next steps
//! and support contacts.

use async_trait::async_trait;
use std::collections::HashMap;

use support_agent_core::{EmotionCategory, InterventionResult, RiskLevel};

use super::pick;
use crate::contract::{Technique, TechniqueContext, TechniqueError};

const TEMPLATES: &[&str] = &[
    "I'm really glad you told me this — it matters. Can we think together \
     about one small thing that would help you feel a bit safer right now, \
     and one person you could reach out to today?",
    "What you're feeling is serious and you deserve support. Let's make a \
     simple plan for tonight: something grounding you can do, and someone \
     you trust that you could contact if things get heavier.",
    "Thank you for trusting me with this. You don't have to face it all at \
     once — what's one step, however small, that would make the next few \
     hours feel more manageable?",
];

pub struct SafetyPlanningTechnique;

impl SafetyPlanningTechnique {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SafetyPlanningTechnique {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Technique for SafetyPlanningTechnique {
    fn name(&self) -> &str {
        "safety_planning"
    }

    fn priority(&self) -> u32 {
        90
    }

    fn applicable(
        &self,
        risk: RiskLevel,
        _emotion: EmotionCategory,
        _facts: &HashMap<String, serde_json::Value>,
    ) -> bool {
        risk >= RiskLevel::Moderate
    }

    async fn apply(&self, ctx: &TechniqueContext) -> Result<InterventionResult, TechniqueError> {
        let text = pick(TEMPLATES, ctx.turn_count);
        Ok(InterventionResult::new(self.name(), text, 0.85)
            .with_metadata("risk_level", serde_json::json!(ctx.risk_level)))
    }
}

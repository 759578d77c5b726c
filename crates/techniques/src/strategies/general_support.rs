//! Universal default strategy
//!
//! Always applicable by construction; guarantees the orchestrator a
//! non-empty selection set. "No applicable strategy" is therefore not an
//! error anywhere in the system.

use async_trait::async_trait;
use std::collections::HashMap;

use support_agent_core::{EmotionCategory, InterventionResult, RiskLevel};

use super::pick;
use crate::contract::{Technique, TechniqueContext, TechniqueError};
use crate::REJECTION_REASONS_KEY;

const TEMPLATES: &[&str] = &[
    "Thank you for telling me that. I'm here and I'm listening — what feels \
     most important to talk through right now?",
    "I hear you. Whatever you're carrying, you don't have to sort it out \
     alone. What's weighing on you the most today?",
    "That sounds like a lot to hold. I'm here with you — would it help to \
     walk through what's been happening?",
];

pub struct GeneralSupportTechnique;

impl GeneralSupportTechnique {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GeneralSupportTechnique {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Technique for GeneralSupportTechnique {
    fn name(&self) -> &str {
        "general_support"
    }

    fn priority(&self) -> u32 {
        10
    }

    fn applicable(
        &self,
        _risk: RiskLevel,
        _emotion: EmotionCategory,
        _facts: &HashMap<String, serde_json::Value>,
    ) -> bool {
        true
    }

    async fn apply(&self, ctx: &TechniqueContext) -> Result<InterventionResult, TechniqueError> {
        // On a revision pass, lead with a fresh acknowledgment rather
        // than repeating the rejected framing.
        let text = if ctx.facts.contains_key(REJECTION_REASONS_KEY) {
            format!(
                "I want to make sure I'm actually helpful here. {}",
                pick(TEMPLATES, ctx.turn_count + 1)
            )
        } else {
            pick(TEMPLATES, ctx.turn_count).to_string()
        };

        Ok(InterventionResult::new(self.name(), text, 0.5))
    }
}

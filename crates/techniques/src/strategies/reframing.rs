//! Cognitive reframing strategy
//!
//! Gentle perspective-widening for sad or confused turns. Deliberately
//! not applicable above moderate risk: reframing a high-risk disclosure
//! reads as minimizing.

use async_trait::async_trait;
use std::collections::HashMap;

use support_agent_core::{EmotionCategory, InterventionResult, RiskLevel};

use super::pick;
use crate::contract::{Technique, TechniqueContext, TechniqueError};

const TEMPLATES: &[&str] = &[
    "It makes sense that it feels that way right now. I wonder — if a close \
     friend told you they were in your exact situation, what would you say \
     to them?",
    "That thought sounds heavy to carry. Is it possible there's another way \
     to read what happened, even a small one, that you haven't had room to \
     consider yet?",
    "What you're describing sounds really hard, and also like it's painting \
     everything with one brush. Has there been any moment lately, however \
     brief, that didn't fit that picture?",
];

pub struct CognitiveReframingTechnique;

impl CognitiveReframingTechnique {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CognitiveReframingTechnique {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Technique for CognitiveReframingTechnique {
    fn name(&self) -> &str {
        "cognitive_reframing"
    }

    fn priority(&self) -> u32 {
        70
    }

    fn applicable(
        &self,
        risk: RiskLevel,
        emotion: EmotionCategory,
        _facts: &HashMap<String, serde_json::Value>,
    ) -> bool {
        risk <= RiskLevel::Moderate
            && matches!(emotion, EmotionCategory::Sadness | EmotionCategory::Confusion)
    }

    async fn apply(&self, ctx: &TechniqueContext) -> Result<InterventionResult, TechniqueError> {
        let text = pick(TEMPLATES, ctx.turn_count);
        Ok(InterventionResult::new(self.name(), text, 0.7))
    }
}

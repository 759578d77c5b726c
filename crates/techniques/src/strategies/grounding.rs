//! Grounding strategy
//!
//! Present-moment anchoring exercises for anxious or acutely distressed
//! turns.

use async_trait::async_trait;
use std::collections::HashMap;

use support_agent_core::{EmotionCategory, InterventionResult, RiskLevel};

use super::pick;
use crate::contract::{Technique, TechniqueContext, TechniqueError};

const TEMPLATES: &[&str] = &[
    "That sounds overwhelming. Let's slow things down for a moment: can you \
     name five things you can see around you right now, then four things \
     you can touch?",
    "When everything races like that, the body often races too. Try this \
     with me: breathe in slowly for four counts, hold for four, and out for \
     six. How does that land?",
    "Let's anchor in the present for a second. Feel your feet on the floor \
     and the weight of your body where you're sitting — you're here, and \
     this moment is survivable.",
];

pub struct GroundingTechnique;

impl GroundingTechnique {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GroundingTechnique {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Technique for GroundingTechnique {
    fn name(&self) -> &str {
        "grounding"
    }

    fn priority(&self) -> u32 {
        80
    }

    fn applicable(
        &self,
        _risk: RiskLevel,
        emotion: EmotionCategory,
        _facts: &HashMap<String, serde_json::Value>,
    ) -> bool {
        matches!(emotion, EmotionCategory::Anxiety | EmotionCategory::Distress)
    }

    async fn apply(&self, ctx: &TechniqueContext) -> Result<InterventionResult, TechniqueError> {
        let text = pick(TEMPLATES, ctx.turn_count);
        Ok(InterventionResult::new(self.name(), text, 0.75))
    }
}

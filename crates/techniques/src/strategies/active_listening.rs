//! Active listening strategy
//!
//! Reflective acknowledgment for any turn carrying a recognized emotion.
//! Sits just above the universal default so an emotional turn gets a
//! reflection rather than a generic check-in.

use async_trait::async_trait;
use std::collections::HashMap;

use support_agent_core::{EmotionCategory, InterventionResult, RiskLevel};

use super::pick;
use crate::contract::{Technique, TechniqueContext, TechniqueError};

const TEMPLATES: &[&str] = &[
    "It sounds like {emotion} has been taking up a lot of space for you \
     lately. Tell me more about what that's been like.",
    "I hear a lot of {emotion} in what you just shared. What do you think \
     is sitting underneath it?",
    "Thank you for putting that into words — carrying {emotion} like this \
     is exhausting. What part of it feels hardest right now?",
];

fn emotion_word(emotion: EmotionCategory) -> &'static str {
    match emotion {
        EmotionCategory::Distress => "distress",
        EmotionCategory::Anxiety => "anxiety",
        EmotionCategory::Sadness => "sadness",
        EmotionCategory::Anger => "frustration",
        EmotionCategory::Confusion => "uncertainty",
        EmotionCategory::Neutral => "all of this",
        EmotionCategory::Positive => "hope",
    }
}

pub struct ActiveListeningTechnique;

impl ActiveListeningTechnique {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ActiveListeningTechnique {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Technique for ActiveListeningTechnique {
    fn name(&self) -> &str {
        "active_listening"
    }

    fn priority(&self) -> u32 {
        50
    }

    fn applicable(
        &self,
        _risk: RiskLevel,
        emotion: EmotionCategory,
        _facts: &HashMap<String, serde_json::Value>,
    ) -> bool {
        emotion != EmotionCategory::Neutral
    }

    async fn apply(&self, ctx: &TechniqueContext) -> Result<InterventionResult, TechniqueError> {
        let template = pick(TEMPLATES, ctx.turn_count);
        let text = template.replace("{emotion}", emotion_word(ctx.emotion));
        Ok(InterventionResult::new(self.name(), text, 0.65)
            .with_metadata("emotion", serde_json::json!(ctx.emotion)))
    }
}

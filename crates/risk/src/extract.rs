//! Pattern-based context fact extraction
//!
//! Best-effort derivation of structured facts from turn text. Pure CPU
//! work, so latency is bounded by construction; the engine still wraps
//! the call in its enrichment timeout like any other extractor impl.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use support_agent_core::{ContextExtractor, Result};

static DURATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bfor (?:the last |the past |about )?(\d+|a few|several|many) (day|week|month|year)s?\b")
        .expect("duration pattern")
});

static SUPPORT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(my|a) (friend|friends|family|partner|therapist|counselor|doctor|mom|dad|sister|brother)\b")
        .expect("support pattern")
});

struct FlagRule {
    key: &'static str,
    markers: &'static [&'static str],
}

const FLAG_RULES: &[FlagRule] = &[
    FlagRule {
        key: "sleep_issues",
        markers: &["can't sleep", "insomnia", "sleeping badly", "awake all night", "nightmares"],
    },
    FlagRule {
        key: "isolation",
        markers: &["alone", "isolated", "no one to talk", "by myself", "nobody"],
    },
    FlagRule {
        key: "work_stress",
        markers: &["work", "job", "boss", "fired", "laid off", "deadline"],
    },
    FlagRule {
        key: "relationship",
        markers: &["relationship", "breakup", "broke up", "divorce", "partner", "marriage"],
    },
    FlagRule {
        key: "substance_mention",
        markers: &["drinking", "drunk", "pills", "drugs", "high"],
    },
];

/// Regex/lexicon implementation of the `ContextExtractor` contract
#[derive(Default)]
pub struct PatternContextExtractor;

impl PatternContextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContextExtractor for PatternContextExtractor {
    async fn extract(&self, text: &str) -> Result<HashMap<String, serde_json::Value>> {
        let lowered = text.to_lowercase();
        let mut facts = HashMap::new();

        for rule in FLAG_RULES {
            if rule.markers.iter().any(|marker| lowered.contains(marker)) {
                facts.insert(rule.key.to_string(), serde_json::json!(true));
            }
        }

        if let Some(captures) = DURATION_PATTERN.captures(text) {
            let amount = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            let unit = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
            facts.insert(
                "duration".to_string(),
                serde_json::json!(format!("{} {}s", amount.to_lowercase(), unit.to_lowercase())),
            );
        }

        if let Some(captures) = SUPPORT_PATTERN.captures(text) {
            let who = captures.get(2).map(|m| m.as_str().to_lowercase());
            facts.insert("support_mention".to_string(), serde_json::json!(who));
        }

        Ok(facts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_for_plain_text() {
        let facts = PatternContextExtractor::new()
            .extract("what time is it")
            .await
            .unwrap();
        assert!(facts.is_empty());
    }

    #[tokio::test]
    async fn test_flags_extracted() {
        let facts = PatternContextExtractor::new()
            .extract("I can't sleep and I feel so alone since the breakup")
            .await
            .unwrap();
        assert_eq!(facts.get("sleep_issues"), Some(&serde_json::json!(true)));
        assert_eq!(facts.get("isolation"), Some(&serde_json::json!(true)));
        assert_eq!(facts.get("relationship"), Some(&serde_json::json!(true)));
    }

    #[tokio::test]
    async fn test_duration_captured() {
        let facts = PatternContextExtractor::new()
            .extract("I've felt like this for the past 3 weeks")
            .await
            .unwrap();
        assert_eq!(facts.get("duration"), Some(&serde_json::json!("3 weeks")));
    }

    #[tokio::test]
    async fn test_support_mention_captured() {
        let facts = PatternContextExtractor::new()
            .extract("my therapist suggested I write things down")
            .await
            .unwrap();
        assert_eq!(
            facts.get("support_mention"),
            Some(&serde_json::json!("therapist"))
        );
    }
}

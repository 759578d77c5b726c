//! Deny-list screening
//!
//! Configured phrases compile to case-insensitive word-boundary regexes
//! at construction, same shape as the risk keyword scanner. A match is
//! reported verbatim so the critical issue names the offending phrase.

use regex::Regex;

struct DenyRule {
    pattern: Regex,
    phrase: String,
}

pub struct DenyListScreen {
    rules: Vec<DenyRule>,
}

impl DenyListScreen {
    pub fn new(phrases: &[String]) -> Self {
        let rules = phrases
            .iter()
            .filter_map(|phrase| {
                Regex::new(&format!(r"(?i)\b{}\b", regex::escape(phrase)))
                    .ok()
                    .map(|pattern| DenyRule {
                        pattern,
                        phrase: phrase.clone(),
                    })
            })
            .collect();
        Self { rules }
    }

    /// Phrases from the deny list found in `text`.
    pub fn matches(&self, text: &str) -> Vec<String> {
        self.rules
            .iter()
            .filter(|rule| rule.pattern.is_match(text))
            .map(|rule| rule.phrase.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> DenyListScreen {
        DenyListScreen::new(&[
            "you should just".to_string(),
            "get over it".to_string(),
        ])
    }

    #[test]
    fn test_case_insensitive_match() {
        let hits = screen().matches("Honestly, GET OVER IT already.");
        assert_eq!(hits, vec!["get over it".to_string()]);
    }

    #[test]
    fn test_word_boundaries_respected() {
        // "target" contains "get" but no phrase boundary-matches here.
        let hits = screen().matches("let's set a target over the week");
        assert!(hits.is_empty());
    }

    #[test]
    fn test_clean_text_passes() {
        assert!(screen().matches("I'm here with you.").is_empty());
    }
}

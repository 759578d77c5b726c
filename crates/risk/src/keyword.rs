//! Curated high-risk phrase scanning
//!
//! Phrases compile to case-insensitive word-boundary regexes per severity
//! category at construction. Patterns that fail to compile are dropped
//! (the lists are plain phrases run through `regex::escape`, so in
//! practice none do).

use regex::Regex;

use support_agent_config::RiskConfig;
use support_agent_core::RiskLevel;

struct CompiledPhrase {
    pattern: Regex,
    phrase: String,
}

fn compile_phrases(phrases: &[String]) -> Vec<CompiledPhrase> {
    phrases
        .iter()
        .filter_map(|phrase| {
            Regex::new(&format!(r"(?i)\b{}\b", regex::escape(phrase)))
                .ok()
                .map(|pattern| CompiledPhrase {
                    pattern,
                    phrase: phrase.clone(),
                })
        })
        .collect()
}

/// Outcome of scanning one turn's text
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Strongest keyword signal in [0, 1]
    pub score: f32,
    /// True when an imminent-category phrase matched; forces IMMINENT
    /// regardless of any classifier output
    pub imminent_match: bool,
    /// Matched phrases, prefixed with their category
    pub factors: Vec<String>,
}

impl ScanResult {
    fn clean() -> Self {
        Self {
            score: 0.0,
            imminent_match: false,
            factors: Vec::new(),
        }
    }
}

/// Severity-tiered keyword scanner
pub struct KeywordScanner {
    imminent: Vec<CompiledPhrase>,
    high: Vec<CompiledPhrase>,
    moderate: Vec<CompiledPhrase>,
    /// Scores attached to a category match; high enough to clear the
    /// corresponding level threshold on their own
    imminent_score: f32,
    high_score: f32,
    moderate_score: f32,
}

impl KeywordScanner {
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            imminent: compile_phrases(&config.imminent_phrases),
            high: compile_phrases(&config.high_phrases),
            moderate: compile_phrases(&config.moderate_phrases),
            imminent_score: 1.0,
            high_score: config.high_threshold,
            moderate_score: config.moderate_threshold,
        }
    }

    /// Scan text for curated phrases, strongest category wins
    pub fn scan(&self, text: &str) -> ScanResult {
        let mut result = ScanResult::clean();

        for rule in &self.imminent {
            if rule.pattern.is_match(text) {
                result.imminent_match = true;
                result.score = self.imminent_score;
                result.factors.push(format!("imminent_phrase:{}", rule.phrase));
            }
        }
        if result.imminent_match {
            return result;
        }

        for rule in &self.high {
            if rule.pattern.is_match(text) {
                result.score = result.score.max(self.high_score);
                result.factors.push(format!("high_phrase:{}", rule.phrase));
            }
        }
        for rule in &self.moderate {
            if rule.pattern.is_match(text) {
                result.score = result.score.max(self.moderate_score);
                result
                    .factors
                    .push(format!("moderate_phrase:{}", rule.phrase));
            }
        }

        result
    }
}

/// Map a blended score to a level using the configured monotonic
/// thresholds.
pub fn level_for_score(config: &RiskConfig, score: f32) -> RiskLevel {
    if score >= config.imminent_threshold {
        RiskLevel::Imminent
    } else if score >= config.high_threshold {
        RiskLevel::High
    } else if score >= config.moderate_threshold {
        RiskLevel::Moderate
    } else if score >= config.low_threshold {
        RiskLevel::Low
    } else {
        RiskLevel::None
    }
}

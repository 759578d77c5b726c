//! Lexical dimension scorers
//!
//! All four scorers are deterministic functions of the candidate text
//! (and, for relevance, the user's turn). Scores land in [0, 1].

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

/// Reflective and validating phrases that signal empathic engagement.
const EMPATHY_MARKERS: &[&str] = &[
    "i hear",
    "sounds like",
    "that sounds",
    "thank you for",
    "i'm here",
    "with you",
    "makes sense",
    "you deserve",
    "not alone",
    "i'm glad you",
    "tell me more",
    "it matters",
];

/// Dismissive or pressuring phrasings that sit near the deny list
/// without being outright deny-listed.
static SAFETY_RISK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\bjust (stop|relax|calm down|cheer up|move on)\b",
        r"(?i)\bit's not (that bad|a big deal)\b",
        r"(?i)\beveryone (feels|goes through)\b",
        r"(?i)\byou're overreacting\b",
        r"(?i)\bstop being\b",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Directive or clinical-claim phrasings the agent must not produce.
static BOUNDARY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\byou (must|have to|need to)\b",
        r"(?i)\bi (diagnose|prescribe)\b",
        r"(?i)\byou (have|are suffering from) (a |an )?\w+ disorder\b",
        r"(?i)\b(increase|decrease|stop|start) (your|the) (dose|medication|meds)\b",
        r"(?i)\bi guarantee\b",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Empathy: base score plus a bonus per distinct marker present.
pub fn empathy(candidate: &str) -> f32 {
    let lower = candidate.to_lowercase();
    let hits = EMPATHY_MARKERS.iter().filter(|m| lower.contains(**m)).count();
    (0.3 + 0.2 * hits as f32).clamp(0.0, 1.0)
}

/// Safety: starts at full score, each dismissive pattern costs heavily.
pub fn safety(candidate: &str) -> f32 {
    let hits = SAFETY_RISK_PATTERNS
        .iter()
        .filter(|p| p.is_match(candidate))
        .count();
    (1.0 - 0.4 * hits as f32).clamp(0.0, 1.0)
}

/// Boundary respect: directive and clinical-claim patterns each cost.
pub fn boundary_respect(candidate: &str) -> f32 {
    let hits = BOUNDARY_PATTERNS
        .iter()
        .filter(|p| p.is_match(candidate))
        .count();
    (1.0 - 0.35 * hits as f32).clamp(0.0, 1.0)
}

/// Relevance: content-word overlap with the user's turn, capped so short
/// turns don't demand impossible echo. Neutral when the turn carries no
/// content words.
pub fn relevance(candidate: &str, user_text: &str) -> f32 {
    let user_terms: Vec<String> = content_words(user_text);
    if user_terms.is_empty() {
        return 0.5;
    }
    let candidate_lower = candidate.to_lowercase();
    let shared = user_terms
        .iter()
        .filter(|term| candidate_lower.contains(term.as_str()))
        .count();
    let denom = user_terms.len().min(8) as f32;
    (0.3 + 0.7 * (shared as f32 / denom)).clamp(0.0, 1.0)
}

fn content_words(text: &str) -> Vec<String> {
    let mut words: Vec<String> = text
        .unicode_words()
        .map(str::to_lowercase)
        .filter(|w| w.len() >= 4)
        .collect();
    words.sort();
    words.dedup();
    words
}

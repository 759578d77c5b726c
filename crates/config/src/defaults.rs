//! Curated built-in lexicons
//!
//! These ship in code so a bare `Settings::default()` is already safe to
//! run. Deployments override them from YAML (`PhraseLexicon`) without a
//! rebuild. Phrases are matched case-insensitively on word boundaries.

/// Highest-severity self-harm phrases. Any match forces IMMINENT,
/// regardless of classifier output.
pub fn default_imminent_phrases() -> Vec<String> {
    [
        "kill myself",
        "end my life",
        "want to die",
        "suicide",
        "suicidal",
        "end it all",
        "not worth living",
        "better off dead",
        "take my own life",
        "no reason to live",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// High-severity phrases: strong risk signals short of explicit intent.
pub fn default_high_phrases() -> Vec<String> {
    [
        "hurt myself",
        "harm myself",
        "self harm",
        "cutting myself",
        "can't go on",
        "give up on everything",
        "nothing matters anymore",
        "everyone would be better without me",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Moderate-severity phrases: distress markers worth weighting.
pub fn default_moderate_phrases() -> Vec<String> {
    [
        "hopeless",
        "worthless",
        "can't cope",
        "falling apart",
        "completely alone",
        "no one cares",
        "can't take it anymore",
        "trapped",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Deny-listed response content. A candidate response matching any of
/// these is a critical supervision issue and is never delivered.
pub fn default_deny_list() -> Vec<String> {
    [
        "you should just",
        "get over it",
        "stop being dramatic",
        "it's not a big deal",
        "other people have it worse",
        "snap out of it",
        "you're overreacting",
        "i diagnose",
        "you have a disorder",
        "stop taking your medication",
        "you don't need therapy",
        "harm yourself",
        "deserve to suffer",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

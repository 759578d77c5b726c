//! Coarse emotion classification
//!
//! Lexicon-based and fully deterministic: categories are checked in a
//! fixed priority order and the first category whose lexicon hits wins
//! ties, so identical input always yields the identical category.

use unicode_segmentation::UnicodeSegmentation;

use support_agent_core::EmotionCategory;

struct Lexicon {
    category: EmotionCategory,
    markers: &'static [&'static str],
}

/// Checked in this order; earlier categories win score ties.
const LEXICONS: &[Lexicon] = &[
    Lexicon {
        category: EmotionCategory::Distress,
        markers: &[
            "overwhelmed",
            "desperate",
            "unbearable",
            "breaking",
            "crisis",
            "help me",
            "drowning",
        ],
    },
    Lexicon {
        category: EmotionCategory::Anxiety,
        markers: &[
            "anxious",
            "panic",
            "worried",
            "scared",
            "afraid",
            "nervous",
            "racing",
            "dread",
        ],
    },
    Lexicon {
        category: EmotionCategory::Sadness,
        markers: &[
            "sad",
            "depressed",
            "crying",
            "lonely",
            "empty",
            "grief",
            "miss",
            "lost",
        ],
    },
    Lexicon {
        category: EmotionCategory::Anger,
        markers: &[
            "angry",
            "furious",
            "hate",
            "rage",
            "unfair",
            "frustrated",
            "resent",
        ],
    },
    Lexicon {
        category: EmotionCategory::Confusion,
        markers: &[
            "confused",
            "don't understand",
            "lost track",
            "don't know what",
            "unsure",
            "mixed up",
        ],
    },
    Lexicon {
        category: EmotionCategory::Positive,
        markers: &["better", "grateful", "hopeful", "improving", "thank", "relieved"],
    },
];

/// Deterministic lexicon-based emotion classifier
#[derive(Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a turn's dominant emotion with a confidence in [0, 1]
    pub fn classify(&self, text: &str) -> (EmotionCategory, f32) {
        let lowered = text.to_lowercase();
        let word_count = lowered.unicode_words().count().max(1);

        let mut best = (EmotionCategory::Neutral, 0usize);
        for lexicon in LEXICONS {
            let hits = lexicon
                .markers
                .iter()
                .filter(|marker| lowered.contains(*marker))
                .count();
            // Strictly-greater keeps the first (highest-priority) category
            // on ties.
            if hits > best.1 {
                best = (lexicon.category, hits);
            }
        }

        if best.1 == 0 {
            return (EmotionCategory::Neutral, 0.0);
        }

        let confidence = (best.1 as f32 / word_count.min(12) as f32).clamp(0.1, 1.0);
        (best.0, confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_for_plain_text() {
        let (category, confidence) = IntentClassifier::new().classify("the meeting is at noon");
        assert_eq!(category, EmotionCategory::Neutral);
        assert_eq!(confidence, 0.0);
    }

    #[test]
    fn test_anxiety_detected() {
        let (category, confidence) =
            IntentClassifier::new().classify("I'm so anxious, my heart keeps racing");
        assert_eq!(category, EmotionCategory::Anxiety);
        assert!(confidence > 0.0);
    }

    #[test]
    fn test_deterministic_tie_break() {
        // One sadness marker and one anger marker: sadness is checked
        // first and must win every time.
        let classifier = IntentClassifier::new();
        let text = "I'm sad and frustrated";
        let first = classifier.classify(text);
        for _ in 0..10 {
            assert_eq!(classifier.classify(text), first);
        }
        assert_eq!(first.0, EmotionCategory::Sadness);
    }

    #[test]
    fn test_more_hits_win() {
        let (category, _) =
            IntentClassifier::new().classify("angry and furious, full of rage, but a bit sad");
        assert_eq!(category, EmotionCategory::Anger);
    }
}

// Suspicious-word catalog
// Vocabulary and phrasing disproportionately common in machine-generated
// prose. Matches feed the stylistic-markers dimension and the word-impact
// ranking; catalog scores take precedence over general word scores.

use std::collections::HashSet;
use std::sync::OnceLock;

const SUSPICIOUS_VERBS: &[&str] = &[
    "delve",
    "delves",
    "leverage",
    "leverages",
    "leveraging",
    "underscore",
    "underscores",
    "facilitate",
    "facilitates",
    "foster",
    "fosters",
    "showcase",
    "showcases",
    "streamline",
    "streamlines",
    "harness",
    "harnesses",
    "navigate",
    "navigates",
    "elevate",
    "elevates",
    "bolster",
    "bolsters",
    "encompass",
    "encompasses",
];

const SUSPICIOUS_MODIFIERS: &[&str] = &[
    "comprehensive",
    "nuanced",
    "cutting-edge",
    "paradigm-shifting",
    "thought-provoking",
    "multifaceted",
    "pivotal",
    "seamless",
    "robust",
    "holistic",
    "invaluable",
    "transformative",
    "intricate",
    "myriad",
    "unprecedented",
    "meticulous",
    "dynamic",
    "crucial",
];

const SUSPICIOUS_NOUNS: &[&str] = &[
    "landscape",
    "tapestry",
    "realm",
    "methodologies",
    "implications",
    "framework",
    "intricacies",
    "synergy",
    "paradigm",
    "insights",
    "trajectory",
    "cornerstone",
    "interplay",
    "testament",
];

const FORMULAIC_PHRASES: &[&str] = &[
    "it's worth noting that",
    "it is worth noting that",
    "it is important to note",
    "in today's fast-paced world",
    "in the ever-evolving landscape",
    "plays a crucial role",
    "a testament to",
    "at the end of the day",
    "when it comes to",
    "in conclusion",
    "delve into",
    "dive deep into",
    "unlock the potential",
    "navigate the complexities",
];

// Per-class scores: verbs and phrases are the strongest markers.
const VERB_SCORE: f64 = 0.80;
const MODIFIER_SCORE: f64 = 0.72;
const NOUN_SCORE: f64 = 0.68;
pub const PHRASE_SCORE: f64 = 0.85;

fn verb_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| SUSPICIOUS_VERBS.iter().copied().collect())
}

fn modifier_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| SUSPICIOUS_MODIFIERS.iter().copied().collect())
}

fn noun_set() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| SUSPICIOUS_NOUNS.iter().copied().collect())
}

/// Catalog score for a single lowercase word token, if it is flagged.
pub fn suspicious_word_score(word: &str) -> Option<f64> {
    if verb_set().contains(word) {
        Some(VERB_SCORE)
    } else if modifier_set().contains(word) {
        Some(MODIFIER_SCORE)
    } else if noun_set().contains(word) {
        Some(NOUN_SCORE)
    } else {
        None
    }
}

/// Formulaic phrases found in the text (case-insensitive substring match).
pub fn matched_phrases(text: &str) -> Vec<&'static str> {
    let lowered = text.to_lowercase();
    FORMULAIC_PHRASES
        .iter()
        .copied()
        .filter(|p| lowered.contains(p))
        .collect()
}

/// Count of flagged words among the given lowercase tokens.
pub fn count_suspicious(words: &[String]) -> usize {
    words
        .iter()
        .filter(|w| suspicious_word_score(w).is_some())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_classes_scored() {
        assert_eq!(suspicious_word_score("delves"), Some(VERB_SCORE));
        assert_eq!(suspicious_word_score("nuanced"), Some(MODIFIER_SCORE));
        assert_eq!(suspicious_word_score("tapestry"), Some(NOUN_SCORE));
        assert_eq!(suspicious_word_score("bicycle"), None);
    }

    #[test]
    fn test_phrase_matching_case_insensitive() {
        let hits = matched_phrases("It's Worth Noting That results vary.");
        assert_eq!(hits, vec!["it's worth noting that"]);
    }

    #[test]
    fn test_count_suspicious() {
        let words: Vec<String> = ["this", "comprehensive", "framework", "delves"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(count_suspicious(&words), 3);
    }
}

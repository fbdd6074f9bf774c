// Text Tokenization Service
// Paragraph/sentence/word splitting used by the analysis pipeline

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Paragraphs shorter than this (after trimming) are treated as artifacts
/// and dropped.
const MIN_PARAGRAPH_CHARS: usize = 10;
/// Sentences shorter than this are dropped as splitter artifacts.
const MIN_SENTENCE_CHARS: usize = 4;

fn paragraph_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").expect("paragraph regex"))
}

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z0-9'_-]+").expect("word regex"))
}

/// Split text into paragraphs on blank lines, dropping very short blocks.
pub fn split_into_paragraphs(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    paragraph_re()
        .split(text)
        .map(|p| p.trim())
        .filter(|p| p.chars().count() >= MIN_PARAGRAPH_CHARS)
        .map(|p| p.to_string())
        .collect()
}

/// Split text into sentences. Walks characters so quoted sentences and
/// decimal numbers do not produce spurious splits.
pub fn split_into_sentences(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let quote_chars: HashSet<char> = ['"', '\u{201c}', '\u{201d}'].into_iter().collect();

    let mut sentences = Vec::new();
    let mut buffer = String::new();
    let mut in_quote = false;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        buffer.push(ch);

        if quote_chars.contains(&ch) {
            in_quote = !in_quote;
        }

        let mut is_sentence_end = false;
        if ['.', '!', '?', '。', '！', '？'].contains(&ch) && !in_quote {
            // Keep decimal numbers like 3.14 intact
            let decimal = ch == '.'
                && i > 0
                && i + 1 < chars.len()
                && chars[i - 1].is_ascii_digit()
                && chars[i + 1].is_ascii_digit();
            if !decimal {
                is_sentence_end = true;
            }
        }

        if is_sentence_end {
            // Absorb consecutive terminators ("...", "?!")
            while i + 1 < chars.len() && ['.', '!', '?'].contains(&chars[i + 1]) {
                i += 1;
                buffer.push(chars[i]);
            }
            let sentence = buffer.trim().to_string();
            if sentence.chars().count() >= MIN_SENTENCE_CHARS {
                sentences.push(sentence);
            }
            buffer.clear();
        }

        i += 1;
    }

    let remaining = buffer.trim().to_string();
    if remaining.chars().count() >= MIN_SENTENCE_CHARS {
        sentences.push(remaining);
    }

    sentences
}

/// Tokenize into lowercase word tokens. Tokens without a letter
/// (bare numbers, stray punctuation) are dropped.
pub fn tokenize_words(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    word_re()
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| w.chars().any(|c| c.is_alphabetic()))
        .collect()
}

// ============ Text Statistics ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStatistics {
    pub character_count: usize,
    pub word_count: usize,
    pub sentence_count: usize,
    pub paragraph_count: usize,
    pub avg_words_per_sentence: f64,
    pub unique_word_count: usize,
    pub lexical_diversity: f64,
}

/// Basic counts used in response metadata.
pub fn text_statistics(text: &str) -> TextStatistics {
    let words = tokenize_words(text);
    let sentences = split_into_sentences(text);
    let paragraphs = split_into_paragraphs(text);
    let unique: HashSet<&String> = words.iter().collect();

    TextStatistics {
        character_count: text.chars().count(),
        word_count: words.len(),
        sentence_count: sentences.len(),
        paragraph_count: paragraphs.len().max(usize::from(!text.trim().is_empty())),
        avg_words_per_sentence: if sentences.is_empty() {
            0.0
        } else {
            words.len() as f64 / sentences.len() as f64
        },
        unique_word_count: unique.len(),
        lexical_diversity: if words.is_empty() {
            0.0
        } else {
            unique.len() as f64 / words.len() as f64
        },
    }
}

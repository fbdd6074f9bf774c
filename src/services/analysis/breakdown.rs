// Breakdown Assembly
// Paragraph/sentence/word evidence for the response. Bounded truncation
// keeps the response small; none of this feeds back into the overall
// score.

use crate::models::{DimensionId, ParagraphAnalysis, SentenceAnalysis, WordImpact, WordScore};
use crate::services::analysis::analyzers::{
    estimate_perplexity, is_stopword, perplexity_to_score, score_word, DimensionAnalyzer,
};
use crate::services::analysis::extractor;
use crate::services::analysis::wordlist;
use crate::services::tokenizer::{split_into_paragraphs, split_into_sentences, tokenize_words};
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_MAX_PARAGRAPHS: usize = 10;
pub const DEFAULT_MAX_SENTENCES_PER_PARAGRAPH: usize = 8;
pub const DEFAULT_MAX_WORD_IMPACT: usize = 20;

/// Words shorter than this, or on the skip list, are not scored
/// individually.
const MIN_SIGNIFICANT_WORD_LEN: usize = 4;
const SKIP_WORDS: &[&str] = &["this", "that", "with", "from", "they", "were", "been"];
const MAX_WORDS_PER_SENTENCE: usize = 10;

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Build the paragraph breakdown: each analyzed paragraph carries a
/// weighted score across the active dimensions and a capped sentence
/// sub-analysis. A synthetic trailing entry reports anything truncated.
pub fn paragraph_breakdown(
    text: &str,
    analyzers: &BTreeMap<DimensionId, Arc<dyn DimensionAnalyzer>>,
    active_weights: &BTreeMap<DimensionId, f64>,
    max_paragraphs: usize,
    max_sentences: usize,
) -> Vec<ParagraphAnalysis> {
    let paragraphs = split_into_paragraphs(text);
    let analyzed_count = paragraphs.len().min(max_paragraphs);
    let mut rows = Vec::with_capacity(analyzed_count + 1);

    for paragraph in paragraphs.iter().take(max_paragraphs) {
        let score = weighted_paragraph_score(paragraph, analyzers, active_weights);
        let sentences = sentence_breakdown(paragraph, max_sentences);
        rows.push(ParagraphAnalysis {
            text: paragraph.clone(),
            score: round3(score),
            sentences,
            truncation_notice: None,
        });
    }

    if paragraphs.len() > max_paragraphs {
        let omitted = paragraphs.len() - max_paragraphs;
        debug!(omitted = omitted, "paragraph breakdown truncated");
        rows.push(ParagraphAnalysis {
            text: String::new(),
            score: 0.0,
            sentences: vec![],
            truncation_notice: Some(format!(
                "{} additional paragraph(s) not analyzed",
                omitted
            )),
        });
    }

    rows
}

fn weighted_paragraph_score(
    paragraph: &str,
    analyzers: &BTreeMap<DimensionId, Arc<dyn DimensionAnalyzer>>,
    active_weights: &BTreeMap<DimensionId, f64>,
) -> f64 {
    if active_weights.is_empty() {
        return 0.5;
    }

    let mut total = 0.0;
    for (dim, weight) in active_weights {
        let score = match analyzers.get(dim) {
            Some(analyzer) => match analyzer.analyze(paragraph) {
                Ok(outcome) => extractor::extract(&outcome),
                Err(_) => 0.5,
            },
            None => 0.5,
        };
        total += score * weight;
    }
    total.clamp(0.0, 1.0)
}

fn sentence_breakdown(paragraph: &str, max_sentences: usize) -> Vec<SentenceAnalysis> {
    let sentences = split_into_sentences(paragraph);
    let mut rows = Vec::with_capacity(sentences.len().min(max_sentences) + 1);

    for sentence in sentences.iter().take(max_sentences) {
        // Perplexity is the primary sentence-level indicator
        let score = perplexity_to_score(estimate_perplexity(sentence));
        rows.push(SentenceAnalysis {
            text: sentence.clone(),
            score: round3(score),
            words: significant_words(sentence),
            truncation_notice: None,
        });
    }

    if sentences.len() > max_sentences {
        rows.push(SentenceAnalysis {
            text: String::new(),
            score: 0.0,
            words: vec![],
            truncation_notice: Some(format!(
                "{} additional sentence(s) not analyzed",
                sentences.len() - max_sentences
            )),
        });
    }

    rows
}

/// High-scoring significant words within one sentence.
fn significant_words(sentence: &str) -> Vec<WordScore> {
    tokenize_words(sentence)
        .into_iter()
        .filter(|w| w.chars().count() >= MIN_SIGNIFICANT_WORD_LEN && !SKIP_WORDS.contains(&w.as_str()))
        .take(MAX_WORDS_PER_SENTENCE)
        .filter_map(|word| {
            let score = wordlist::suspicious_word_score(&word).unwrap_or_else(|| score_word(&word));
            (score > extractor::YELLOW_ALERT_THRESHOLD).then(|| WordScore {
                score: round3(score),
                word,
            })
        })
        .collect()
}

/// Rank words by impact (score x occurrence count), merging the general
/// scoring pass with the suspicious-word catalog. The catalog wins on
/// score when both flag the same word; ties keep the general pass's
/// first-seen order.
pub fn word_impact_ranking(text: &str, limit: usize) -> Vec<WordImpact> {
    let words = tokenize_words(text);
    if words.is_empty() {
        return Vec::new();
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for word in &words {
        let entry = counts.entry(word.as_str()).or_insert(0);
        if *entry == 0 {
            first_seen.push(word.as_str());
        }
        *entry += 1;
    }

    let mut ranking: Vec<WordImpact> = first_seen
        .into_iter()
        .filter(|w| w.chars().count() >= MIN_SIGNIFICANT_WORD_LEN && !is_stopword(w))
        .map(|word| {
            let count = counts[word];
            let general = score_word(word);
            let score = wordlist::suspicious_word_score(word).unwrap_or(general);
            WordImpact {
                word: word.to_string(),
                score: round3(score),
                count,
                impact: round3(score * count as f64),
            }
        })
        .collect();

    // Stable sort keeps first-seen order between equal impacts
    ranking.sort_by(|a, b| b.impact.partial_cmp(&a.impact).unwrap_or(std::cmp::Ordering::Equal));
    ranking.truncate(limit);
    ranking
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analysis::analyzers::default_analyzers;
    use crate::services::analysis::weights::WeightRegistry;

    fn many_paragraphs(n: usize) -> String {
        (0..n)
            .map(|i| {
                format!(
                    "Paragraph number {} contains enough words to be analyzed properly.",
                    i
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    #[test]
    fn test_paragraph_cap_with_truncation_notice() {
        let text = many_paragraphs(13);
        let analyzers = default_analyzers();
        let registry = WeightRegistry::new();
        let weights = registry.weights_for(&DimensionId::ALL);

        let rows = paragraph_breakdown(&text, &analyzers, &weights, 10, 8);
        assert_eq!(rows.len(), 11);
        let last = rows.last().unwrap();
        assert_eq!(
            last.truncation_notice.as_deref(),
            Some("3 additional paragraph(s) not analyzed")
        );
        assert!(rows[..10].iter().all(|r| r.truncation_notice.is_none()));
    }

    #[test]
    fn test_no_truncation_entry_when_under_cap() {
        let text = many_paragraphs(2);
        let analyzers = default_analyzers();
        let registry = WeightRegistry::new();
        let weights = registry.weights_for(&DimensionId::ALL);

        let rows = paragraph_breakdown(&text, &analyzers, &weights, 10, 8);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.truncation_notice.is_none()));
    }

    #[test]
    fn test_sentence_cap_within_paragraph() {
        let sentences: Vec<String> = (0..12)
            .map(|i| format!("Sentence number {} sits in this paragraph.", i))
            .collect();
        let text = sentences.join(" ");
        let analyzers = default_analyzers();
        let registry = WeightRegistry::new();
        let weights = registry.weights_for(&DimensionId::ALL);

        let rows = paragraph_breakdown(&text, &analyzers, &weights, 10, 8);
        assert_eq!(rows.len(), 1);
        let sentence_rows = &rows[0].sentences;
        assert_eq!(sentence_rows.len(), 9);
        assert!(sentence_rows.last().unwrap().truncation_notice.is_some());
    }

    #[test]
    fn test_paragraph_scores_in_range() {
        let text = many_paragraphs(3);
        let analyzers = default_analyzers();
        let registry = WeightRegistry::new();
        let weights = registry.weights_for(&DimensionId::ALL);

        for row in paragraph_breakdown(&text, &analyzers, &weights, 10, 8) {
            assert!((0.0..=1.0).contains(&row.score));
        }
    }

    #[test]
    fn test_word_impact_sorted_descending() {
        let text = "framework framework framework landscape bicycle bicycle \
            comprehensive analysis analysis analysis analysis";
        let ranking = word_impact_ranking(text, 20);
        assert!(!ranking.is_empty());
        for pair in ranking.windows(2) {
            assert!(pair[0].impact >= pair[1].impact);
        }
    }

    #[test]
    fn test_suspicious_catalog_wins_over_general_score() {
        let ranking = word_impact_ranking("framework framework framework", 20);
        let entry = ranking.iter().find(|w| w.word == "framework").unwrap();
        assert_eq!(entry.score, 0.68);
        assert_eq!(entry.count, 3);
        assert!((entry.impact - 0.68 * 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_word_impact_limit() {
        let text = (0..40)
            .map(|i| format!("uniqueword{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let ranking = word_impact_ranking(&text, 20);
        assert!(ranking.len() <= 20);
    }
}

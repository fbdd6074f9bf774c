// Dimension Analyzers
// Seven heuristic detectors, one per dimension. Each is a self-contained
// closed-form pass over the text; scores use soft thresholds (sigmoid)
// and hash-based noise so results are continuous and reproducible.

use crate::error::AnalyzerError;
use crate::models::{
    DimensionOutcome, Evidence, OutcomeDetail, ParagraphDetail, SentenceDetail, WordScore,
};
use crate::services::analysis::dimension::DimensionId;
use crate::services::analysis::wordlist;
use crate::services::tokenizer::{split_into_paragraphs, split_into_sentences, tokenize_words};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Black-box contract the aggregation engine consumes. Implementations
/// must be cheap to share across worker tasks.
pub trait DimensionAnalyzer: Send + Sync {
    fn dimension(&self) -> DimensionId;
    fn analyze(&self, text: &str) -> Result<DimensionOutcome, AnalyzerError>;
}

/// The default analyzer per dimension.
pub fn default_analyzers() -> BTreeMap<DimensionId, Arc<dyn DimensionAnalyzer>> {
    let mut map: BTreeMap<DimensionId, Arc<dyn DimensionAnalyzer>> = BTreeMap::new();
    map.insert(DimensionId::Perplexity, Arc::new(PerplexityAnalyzer));
    map.insert(DimensionId::Burstiness, Arc::new(BurstinessAnalyzer));
    map.insert(
        DimensionId::SemanticCoherence,
        Arc::new(SemanticCoherenceAnalyzer),
    );
    map.insert(
        DimensionId::NgramRepetition,
        Arc::new(NgramRepetitionAnalyzer),
    );
    map.insert(
        DimensionId::LexicalRichness,
        Arc::new(LexicalRichnessAnalyzer),
    );
    map.insert(
        DimensionId::StylisticMarkers,
        Arc::new(StylisticMarkersAnalyzer),
    );
    map.insert(DimensionId::Readability, Arc::new(ReadabilityAnalyzer));
    map
}

// ============================================================================
// Shared scoring helpers
// ============================================================================

/// Smooth transition around `center`; k controls steepness.
#[inline]
pub(crate) fn sigmoid(x: f64, center: f64, k: f64) -> f64 {
    1.0 / (1.0 + ((x - center) / k).exp())
}

/// Deterministic hash-based noise in [-0.5, 0.5] for reproducibility.
pub(crate) fn deterministic_noise(text: &str, seed: u64) -> f64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    seed.hash(&mut hasher);
    let hash = hasher.finish();
    ((hash % 10000) as f64 / 10000.0) - 0.5
}

/// Unigram-entropy perplexity estimate. Returns a value in [20, 300];
/// lower means more predictable text.
pub fn estimate_perplexity(text: &str) -> f64 {
    let tokens = tokenize_words(text);
    if tokens.is_empty() {
        return 120.0;
    }

    let mut freq: HashMap<&str, usize> = HashMap::new();
    for t in &tokens {
        *freq.entry(t.as_str()).or_insert(0) += 1;
    }

    let total = tokens.len() as f64;
    let entropy = -freq
        .values()
        .map(|&c| {
            let p = c as f64 / total;
            p * (p + 1e-12).ln()
        })
        .sum::<f64>();

    let ppl_uni = entropy.exp();
    let ppl_scaled = 20.0 + ((ppl_uni - 1.0) * 22.5).min(280.0);
    let distinct = freq.len() as f64;
    let diversity = distinct / total.max(1.0);
    let base = 120.0 - diversity * 60.0 + (text.chars().count() as f64) / 500.0;
    let val = 0.5 * ppl_scaled + 0.5 * base;
    let clamped = val.clamp(20.0, 300.0);
    (clamped * 100.0).round() / 100.0
}

/// Map an estimated perplexity onto [0,1]: low perplexity (predictable
/// text) scores high.
pub(crate) fn perplexity_to_score(ppl: f64) -> f64 {
    sigmoid(ppl, 120.0, 40.0).clamp(0.0, 1.0)
}

/// Heuristic word-level score used for impact ranking. Long rare-looking
/// words carry more signal than short function words.
pub(crate) fn score_word(word: &str) -> f64 {
    let len = word.chars().count() as f64;
    let base = 0.35 + (len / 24.0).min(0.35);
    let noise = deterministic_noise(word, 7) * 0.2;
    (base + noise).clamp(0.0, 1.0)
}

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "been", "but", "by", "for", "from", "had", "has",
    "have", "he", "her", "his", "i", "in", "is", "it", "its", "of", "on", "or", "she", "that",
    "the", "their", "them", "they", "this", "to", "was", "we", "were", "which", "will", "with",
    "you",
];

pub(crate) fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

fn content_words(sentence: &str) -> HashSet<String> {
    tokenize_words(sentence)
        .into_iter()
        .filter(|w| !is_stopword(w))
        .collect()
}

/// Jaccard overlap of the content words of two sentences. Stands in for
/// embedding cosine similarity.
fn overlap_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    intersection / union.max(1.0)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Byte offsets of each sentence within the source text, in order.
fn sentence_offsets(text: &str, sentences: &[String]) -> Vec<(usize, usize)> {
    let mut offsets = Vec::with_capacity(sentences.len());
    let mut cursor = 0;
    for sentence in sentences {
        match text[cursor..].find(sentence.as_str()) {
            Some(pos) => {
                let start = cursor + pos;
                let end = start + sentence.len();
                offsets.push((start, end));
                cursor = end;
            }
            None => offsets.push((cursor, cursor + sentence.len())),
        }
    }
    offsets
}

fn evidence_reason(dimension: DimensionId, score: f64) -> String {
    if score <= 0.3 {
        format!(
            "Shows natural {} patterns typical of human writing",
            dimension.as_str()
        )
    } else if score <= 0.6 {
        format!("Demonstrates moderate {} characteristics", dimension.as_str())
    } else {
        format!(
            "Exhibits {} patterns often associated with AI generation",
            dimension.as_str()
        )
    }
}

const MAX_EVIDENCE: usize = 10;
const MAX_DETAIL_PARAGRAPHS: usize = 10;
const MAX_DETAIL_SENTENCES: usize = 8;

// ============================================================================
// 1. Perplexity
// ============================================================================

/// Scores text predictability from a unigram-entropy perplexity estimate.
/// Produces a nested paragraph/sentence detail with word-level scores.
pub struct PerplexityAnalyzer;

impl PerplexityAnalyzer {
    fn sentence_score(sentence: &str) -> f64 {
        perplexity_to_score(estimate_perplexity(sentence))
    }

    fn sentence_words(sentence: &str) -> Vec<WordScore> {
        tokenize_words(sentence)
            .into_iter()
            .filter(|w| w.chars().count() > 3 && !is_stopword(w))
            .take(10)
            .filter_map(|w| {
                let score = wordlist::suspicious_word_score(&w).unwrap_or_else(|| score_word(&w));
                (score > 0.6).then(|| WordScore {
                    word: w,
                    score: (score * 1000.0).round() / 1000.0,
                })
            })
            .collect()
    }
}

impl DimensionAnalyzer for PerplexityAnalyzer {
    fn dimension(&self) -> DimensionId {
        DimensionId::Perplexity
    }

    fn analyze(&self, text: &str) -> Result<DimensionOutcome, AnalyzerError> {
        let sentences = split_into_sentences(text);
        if sentences.is_empty() {
            return Ok(DimensionOutcome::neutral());
        }

        let offsets = sentence_offsets(text, &sentences);
        let sentence_scores: Vec<f64> = sentences.iter().map(|s| Self::sentence_score(s)).collect();
        let overall = mean(&sentence_scores).clamp(0.0, 1.0);

        let mut evidence: Vec<Evidence> = sentences
            .iter()
            .zip(offsets.iter())
            .zip(sentence_scores.iter())
            .map(|((sentence, (start, end)), score)| Evidence {
                text: sentence.clone(),
                score: *score,
                start_index: *start,
                end_index: *end,
                evidence_type: "sentence".to_string(),
                reason: evidence_reason(DimensionId::Perplexity, *score),
            })
            .collect();
        evidence.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        evidence.truncate(MAX_EVIDENCE);

        let paragraphs = split_into_paragraphs(text);
        let segments: Vec<ParagraphDetail> = paragraphs
            .iter()
            .take(MAX_DETAIL_PARAGRAPHS)
            .map(|paragraph| {
                let para_score = perplexity_to_score(estimate_perplexity(paragraph));
                let sentence_details: Vec<SentenceDetail> = split_into_sentences(paragraph)
                    .into_iter()
                    .take(MAX_DETAIL_SENTENCES)
                    .map(|sentence| {
                        let score = Self::sentence_score(&sentence);
                        SentenceDetail {
                            words: Self::sentence_words(&sentence),
                            text: sentence,
                            score: (score * 1000.0).round() / 1000.0,
                        }
                    })
                    .collect();
                ParagraphDetail {
                    text: paragraph.clone(),
                    score: (para_score * 1000.0).round() / 1000.0,
                    sentences: sentence_details,
                }
            })
            .collect();

        Ok(DimensionOutcome {
            overall_score: overall,
            evidence,
            detail: if segments.is_empty() {
                OutcomeDetail::None
            } else {
                OutcomeDetail::Segments(segments)
            },
        })
    }
}

// ============================================================================
// 2. Burstiness
// ============================================================================

/// Variation in sentence length and structure. Uniform patterns read as
/// machine-generated; the combined variation score is inverted.
pub struct BurstinessAnalyzer;

impl BurstinessAnalyzer {
    fn length_variation(lengths: &[f64]) -> f64 {
        if lengths.len() < 2 {
            return 0.5;
        }
        let m = mean(lengths);
        if m == 0.0 {
            return 0.0;
        }
        let distinct: HashSet<u64> = lengths.iter().map(|l| *l as u64).collect();
        if distinct.len() == 1 {
            return 0.0;
        }
        // Typical human writing lands at a coefficient of variation of 0.3-0.8
        (std_dev(lengths) / m / 0.8).min(1.0)
    }

    fn sentence_complexity(sentence: &str) -> f64 {
        let words = tokenize_words(sentence);
        if words.is_empty() {
            return 0.0;
        }
        let complex_words = words.iter().filter(|w| w.chars().count() > 6).count() as f64;
        let punctuation = sentence
            .chars()
            .filter(|c| ['.', ',', ';', ':', '!', '?'].contains(c))
            .count() as f64;
        let subordinators = words
            .iter()
            .filter(|w| {
                ["although", "because", "since", "while", "whereas", "if", "unless"]
                    .contains(&w.as_str())
            })
            .count() as f64;
        let n = words.len() as f64;
        (complex_words / n) * 0.4 + (punctuation / n) * 0.3 + (subordinators / n) * 0.3
    }

    fn complexity_variation(sentences: &[String]) -> f64 {
        if sentences.len() < 2 {
            return 0.5;
        }
        let scores: Vec<f64> = sentences.iter().map(|s| Self::sentence_complexity(s)).collect();
        let m = mean(&scores);
        if m > 0.0 {
            (std_dev(&scores) / m).min(1.0)
        } else {
            0.5
        }
    }

    fn start_variation(sentences: &[String]) -> f64 {
        if sentences.len() < 3 {
            return 0.5;
        }
        let first_words: Vec<String> = sentences
            .iter()
            .filter_map(|s| tokenize_words(s).into_iter().next())
            .collect();
        if first_words.len() < 2 {
            return 0.5;
        }
        let unique: HashSet<&String> = first_words.iter().collect();
        unique.len() as f64 / first_words.len() as f64
    }

    fn punctuation_variation(sentences: &[String]) -> f64 {
        if sentences.len() < 2 {
            return 0.5;
        }
        let kinds = ['.', ',', ';', ':', '!', '?', '-', '"'];
        let diversity: Vec<f64> = sentences
            .iter()
            .map(|s| {
                let used = kinds.iter().filter(|k| s.contains(**k)).count() as f64;
                used / kinds.len() as f64
            })
            .collect();
        (std_dev(&diversity) * 2.0).min(1.0)
    }
}

impl DimensionAnalyzer for BurstinessAnalyzer {
    fn dimension(&self) -> DimensionId {
        DimensionId::Burstiness
    }

    fn analyze(&self, text: &str) -> Result<DimensionOutcome, AnalyzerError> {
        let sentences = split_into_sentences(text);
        if sentences.is_empty() {
            return Ok(DimensionOutcome::neutral());
        }

        let lengths: Vec<f64> = sentences
            .iter()
            .map(|s| tokenize_words(s).len() as f64)
            .collect();

        let length_variation = Self::length_variation(&lengths);
        let complexity_variation = Self::complexity_variation(&sentences);
        let start_variation = Self::start_variation(&sentences);
        let punctuation_variation = Self::punctuation_variation(&sentences);

        let burstiness = length_variation * 0.3
            + complexity_variation * 0.3
            + start_variation * 0.2
            + punctuation_variation * 0.2;
        let overall = (1.0 - burstiness).clamp(0.0, 1.0);

        // Uniform adjacent runs are the visible symptom; surface them.
        let offsets = sentence_offsets(text, &sentences);
        let mut evidence = Vec::new();
        for i in 1..sentences.len() {
            if (lengths[i] - lengths[i - 1]).abs() <= 1.0 && lengths[i] >= 4.0 {
                let (start, end) = offsets[i];
                evidence.push(Evidence {
                    text: sentences[i].clone(),
                    score: overall,
                    start_index: start,
                    end_index: end,
                    evidence_type: "sentence".to_string(),
                    reason: format!(
                        "Sentence length ({} words) mirrors the preceding sentence",
                        lengths[i] as usize
                    ),
                });
            }
            if evidence.len() >= MAX_EVIDENCE {
                break;
            }
        }

        let mut metrics = BTreeMap::new();
        metrics.insert("length_variation".to_string(), length_variation);
        metrics.insert("complexity_variation".to_string(), complexity_variation);
        metrics.insert("start_variation".to_string(), start_variation);
        metrics.insert("punctuation_variation".to_string(), punctuation_variation);
        metrics.insert("sentence_count".to_string(), sentences.len() as f64);

        Ok(DimensionOutcome {
            overall_score: overall,
            evidence,
            detail: OutcomeDetail::Metrics(metrics),
        })
    }
}

// ============================================================================
// 3. Semantic coherence
// ============================================================================

/// Topical flow via content-word overlap between sentences. Overly even
/// flow across the whole text is a generation signal; so is near-duplicate
/// meaning in non-adjacent sentences.
pub struct SemanticCoherenceAnalyzer;

// Pairwise comparisons are quadratic; bound the sentence window.
const MAX_COHERENCE_SENTENCES: usize = 30;

impl SemanticCoherenceAnalyzer {
    fn coherence(word_sets: &[HashSet<String>]) -> f64 {
        if word_sets.len() < 2 {
            return 0.5;
        }
        let mut similarities = Vec::new();
        for i in 0..word_sets.len() - 1 {
            for j in (i + 1)..word_sets.len() {
                similarities.push(overlap_similarity(&word_sets[i], &word_sets[j]));
            }
        }
        let avg = mean(&similarities).clamp(0.0, 1.0);
        if avg > 0.7 {
            avg
        } else if avg < 0.3 {
            0.6
        } else {
            avg * 0.8
        }
    }

    fn flow(word_sets: &[HashSet<String>]) -> f64 {
        if word_sets.len() < 3 {
            return 0.5;
        }
        let consecutive: Vec<f64> = word_sets
            .windows(2)
            .map(|pair| overlap_similarity(&pair[0], &pair[1]))
            .collect();
        let spread = std_dev(&consecutive);
        let score = if spread < 0.1 {
            0.8
        } else if spread > 0.3 {
            0.6
        } else {
            1.0 - (spread / 0.3) * 0.5
        };
        score.clamp(0.0, 1.0)
    }

    fn topic_consistency(paragraphs: &[String]) -> f64 {
        if paragraphs.len() < 2 {
            return 0.5;
        }
        let sets: Vec<HashSet<String>> = paragraphs.iter().map(|p| content_words(p)).collect();
        let mut similarities = Vec::new();
        for i in 0..sets.len() - 1 {
            for j in (i + 1)..sets.len() {
                similarities.push(overlap_similarity(&sets[i], &sets[j]));
            }
        }
        let consistency = mean(&similarities);
        let score = if consistency > 0.8 {
            consistency
        } else {
            consistency * 0.7
        };
        score.clamp(0.0, 1.0)
    }

    fn semantic_repetition(word_sets: &[HashSet<String>]) -> f64 {
        if word_sets.len() < 3 {
            return 0.0;
        }
        let mut high = 0usize;
        let mut total = 0usize;
        for i in 0..word_sets.len() {
            for j in (i + 2)..word_sets.len() {
                total += 1;
                if overlap_similarity(&word_sets[i], &word_sets[j]) > 0.8 {
                    high += 1;
                }
            }
        }
        if total == 0 {
            return 0.0;
        }
        ((high as f64 / total as f64) * 3.0).min(1.0)
    }
}

impl DimensionAnalyzer for SemanticCoherenceAnalyzer {
    fn dimension(&self) -> DimensionId {
        DimensionId::SemanticCoherence
    }

    fn analyze(&self, text: &str) -> Result<DimensionOutcome, AnalyzerError> {
        let mut sentences = split_into_sentences(text);
        sentences.truncate(MAX_COHERENCE_SENTENCES);
        if sentences.is_empty() {
            return Ok(DimensionOutcome::neutral());
        }

        let word_sets: Vec<HashSet<String>> = sentences.iter().map(|s| content_words(s)).collect();
        let paragraphs = split_into_paragraphs(text);

        let coherence = Self::coherence(&word_sets);
        let flow = Self::flow(&word_sets);
        let consistency = Self::topic_consistency(&paragraphs);
        let repetition = Self::semantic_repetition(&word_sets);

        let overall =
            (coherence * 0.3 + flow * 0.3 + consistency * 0.2 + repetition * 0.2).clamp(0.0, 1.0);

        // Near-duplicate non-adjacent sentence pairs make the best evidence.
        let offsets = sentence_offsets(text, &sentences);
        let mut evidence = Vec::new();
        'outer: for i in 0..word_sets.len() {
            for j in (i + 2)..word_sets.len() {
                if overlap_similarity(&word_sets[i], &word_sets[j]) > 0.8 {
                    let (start, end) = offsets[j];
                    evidence.push(Evidence {
                        text: sentences[j].clone(),
                        score: 0.85,
                        start_index: start,
                        end_index: end,
                        evidence_type: "sentence".to_string(),
                        reason: "Restates an earlier sentence with nearly identical wording"
                            .to_string(),
                    });
                    if evidence.len() >= MAX_EVIDENCE {
                        break 'outer;
                    }
                }
            }
        }

        let mut metrics = BTreeMap::new();
        metrics.insert("semantic_coherence".to_string(), coherence);
        metrics.insert("semantic_flow".to_string(), flow);
        metrics.insert("topic_consistency".to_string(), consistency);
        metrics.insert("semantic_repetition".to_string(), repetition);
        metrics.insert("sentence_count".to_string(), sentences.len() as f64);

        Ok(DimensionOutcome {
            overall_score: overall,
            evidence,
            detail: OutcomeDetail::Metrics(metrics),
        })
    }
}

// ============================================================================
// 4. N-gram repetition
// ============================================================================

/// Repeated word sequences and predictable transitions.
pub struct NgramRepetitionAnalyzer;

impl NgramRepetitionAnalyzer {
    fn ngrams(words: &[String], n: usize) -> Vec<Vec<&str>> {
        if words.len() < n {
            return Vec::new();
        }
        (0..=words.len() - n)
            .map(|i| words[i..i + n].iter().map(|w| w.as_str()).collect())
            .collect()
    }

    fn ngram_repetition(words: &[String], n: usize) -> f64 {
        let grams = Self::ngrams(words, n);
        if grams.len() < 2 {
            return 0.0;
        }
        let mut counts: HashMap<&[&str], usize> = HashMap::new();
        for gram in &grams {
            *counts.entry(gram.as_slice()).or_insert(0) += 1;
        }
        let total = grams.len() as f64;
        let unique = counts.len() as f64;
        let repetition_ratio = 1.0 - unique / total;

        let mut freqs: Vec<usize> = counts.values().copied().collect();
        freqs.sort_unstable_by(|a, b| b.cmp(a));
        let frequency_weight = freqs.iter().take(5).sum::<usize>() as f64 / total;

        (repetition_ratio * 0.7 + frequency_weight * 0.3).min(1.0)
    }

    fn phrase_repetition(sentences: &[String]) -> f64 {
        if sentences.len() < 2 {
            return 0.0;
        }
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut total = 0usize;
        for sentence in sentences {
            let words = tokenize_words(sentence);
            for len in 3..6 {
                if words.len() < len {
                    continue;
                }
                for window in words.windows(len) {
                    *counts.entry(window.join(" ")).or_insert(0) += 1;
                    total += 1;
                }
            }
        }
        if total < 2 {
            return 0.0;
        }
        let repeated: usize = counts.values().filter(|&&c| c > 1).sum();
        ((repeated as f64 / total as f64) * 2.0).min(1.0)
    }

    fn transition_predictability(words: &[String]) -> f64 {
        if words.len() < 3 {
            return 0.0;
        }
        let mut transitions: HashMap<&str, Vec<&str>> = HashMap::new();
        for pair in words.windows(2) {
            transitions
                .entry(pair[0].as_str())
                .or_default()
                .push(pair[1].as_str());
        }

        let mut scores = Vec::new();
        for nexts in transitions.values() {
            if nexts.len() < 2 {
                continue;
            }
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for next in nexts {
                *counts.entry(next).or_insert(0) += 1;
            }
            let total = nexts.len() as f64;
            let entropy = -counts
                .values()
                .map(|&c| {
                    let p = c as f64 / total;
                    p * p.log2()
                })
                .sum::<f64>();
            let max_entropy = (counts.len() as f64).log2();
            scores.push(if max_entropy > 0.0 {
                1.0 - entropy / max_entropy
            } else {
                1.0
            });
        }

        if scores.is_empty() {
            0.5
        } else {
            mean(&scores)
        }
    }

    fn inverse_diversity(words: &[String]) -> f64 {
        if words.len() < 5 {
            return 0.5;
        }
        let unique: HashSet<&String> = words.iter().collect();
        let basic_ttr = unique.len() as f64 / words.len() as f64;

        // Moving-average TTR over a fixed window
        let window = words.len().min(50);
        let mut mattr_scores = Vec::new();
        for chunk in words.windows(window) {
            let chunk_unique: HashSet<&String> = chunk.iter().collect();
            mattr_scores.push(chunk_unique.len() as f64 / window as f64);
        }
        let mattr = if mattr_scores.is_empty() {
            basic_ttr
        } else {
            mean(&mattr_scores)
        };

        1.0 - (basic_ttr + mattr) / 2.0
    }
}

impl DimensionAnalyzer for NgramRepetitionAnalyzer {
    fn dimension(&self) -> DimensionId {
        DimensionId::NgramRepetition
    }

    fn analyze(&self, text: &str) -> Result<DimensionOutcome, AnalyzerError> {
        let words = tokenize_words(text);
        if words.is_empty() {
            return Ok(DimensionOutcome::neutral());
        }
        let sentences = split_into_sentences(text);

        let bigram = Self::ngram_repetition(&words, 2);
        let trigram = Self::ngram_repetition(&words, 3);
        let phrase = Self::phrase_repetition(&sentences);
        let transition = Self::transition_predictability(&words);
        let diversity = Self::inverse_diversity(&words);

        let overall = (bigram * 0.2 + trigram * 0.2 + phrase * 0.2 + transition * 0.2
            + diversity * 0.2)
            .clamp(0.0, 1.0);

        // Most repeated trigrams become evidence spans.
        let mut trigram_counts: HashMap<String, usize> = HashMap::new();
        for gram in Self::ngrams(&words, 3) {
            *trigram_counts.entry(gram.join(" ")).or_insert(0) += 1;
        }
        let mut repeated: Vec<(String, usize)> = trigram_counts
            .into_iter()
            .filter(|(_, c)| *c > 1)
            .collect();
        repeated.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let lowered = text.to_lowercase();
        let evidence: Vec<Evidence> = repeated
            .into_iter()
            .take(MAX_EVIDENCE)
            .map(|(pattern, count)| {
                let start = lowered.find(&pattern).unwrap_or(0);
                Evidence {
                    end_index: start + pattern.len(),
                    start_index: start,
                    score: (0.5 + 0.1 * count as f64).min(0.95),
                    reason: format!("Word sequence repeated {} times", count),
                    evidence_type: "ngram".to_string(),
                    text: pattern,
                }
            })
            .collect();

        let mut metrics = BTreeMap::new();
        metrics.insert("bigram_repetition".to_string(), bigram);
        metrics.insert("trigram_repetition".to_string(), trigram);
        metrics.insert("phrase_repetition".to_string(), phrase);
        metrics.insert("transition_predictability".to_string(), transition);
        metrics.insert("lexical_diversity".to_string(), diversity);

        Ok(DimensionOutcome {
            overall_score: overall,
            evidence,
            detail: OutcomeDetail::Metrics(metrics),
        })
    }
}

// ============================================================================
// 5. Lexical richness
// ============================================================================

/// Vocabulary variety via per-sentence Type-Token Ratio banding.
pub struct LexicalRichnessAnalyzer;

impl LexicalRichnessAnalyzer {
    fn sentence_ttr(words: &[String]) -> f64 {
        if words.is_empty() {
            return 0.0;
        }
        let unique: HashSet<&String> = words.iter().collect();
        unique.len() as f64 / words.len() as f64
    }

    fn band_score(ttr: f64, sentence: &str) -> f64 {
        let noise = deterministic_noise(sentence, 11) * 0.2;
        let base = if ttr < 0.5 {
            0.7
        } else if ttr > 0.95 {
            0.6
        } else {
            0.3
        };
        (base + noise).clamp(0.0, 1.0)
    }
}

impl DimensionAnalyzer for LexicalRichnessAnalyzer {
    fn dimension(&self) -> DimensionId {
        DimensionId::LexicalRichness
    }

    fn analyze(&self, text: &str) -> Result<DimensionOutcome, AnalyzerError> {
        let sentences = split_into_sentences(text);
        let offsets = sentence_offsets(text, &sentences);

        let mut scores = Vec::new();
        let mut ttrs = Vec::new();
        let mut evidence = Vec::new();

        for (sentence, (start, end)) in sentences.iter().zip(offsets.iter()) {
            let words = tokenize_words(sentence);
            if words.len() < 3 {
                continue;
            }
            let ttr = Self::sentence_ttr(&words);
            let score = Self::band_score(ttr, sentence);
            ttrs.push(ttr);
            scores.push(score);

            if evidence.len() < MAX_EVIDENCE {
                let unique: HashSet<&String> = words.iter().collect();
                let reason = if score > 0.6 && ttr < 0.5 {
                    format!(
                        "Low vocabulary diversity suggesting repetitive patterns: {}/{} words (TTR: {:.2})",
                        unique.len(),
                        words.len(),
                        ttr
                    )
                } else if score > 0.6 {
                    format!(
                        "Unusual lexical patterns: {}/{} unique words (TTR: {:.2})",
                        unique.len(),
                        words.len(),
                        ttr
                    )
                } else {
                    format!(
                        "Natural vocabulary diversity: {}/{} unique words (TTR: {:.2})",
                        unique.len(),
                        words.len(),
                        ttr
                    )
                };
                evidence.push(Evidence {
                    text: sentence.clone(),
                    score,
                    start_index: *start,
                    end_index: *end,
                    evidence_type: "sentence".to_string(),
                    reason,
                });
            }
        }

        if scores.is_empty() {
            return Ok(DimensionOutcome::neutral());
        }

        let overall = mean(&scores).clamp(0.0, 1.0);

        let mut metrics = BTreeMap::new();
        metrics.insert("avg_sentence_ttr".to_string(), mean(&ttrs));
        metrics.insert("scored_sentences".to_string(), scores.len() as f64);

        Ok(DimensionOutcome {
            overall_score: overall,
            evidence,
            detail: OutcomeDetail::Metrics(metrics),
        })
    }
}

// ============================================================================
// 6. Stylistic markers
// ============================================================================

/// Punctuation, word-shape, and structural patterns, plus hits from the
/// suspicious-word catalog.
pub struct StylisticMarkersAnalyzer;

impl StylisticMarkersAnalyzer {
    fn punctuation_score(sentence: &str, word_count: usize) -> f64 {
        if word_count == 0 {
            return 0.5;
        }
        let punct = sentence
            .chars()
            .filter(|c| [',', ';', '!', '?', '"', '\''].contains(c))
            .count() as f64;
        let density = punct / word_count as f64;
        let noise = deterministic_noise(sentence, 13) * 0.2;
        let base = if density > 0.3 {
            0.7
        } else if density < 0.02 {
            0.6
        } else {
            0.3
        };
        (base + noise).clamp(0.0, 1.0)
    }

    fn word_pattern_score(words: &[String], sentence: &str) -> f64 {
        if words.len() < 3 {
            return 0.5;
        }
        let n = words.len() as f64;
        let avg_len = words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / n;
        let long_ratio = words.iter().filter(|w| w.chars().count() > 7).count() as f64 / n;
        let short_ratio = words.iter().filter(|w| w.chars().count() <= 3).count() as f64 / n;
        let noise = deterministic_noise(sentence, 17) * 0.2;
        let base = if avg_len > 8.0 {
            0.6
        } else if long_ratio > 0.4 {
            0.7
        } else if short_ratio > 0.7 {
            0.6
        } else {
            0.3
        };
        (base + noise).clamp(0.0, 1.0)
    }

    fn structure_score(sentence: &str, words: &[String]) -> f64 {
        if words.len() < 3 {
            return 0.5;
        }
        let raw_words: Vec<&str> = sentence.split_whitespace().collect();
        let capitalized = raw_words
            .iter()
            .filter(|w| w.chars().next().map(|c| c.is_uppercase()).unwrap_or(false))
            .count() as f64;
        let cap_ratio = capitalized / raw_words.len().max(1) as f64;
        let noise = deterministic_noise(sentence, 19) * 0.2;
        let base = if cap_ratio > 0.5 { 0.6 } else { 0.3 };
        (base + noise).clamp(0.0, 1.0)
    }
}

impl DimensionAnalyzer for StylisticMarkersAnalyzer {
    fn dimension(&self) -> DimensionId {
        DimensionId::StylisticMarkers
    }

    fn analyze(&self, text: &str) -> Result<DimensionOutcome, AnalyzerError> {
        let sentences = split_into_sentences(text);
        if sentences.is_empty() {
            return Ok(DimensionOutcome::neutral());
        }

        let mut sentence_scores = Vec::new();
        for sentence in &sentences {
            let words = tokenize_words(sentence);
            if sentence.chars().count() < 5 {
                continue;
            }
            let score = (Self::punctuation_score(sentence, words.len())
                + Self::word_pattern_score(&words, sentence)
                + Self::structure_score(sentence, &words))
                / 3.0;
            sentence_scores.push(score);
        }
        let structural = if sentence_scores.is_empty() {
            0.5
        } else {
            mean(&sentence_scores)
        };

        // Catalog component: suspicious vocabulary density plus phrase hits.
        let all_words = tokenize_words(text);
        let suspicious = wordlist::count_suspicious(&all_words);
        let suspicious_ratio = suspicious as f64 / all_words.len().max(1) as f64;
        let phrases = wordlist::matched_phrases(text);
        let catalog =
            ((suspicious_ratio * 10.0) + phrases.len() as f64 * 0.15).min(1.0);

        let overall = (structural * 0.7 + catalog * 0.3).clamp(0.0, 1.0);

        let lowered = text.to_lowercase();
        let mut evidence: Vec<Evidence> = phrases
            .iter()
            .take(MAX_EVIDENCE)
            .map(|phrase| {
                let start = lowered.find(phrase).unwrap_or(0);
                Evidence {
                    text: (*phrase).to_string(),
                    score: wordlist::PHRASE_SCORE,
                    start_index: start,
                    end_index: start + phrase.len(),
                    evidence_type: "phrase".to_string(),
                    reason: "Formulaic phrasing common in machine-generated prose".to_string(),
                }
            })
            .collect();
        for word in &all_words {
            if evidence.len() >= MAX_EVIDENCE {
                break;
            }
            if let Some(score) = wordlist::suspicious_word_score(word) {
                let start = lowered.find(word.as_str()).unwrap_or(0);
                evidence.push(Evidence {
                    text: word.clone(),
                    score,
                    start_index: start,
                    end_index: start + word.len(),
                    evidence_type: "word".to_string(),
                    reason: "Vocabulary disproportionately favored by language models"
                        .to_string(),
                });
            }
        }

        let mut metrics = BTreeMap::new();
        metrics.insert("structural_score".to_string(), structural);
        metrics.insert("suspicious_word_ratio".to_string(), suspicious_ratio);
        metrics.insert("formulaic_phrase_count".to_string(), phrases.len() as f64);

        Ok(DimensionOutcome {
            overall_score: overall,
            evidence,
            detail: OutcomeDetail::Metrics(metrics),
        })
    }
}

// ============================================================================
// 7. Readability
// ============================================================================

/// Flesch Reading Ease approximation with a structural-complexity blend.
pub struct ReadabilityAnalyzer;

impl ReadabilityAnalyzer {
    fn syllables(word: &str) -> usize {
        let mut count = 0;
        let mut prev_vowel = false;
        for c in word.chars() {
            let vowel = "aeiouAEIOU".contains(c);
            if vowel && !prev_vowel {
                count += 1;
            }
            prev_vowel = vowel;
        }
        count.max(1)
    }

    /// 206.835 - 1.015 * ASL - 84.6 * ASW, clamped to [0, 100].
    fn flesch(words: &[String]) -> f64 {
        if words.is_empty() {
            return 50.0;
        }
        let total_syllables: usize = words.iter().map(|w| Self::syllables(w)).sum();
        let asw = total_syllables as f64 / words.len() as f64;
        let asl = words.len() as f64;
        (206.835 - 1.015 * asl - 84.6 * asw).clamp(0.0, 100.0)
    }

    fn complexity(sentence: &str, words: &[String]) -> f64 {
        if words.is_empty() {
            return 0.5;
        }
        let n = words.len() as f64;
        let long_ratio = words.iter().filter(|w| w.chars().count() > 6).count() as f64 / n;
        let connectors = words
            .iter()
            .filter(|w| {
                [
                    "however",
                    "therefore",
                    "moreover",
                    "furthermore",
                    "consequently",
                    "nevertheless",
                    "nonetheless",
                    "although",
                    "whereas",
                    "whereby",
                ]
                .contains(&w.as_str())
            })
            .count();
        let complex_punct = sentence.matches(',').count()
            + sentence.matches(';').count() * 2
            + sentence.matches(':').count() * 2;

        let noise = deterministic_noise(sentence, 23) * 0.2;
        let base = if words.len() > 25 {
            0.7
        } else if long_ratio > 0.5 {
            0.6
        } else if connectors > 2 {
            0.6
        } else if complex_punct as f64 > n * 0.3 {
            0.6
        } else {
            0.3
        };
        (base + noise).clamp(0.0, 1.0)
    }
}

impl DimensionAnalyzer for ReadabilityAnalyzer {
    fn dimension(&self) -> DimensionId {
        DimensionId::Readability
    }

    fn analyze(&self, text: &str) -> Result<DimensionOutcome, AnalyzerError> {
        let sentences = split_into_sentences(text);
        let offsets = sentence_offsets(text, &sentences);

        let mut scores = Vec::new();
        let mut flesch_values = Vec::new();
        let mut evidence = Vec::new();

        for (sentence, (start, end)) in sentences.iter().zip(offsets.iter()) {
            if sentence.chars().count() < 5 {
                continue;
            }
            let words = tokenize_words(sentence);
            let flesch = Self::flesch(&words);
            let noise = deterministic_noise(sentence, 29) * 0.2;
            let band = if flesch > 90.0 {
                0.6
            } else if flesch < 30.0 {
                0.7
            } else {
                0.3
            };
            let band = (band + noise).clamp(0.0, 1.0);
            let combined = (band + Self::complexity(sentence, &words)) / 2.0;

            flesch_values.push(flesch);
            scores.push(combined);

            if combined > 0.6 && evidence.len() < MAX_EVIDENCE {
                let reason = if flesch < 30.0 {
                    format!("Unusually dense sentence (Flesch {:.0})", flesch)
                } else if flesch > 90.0 {
                    format!("Unusually simplistic sentence (Flesch {:.0})", flesch)
                } else {
                    "Complexity markers out of balance".to_string()
                };
                evidence.push(Evidence {
                    text: sentence.clone(),
                    score: combined,
                    start_index: *start,
                    end_index: *end,
                    evidence_type: "sentence".to_string(),
                    reason,
                });
            }
        }

        if scores.is_empty() {
            return Ok(DimensionOutcome::neutral());
        }

        let overall = mean(&scores).clamp(0.0, 1.0);

        let mut metrics = BTreeMap::new();
        metrics.insert("avg_flesch".to_string(), mean(&flesch_values));
        metrics.insert("scored_sentences".to_string(), scores.len() as f64);

        Ok(DimensionOutcome {
            overall_score: overall,
            evidence,
            detail: OutcomeDetail::Metrics(metrics),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HUMAN_TEXT: &str = "I grabbed coffee before the rain started, which was lucky. \
        My neighbor's dog had knocked over the bins again overnight. Cleaning that mess took \
        ages, honestly. Later we argued about whose turn it was to fix the fence, and nobody won.";

    const REPETITIVE_TEXT: &str = "The quick brown fox jumps over the lazy dog. \
        The quick brown fox jumps over the lazy dog. The quick brown fox jumps over the lazy dog. \
        The same phrase repeats here. The same phrase repeats here. The same phrase repeats here.";

    #[test]
    fn test_estimate_perplexity_bounds() {
        let ppl = estimate_perplexity(HUMAN_TEXT);
        assert!((20.0..=300.0).contains(&ppl));
        assert_eq!(estimate_perplexity(""), 120.0);
    }

    #[test]
    fn test_perplexity_outcome_has_segments_detail() {
        let outcome = PerplexityAnalyzer.analyze(HUMAN_TEXT).unwrap();
        assert!((0.0..=1.0).contains(&outcome.overall_score));
        assert!(matches!(outcome.detail, OutcomeDetail::Segments(_)));
        assert!(!outcome.evidence.is_empty());
    }

    #[test]
    fn test_ngram_scores_repetitive_higher() {
        let repetitive = NgramRepetitionAnalyzer
            .analyze(REPETITIVE_TEXT)
            .unwrap()
            .overall_score;
        let varied = NgramRepetitionAnalyzer
            .analyze(HUMAN_TEXT)
            .unwrap()
            .overall_score;
        assert!(
            repetitive > varied,
            "repetitive={} varied={}",
            repetitive,
            varied
        );
    }

    #[test]
    fn test_burstiness_uniform_higher_than_varied() {
        let uniform = "The cat sat on the mat today. The dog ran in the park today. \
            The bird flew over the house today. The fish swam in the bowl today.";
        let uniform_score = BurstinessAnalyzer.analyze(uniform).unwrap().overall_score;
        let varied_score = BurstinessAnalyzer.analyze(HUMAN_TEXT).unwrap().overall_score;
        assert!(
            uniform_score >= varied_score,
            "uniform={} varied={}",
            uniform_score,
            varied_score
        );
    }

    #[test]
    fn test_stylistic_catalog_lifts_score() {
        let slop = "This comprehensive analysis delves into the nuanced landscape of \
            modern technology. It's worth noting that this approach leverages cutting-edge \
            methodologies to underscore the implications of the framework.";
        let slop_score = StylisticMarkersAnalyzer.analyze(slop).unwrap();
        let plain_score = StylisticMarkersAnalyzer.analyze(HUMAN_TEXT).unwrap();
        assert!(slop_score.overall_score > plain_score.overall_score);
        assert!(!slop_score.evidence.is_empty());
    }

    #[test]
    fn test_all_analyzers_in_range_and_deterministic() {
        for (_, analyzer) in default_analyzers() {
            let first = analyzer.analyze(HUMAN_TEXT).unwrap();
            let second = analyzer.analyze(HUMAN_TEXT).unwrap();
            assert!((0.0..=1.0).contains(&first.overall_score));
            assert_eq!(first.overall_score, second.overall_score);
        }
    }

    #[test]
    fn test_readability_flesch_bounds() {
        let words = tokenize_words("the cat sat");
        let flesch = ReadabilityAnalyzer::flesch(&words);
        assert!((0.0..=100.0).contains(&flesch));
    }

    #[test]
    fn test_syllable_estimate() {
        assert_eq!(ReadabilityAnalyzer::syllables("cat"), 1);
        assert_eq!(ReadabilityAnalyzer::syllables("beautiful"), 3);
        assert!(ReadabilityAnalyzer::syllables("x") >= 1);
    }
}

// Dimension metadata
// The seven detection dimensions, their granularity, and default weights.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Granularity at which a dimension inspects text.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisGranularity {
    Sentence,
    Paragraph,
    Global,
}

/// Canonical identifier of a detection dimension. The set is fixed at
/// seven members; every id maps to exactly one analyzer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionId {
    Perplexity,
    Burstiness,
    SemanticCoherence,
    NgramRepetition,
    LexicalRichness,
    StylisticMarkers,
    Readability,
}

impl DimensionId {
    /// Stable iteration order used for sequential scheduling and
    /// response assembly.
    pub const ALL: [DimensionId; 7] = [
        DimensionId::Perplexity,
        DimensionId::Burstiness,
        DimensionId::SemanticCoherence,
        DimensionId::NgramRepetition,
        DimensionId::LexicalRichness,
        DimensionId::StylisticMarkers,
        DimensionId::Readability,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DimensionId::Perplexity => "perplexity",
            DimensionId::Burstiness => "burstiness",
            DimensionId::SemanticCoherence => "semantic_coherence",
            DimensionId::NgramRepetition => "ngram_repetition",
            DimensionId::LexicalRichness => "lexical_richness",
            DimensionId::StylisticMarkers => "stylistic_markers",
            DimensionId::Readability => "readability",
        }
    }

    pub fn parse(value: &str) -> Option<DimensionId> {
        match value.trim().to_lowercase().as_str() {
            "perplexity" => Some(DimensionId::Perplexity),
            "burstiness" => Some(DimensionId::Burstiness),
            "semantic_coherence" => Some(DimensionId::SemanticCoherence),
            "ngram_repetition" => Some(DimensionId::NgramRepetition),
            "lexical_richness" => Some(DimensionId::LexicalRichness),
            "stylistic_markers" => Some(DimensionId::StylisticMarkers),
            "readability" => Some(DimensionId::Readability),
            _ => None,
        }
    }

    pub fn granularity(&self) -> AnalysisGranularity {
        match self {
            DimensionId::Perplexity => AnalysisGranularity::Sentence,
            DimensionId::Burstiness => AnalysisGranularity::Paragraph,
            DimensionId::SemanticCoherence => AnalysisGranularity::Paragraph,
            DimensionId::NgramRepetition => AnalysisGranularity::Global,
            DimensionId::LexicalRichness => AnalysisGranularity::Sentence,
            DimensionId::StylisticMarkers => AnalysisGranularity::Sentence,
            DimensionId::Readability => AnalysisGranularity::Sentence,
        }
    }

    /// Default weight share. Readability absorbs the rounding remainder
    /// so the seven weights sum to exactly 1.0.
    pub fn default_weight(&self) -> f64 {
        match self {
            DimensionId::Readability => 0.142,
            _ => 0.143,
        }
    }

    pub fn info(&self) -> DimensionInfo {
        let (name, description, score_interpretation) = match self {
            DimensionId::Perplexity => (
                "Perplexity",
                "Measures how predictable the text is to a language model",
                "Low predictability = human-like, high = possibly AI-generated",
            ),
            DimensionId::Burstiness => (
                "Burstiness",
                "Measures variation in sentence length and structure",
                "Uniform sentence patterns = possible AI generation",
            ),
            DimensionId::SemanticCoherence => (
                "Semantic Coherence",
                "Analyzes topical flow and consistency between sentences",
                "Overly consistent semantic flow = possible AI generation",
            ),
            DimensionId::NgramRepetition => (
                "N-gram Repetition",
                "Detects repeated word sequences and predictable transitions",
                "High repetition = possible AI generation",
            ),
            DimensionId::LexicalRichness => (
                "Lexical Richness",
                "Measures vocabulary variety using Type-Token Ratio analysis",
                "Low = repetitive/poor vocabulary, High = rich",
            ),
            DimensionId::StylisticMarkers => (
                "Stylistic Markers",
                "Identifies unusual stylistic patterns in punctuation and word usage",
                "Deviations from balanced style = possible artificial generation",
            ),
            DimensionId::Readability => (
                "Readability",
                "Measures natural readability using Flesch Reading Ease and complexity metrics",
                "Very high = too simplistic, Very low = too complex",
            ),
        };
        DimensionInfo {
            name: name.to_string(),
            description: description.to_string(),
            score_interpretation: score_interpretation.to_string(),
            granularity: self.granularity(),
        }
    }
}

impl fmt::Display for DimensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static per-dimension description exposed through the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionInfo {
    pub name: String,
    pub description: String,
    pub score_interpretation: String,
    pub granularity: AnalysisGranularity,
}

/// Default weight table: equal distribution with the rounding remainder
/// on readability.
pub fn default_weights() -> BTreeMap<DimensionId, f64> {
    DimensionId::ALL
        .iter()
        .map(|d| (*d, d.default_weight()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        let total: f64 = default_weights().values().sum();
        assert!((total - 1.0).abs() < 1e-9, "got {}", total);
    }

    #[test]
    fn test_parse_roundtrip() {
        for dim in DimensionId::ALL {
            assert_eq!(DimensionId::parse(dim.as_str()), Some(dim));
        }
        assert_eq!(DimensionId::parse("unknown"), None);
    }

    #[test]
    fn test_info_granularity_matches() {
        assert_eq!(
            DimensionId::NgramRepetition.info().granularity,
            AnalysisGranularity::Global
        );
    }
}

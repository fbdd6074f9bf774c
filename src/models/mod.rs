// Origo Data Models
// Wire-facing result structures shared by the analysis services

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Re-export dimension metadata from the analysis module
pub use crate::services::analysis::dimension::{AnalysisGranularity, DimensionId, DimensionInfo};

// ============ Evidence ============

/// A text span supporting a dimension score, with a human-readable reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub text: String,
    pub score: f64,
    pub start_index: usize,
    pub end_index: usize,
    #[serde(rename = "type")]
    pub evidence_type: String,
    #[serde(default)]
    pub reason: String,
}

// ============ Dimension Outcome ============

/// Output of one analyzer invocation. Immutable once returned; the
/// aggregation path only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionOutcome {
    pub overall_score: f64,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    #[serde(default)]
    pub detail: OutcomeDetail,
}

impl DimensionOutcome {
    /// Bare score with no supporting structure.
    pub fn scalar(score: f64) -> Self {
        Self {
            overall_score: score,
            evidence: Vec::new(),
            detail: OutcomeDetail::None,
        }
    }

    /// Neutral marker substituted for failed dimensions.
    pub fn neutral() -> Self {
        Self::scalar(0.5)
    }

    /// Top evidences by score, capped for UI display.
    pub fn top_evidence(&self, limit: usize) -> Vec<Evidence> {
        let mut sorted = self.evidence.clone();
        sorted.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        sorted.truncate(limit);
        sorted
    }
}

/// Analyzer detail payload. Serialized untagged so the JSON keeps the
/// historical shapes: null, a flat metric map, or a paragraph array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutcomeDetail {
    #[default]
    None,
    Metrics(BTreeMap<String, f64>),
    Segments(Vec<ParagraphDetail>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphDetail {
    pub text: String,
    pub score: f64,
    #[serde(default)]
    pub sentences: Vec<SentenceDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceDetail {
    pub text: String,
    pub score: f64,
    #[serde(default)]
    pub words: Vec<WordScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordScore {
    pub word: String,
    pub score: f64,
}

// ============ Breakdown Rows ============

/// One analyzed paragraph in the response breakdown. A synthetic trailing
/// entry with `truncation_notice` set marks omitted paragraphs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphAnalysis {
    pub text: String,
    pub score: f64,
    #[serde(default)]
    pub sentences: Vec<SentenceAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncation_notice: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceAnalysis {
    pub text: String,
    pub score: f64,
    #[serde(default)]
    pub words: Vec<WordScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncation_notice: Option<String>,
}

/// Word-level impact entry: score weighted by occurrence count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordImpact {
    pub word: String,
    pub score: f64,
    pub count: usize,
    pub impact: f64,
}

// ============ Comprehensive Result ============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    pub text_length: usize,
    pub word_count: usize,
    pub sentence_count: usize,
    pub paragraph_count: usize,
    pub processing_time_seconds: f64,
    #[serde(default)]
    pub weights_used: BTreeMap<DimensionId, f64>,
    pub parallel_enabled: bool,
    pub caching_enabled: bool,
    #[serde(default)]
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The engine's public output. Every response has this shape whether the
/// run was fully successful, degraded, or a terminal empty/error state;
/// `metadata.error` is the only degradation signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensiveResult {
    pub overall_score: f64,
    /// None = dimension disabled for this call.
    pub per_dimension_scores: BTreeMap<DimensionId, Option<f64>>,
    pub per_dimension_detail: BTreeMap<DimensionId, Option<DimensionOutcome>>,
    pub weights_applied: BTreeMap<DimensionId, f64>,
    pub active_dimensions: Vec<DimensionId>,
    #[serde(default)]
    pub paragraph_breakdown: Vec<ParagraphAnalysis>,
    #[serde(default)]
    pub word_impact_ranking: Vec<WordImpact>,
    pub metadata: AnalysisMetadata,
}

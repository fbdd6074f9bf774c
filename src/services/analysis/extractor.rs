// Score Extraction
// Normalizes heterogeneous analyzer outcomes into a single [0,1] score.
//
// Nested paragraph/sentence details use threshold aggregation: only
// sub-scores at or above the yellow-alert threshold are averaged, so the
// worst offending segments set the tone instead of being smoothed away by
// a flat mean.

use crate::models::{DimensionOutcome, OutcomeDetail};
use tracing::warn;

/// Sub-scores at or above this value participate in threshold aggregation.
pub const YELLOW_ALERT_THRESHOLD: f64 = 0.6;

/// Fallback when an outcome carries no usable number.
const NEUTRAL_SCORE: f64 = 0.5;

/// Extract a single [0,1] score from an analyzer outcome. Never panics;
/// malformed values degrade to the neutral score.
pub fn extract(outcome: &DimensionOutcome) -> f64 {
    let score = match &outcome.detail {
        OutcomeDetail::Segments(paragraphs) => {
            let mut flagged = Vec::new();
            for paragraph in paragraphs {
                if paragraph.score.is_finite() && paragraph.score >= YELLOW_ALERT_THRESHOLD {
                    flagged.push(paragraph.score);
                }
                for sentence in &paragraph.sentences {
                    if sentence.score.is_finite() && sentence.score >= YELLOW_ALERT_THRESHOLD {
                        flagged.push(sentence.score);
                    }
                }
            }
            if flagged.is_empty() {
                sanitize(outcome.overall_score)
            } else {
                flagged.iter().sum::<f64>() / flagged.len() as f64
            }
        }
        OutcomeDetail::None | OutcomeDetail::Metrics(_) => sanitize(outcome.overall_score),
    };

    score.clamp(0.0, 1.0)
}

fn sanitize(score: f64) -> f64 {
    if score.is_finite() {
        score
    } else {
        warn!(score = ?score, "non-finite dimension score, substituting neutral");
        NEUTRAL_SCORE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParagraphDetail, SentenceDetail};

    fn paragraph(score: f64) -> ParagraphDetail {
        ParagraphDetail {
            text: String::new(),
            score,
            sentences: vec![],
        }
    }

    #[test]
    fn test_threshold_aggregation_averages_flagged_only() {
        let outcome = DimensionOutcome {
            overall_score: 0.475,
            evidence: vec![],
            detail: OutcomeDetail::Segments(vec![
                paragraph(0.9),
                paragraph(0.2),
                paragraph(0.7),
                paragraph(0.1),
            ]),
        };
        let extracted = extract(&outcome);
        assert!((extracted - 0.8).abs() < 1e-9, "got {}", extracted);
    }

    #[test]
    fn test_threshold_aggregation_includes_sentence_scores() {
        let outcome = DimensionOutcome {
            overall_score: 0.3,
            evidence: vec![],
            detail: OutcomeDetail::Segments(vec![ParagraphDetail {
                text: String::new(),
                score: 0.2,
                sentences: vec![
                    SentenceDetail {
                        text: String::new(),
                        score: 0.8,
                        words: vec![],
                    },
                    SentenceDetail {
                        text: String::new(),
                        score: 0.4,
                        words: vec![],
                    },
                ],
            }]),
        };
        assert!((extract(&outcome) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_no_flagged_segments_falls_back_to_overall() {
        let outcome = DimensionOutcome {
            overall_score: 0.42,
            evidence: vec![],
            detail: OutcomeDetail::Segments(vec![paragraph(0.1), paragraph(0.3)]),
        };
        assert!((extract(&outcome) - 0.42).abs() < 1e-9);
    }

    #[test]
    fn test_bare_score_passthrough_with_clamp() {
        assert_eq!(extract(&DimensionOutcome::scalar(0.73)), 0.73);
        assert_eq!(extract(&DimensionOutcome::scalar(1.7)), 1.0);
        assert_eq!(extract(&DimensionOutcome::scalar(-0.2)), 0.0);
    }

    #[test]
    fn test_non_finite_defaults_to_neutral() {
        assert_eq!(extract(&DimensionOutcome::scalar(f64::NAN)), 0.5);
        assert_eq!(extract(&DimensionOutcome::scalar(f64::INFINITY)), 0.5);
    }
}

// Aggregation Engine
// Top-level orchestrator: schedules the enabled dimensions, extracts and
// fuses their scores under the configured weighting, assembles the
// bounded breakdown, and caches the comprehensive result.
//
// The engine always answers with a well-formed result. Degradation is
// signalled only through metadata.error; no call path raises to the
// caller.

use crate::error::ConfigurationError;
use crate::models::{
    AnalysisMetadata, ComprehensiveResult, DimensionId, DimensionInfo, DimensionOutcome,
};
use crate::services::analysis::analyzers::{default_analyzers, DimensionAnalyzer};
use crate::services::analysis::breakdown;
use crate::services::analysis::cache::{CachedValue, ResultCache};
use crate::services::analysis::extractor;
use crate::services::analysis::scheduler::{
    DimensionRun, ExecutionMode, Scheduler, SchedulerConfig,
};
use crate::services::analysis::weights::WeightRegistry;
use crate::services::tokenizer::text_statistics;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};
use uuid::Uuid;

/// Neutral score reported when analysis is degraded or no dimension is
/// active. Deliberately 0.5, not 0.0, so consumers are not nudged toward
/// "definitely human".
const NEUTRAL_OVERALL: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub parallel_enabled: bool,
    pub max_workers: usize,
    pub task_timeout: Duration,
    pub join_timeout: Duration,
    pub caching_enabled: bool,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    pub max_paragraphs: usize,
    pub max_sentences_per_paragraph: usize,
    pub max_word_impact: usize,
    pub min_text_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel_enabled: true,
            max_workers: super::scheduler::DEFAULT_MAX_WORKERS,
            task_timeout: super::scheduler::DEFAULT_TASK_TIMEOUT,
            join_timeout: super::scheduler::DEFAULT_JOIN_TIMEOUT,
            caching_enabled: true,
            cache_ttl: super::cache::DEFAULT_TTL,
            cache_capacity: super::cache::DEFAULT_CAPACITY,
            max_paragraphs: breakdown::DEFAULT_MAX_PARAGRAPHS,
            max_sentences_per_paragraph: breakdown::DEFAULT_MAX_SENTENCES_PER_PARAGRAPH,
            max_word_impact: breakdown::DEFAULT_MAX_WORD_IMPACT,
            min_text_chars: 10,
        }
    }
}

/// Orchestrator holding its collaborators by reference. Constructed once
/// at process start and shared (`Arc`) with request handlers; no global
/// mutable state.
pub struct AggregationEngine {
    analyzers: BTreeMap<DimensionId, Arc<dyn DimensionAnalyzer>>,
    weights: WeightRegistry,
    cache: ResultCache,
    scheduler: Scheduler,
    config: EngineConfig,
}

impl AggregationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_analyzers(config, default_analyzers())
    }

    /// Construction with injected analyzers, used by tests to substitute
    /// mocks for the heuristic implementations.
    pub fn with_analyzers(
        config: EngineConfig,
        analyzers: BTreeMap<DimensionId, Arc<dyn DimensionAnalyzer>>,
    ) -> Self {
        let scheduler = Scheduler::new(SchedulerConfig {
            max_workers: config.max_workers,
            task_timeout: config.task_timeout,
            join_timeout: config.join_timeout,
        });
        let cache = ResultCache::new(config.cache_ttl, config.cache_capacity);
        Self {
            analyzers,
            weights: WeightRegistry::new(),
            cache,
            scheduler,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace dimension weights from a string-keyed map. Rejected
    /// atomically when the merged table does not sum to 1.0 (±0.01) or a
    /// name is unknown.
    pub fn update_weights(
        &self,
        new_weights: &BTreeMap<String, f64>,
    ) -> Result<(), ConfigurationError> {
        self.weights.update_named(new_weights)
    }

    pub fn update_dimension_weights(
        &self,
        new_weights: &BTreeMap<DimensionId, f64>,
    ) -> Result<(), ConfigurationError> {
        self.weights.update(new_weights)
    }

    pub fn get_dimension_info(&self, dimension: DimensionId) -> DimensionInfo {
        dimension.info()
    }

    pub fn get_all_dimensions_info(&self) -> BTreeMap<DimensionId, DimensionInfo> {
        DimensionId::ALL.iter().map(|d| (*d, d.info())).collect()
    }

    /// Analyze text across the enabled dimensions and fuse the scores
    /// into one comprehensive result. Absent `enabled_dimensions` means
    /// all seven are enabled.
    pub async fn analyze_text_comprehensive(
        &self,
        text: &str,
        enabled_dimensions: Option<&BTreeMap<DimensionId, bool>>,
    ) -> ComprehensiveResult {
        let started = Instant::now();
        let request_id = Uuid::new_v4().to_string();

        if text.trim().chars().count() < self.config.min_text_chars {
            info!(request_id = %request_id, "input below minimum length, returning empty result");
            return self.empty_result(text, request_id, started);
        }

        let enabled: Vec<DimensionId> = DimensionId::ALL
            .into_iter()
            .filter(|d| {
                enabled_dimensions
                    .map(|m| m.get(d).copied().unwrap_or(true))
                    .unwrap_or(true)
            })
            .collect();

        let comprehensive_key = Self::comprehensive_key(text, &enabled);
        if self.config.caching_enabled {
            if let Some(CachedValue::Comprehensive(result)) = self.cache.get(&comprehensive_key) {
                info!(request_id = %request_id, "comprehensive result served from cache");
                return result;
            }
        }

        let mode = if self.config.parallel_enabled {
            ExecutionMode::Parallel
        } else {
            ExecutionMode::Sequential
        };
        let cache_ref = self.config.caching_enabled.then_some(&self.cache);
        let runs = self
            .scheduler
            .run(&self.analyzers, cache_ref, text, &enabled, mode)
            .await;

        // Anything unexpected past this point is an orchestration bug;
        // absorb it into the neutral error result at this boundary.
        let assembled = catch_unwind(AssertUnwindSafe(|| {
            self.assemble(text, &enabled, &runs, request_id.clone(), started)
        }));

        match assembled {
            Ok(result) => {
                if self.config.caching_enabled {
                    self.cache
                        .put(comprehensive_key, CachedValue::Comprehensive(result.clone()));
                }
                info!(
                    request_id = %request_id,
                    overall_score = result.overall_score,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "comprehensive analysis finished"
                );
                result
            }
            Err(panic) => {
                let message = panic_message(panic);
                error!(request_id = %request_id, error = %message, "aggregation failed");
                self.error_result(message, request_id, started)
            }
        }
    }

    fn comprehensive_key(text: &str, enabled: &[DimensionId]) -> String {
        let tags: Vec<&str> = enabled.iter().map(|d| d.as_str()).collect();
        ResultCache::key(text, &format!("comprehensive:{}", tags.join("+")))
    }

    fn assemble(
        &self,
        text: &str,
        enabled: &[DimensionId],
        runs: &BTreeMap<DimensionId, DimensionRun>,
        request_id: String,
        started: Instant,
    ) -> ComprehensiveResult {
        let mut per_dimension_scores: BTreeMap<DimensionId, Option<f64>> = BTreeMap::new();
        let mut per_dimension_detail: BTreeMap<DimensionId, Option<DimensionOutcome>> =
            BTreeMap::new();

        for dim in DimensionId::ALL {
            match runs.get(&dim) {
                Some(run) => {
                    let outcome = run.outcome();
                    let score = extractor::extract(&outcome);
                    per_dimension_scores.insert(dim, Some((score * 1000.0).round() / 1000.0));
                    per_dimension_detail.insert(dim, Some(outcome));
                }
                None => {
                    per_dimension_scores.insert(dim, None);
                    per_dimension_detail.insert(dim, None);
                }
            }
        }

        let weights_applied = self.weights.weights_for(enabled);
        let overall_score = if weights_applied.is_empty() {
            NEUTRAL_OVERALL
        } else {
            weights_applied
                .iter()
                .map(|(dim, weight)| {
                    per_dimension_scores
                        .get(dim)
                        .and_then(|s| *s)
                        .unwrap_or(NEUTRAL_OVERALL)
                        * weight
                })
                .sum::<f64>()
                .clamp(0.0, 1.0)
        };

        let paragraph_breakdown = breakdown::paragraph_breakdown(
            text,
            &self.analyzers,
            &weights_applied,
            self.config.max_paragraphs,
            self.config.max_sentences_per_paragraph,
        );
        let word_impact_ranking = breakdown::word_impact_ranking(text, self.config.max_word_impact);

        let stats = text_statistics(text);
        ComprehensiveResult {
            overall_score: (overall_score * 1000.0).round() / 1000.0,
            per_dimension_scores,
            per_dimension_detail,
            weights_applied,
            active_dimensions: enabled.to_vec(),
            paragraph_breakdown,
            word_impact_ranking,
            metadata: AnalysisMetadata {
                text_length: stats.character_count,
                word_count: stats.word_count,
                sentence_count: stats.sentence_count,
                paragraph_count: stats.paragraph_count,
                processing_time_seconds: round_secs(started.elapsed()),
                weights_used: self.weights.all(),
                parallel_enabled: self.config.parallel_enabled,
                caching_enabled: self.config.caching_enabled,
                request_id,
                error: None,
            },
        }
    }

    /// Terminal state for missing/too-short input. Not an error path: a
    /// defined result with zeroed scores and an explanatory metadata
    /// field.
    fn empty_result(&self, text: &str, request_id: String, started: Instant) -> ComprehensiveResult {
        let scores = DimensionId::ALL.iter().map(|d| (*d, Some(0.0))).collect();
        let detail = DimensionId::ALL.iter().map(|d| (*d, None)).collect();
        ComprehensiveResult {
            overall_score: 0.0,
            per_dimension_scores: scores,
            per_dimension_detail: detail,
            weights_applied: BTreeMap::new(),
            active_dimensions: Vec::new(),
            paragraph_breakdown: Vec::new(),
            word_impact_ranking: Vec::new(),
            metadata: AnalysisMetadata {
                text_length: text.chars().count(),
                word_count: 0,
                sentence_count: 0,
                paragraph_count: 0,
                processing_time_seconds: round_secs(started.elapsed()),
                weights_used: self.weights.all(),
                parallel_enabled: self.config.parallel_enabled,
                caching_enabled: self.config.caching_enabled,
                request_id,
                error: Some("Text too short or empty".to_string()),
            },
        }
    }

    /// Terminal state for orchestration failures: neutral scores plus the
    /// diagnostic message in metadata.
    fn error_result(
        &self,
        message: String,
        request_id: String,
        started: Instant,
    ) -> ComprehensiveResult {
        let scores = DimensionId::ALL
            .iter()
            .map(|d| (*d, Some(NEUTRAL_OVERALL)))
            .collect();
        let detail = DimensionId::ALL.iter().map(|d| (*d, None)).collect();
        ComprehensiveResult {
            overall_score: NEUTRAL_OVERALL,
            per_dimension_scores: scores,
            per_dimension_detail: detail,
            weights_applied: BTreeMap::new(),
            active_dimensions: Vec::new(),
            paragraph_breakdown: Vec::new(),
            word_impact_ranking: Vec::new(),
            metadata: AnalysisMetadata {
                text_length: 0,
                word_count: 0,
                sentence_count: 0,
                paragraph_count: 0,
                processing_time_seconds: round_secs(started.elapsed()),
                weights_used: self.weights.all(),
                parallel_enabled: self.config.parallel_enabled,
                caching_enabled: self.config.caching_enabled,
                request_id,
                error: Some(message),
            },
        }
    }
}

fn round_secs(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0).round() / 1000.0
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic during aggregation".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyzerError;
    use crate::services::analysis::test_support::MockAnalyzer;

    const TEXT: &str = "The committee reviewed the proposal in detail last Thursday. \
        Several members raised concerns about the projected costs. A revised draft will \
        circulate before the next meeting, assuming the chair approves the changes. \
        Nobody expected the vote to be unanimous.";

    fn engine_with_mocks(mocks: Vec<MockAnalyzer>) -> AggregationEngine {
        let analyzers = mocks
            .into_iter()
            .map(|m| (m.dimension(), Arc::new(m) as Arc<dyn DimensionAnalyzer>))
            .collect();
        AggregationEngine::with_analyzers(EngineConfig::default(), analyzers)
    }

    fn all_fixed(score: f64) -> Vec<MockAnalyzer> {
        DimensionId::ALL
            .iter()
            .map(|d| MockAnalyzer::fixed(*d, score))
            .collect()
    }

    #[tokio::test]
    async fn test_empty_input_terminal_state() {
        let engine = AggregationEngine::new(EngineConfig::default());
        for input in ["", "short"] {
            let result = engine.analyze_text_comprehensive(input, None).await;
            assert_eq!(result.overall_score, 0.0);
            assert!(result.active_dimensions.is_empty());
            assert!(result.paragraph_breakdown.is_empty());
            assert_eq!(
                result.metadata.error.as_deref(),
                Some("Text too short or empty")
            );
            assert!(result
                .per_dimension_scores
                .values()
                .all(|s| *s == Some(0.0)));
        }
    }

    #[tokio::test]
    async fn test_full_run_range_invariant_and_metadata() {
        let engine = AggregationEngine::new(EngineConfig::default());
        let result = engine.analyze_text_comprehensive(TEXT, None).await;

        assert!((0.0..=1.0).contains(&result.overall_score));
        assert_eq!(result.active_dimensions.len(), 7);
        for score in result.per_dimension_scores.values() {
            let s = score.expect("all dimensions enabled");
            assert!((0.0..=1.0).contains(&s));
        }
        let weight_sum: f64 = result.weights_applied.values().sum();
        assert!((weight_sum - 1.0).abs() < 1e-6);
        assert!(result.metadata.word_count > 0);
        assert!(result.metadata.sentence_count >= 4);
        assert!(result.metadata.error.is_none());
        assert!(!result.metadata.request_id.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_dimension_nullability() {
        let engine = AggregationEngine::new(EngineConfig::default());
        let mut enabled: BTreeMap<DimensionId, bool> = BTreeMap::new();
        enabled.insert(DimensionId::Readability, false);
        enabled.insert(DimensionId::Burstiness, false);

        let result = engine.analyze_text_comprehensive(TEXT, Some(&enabled)).await;

        assert_eq!(result.per_dimension_scores[&DimensionId::Readability], None);
        assert_eq!(result.per_dimension_scores[&DimensionId::Burstiness], None);
        assert!(!result
            .active_dimensions
            .contains(&DimensionId::Readability));
        assert_eq!(result.active_dimensions.len(), 5);
        assert!(!result.weights_applied.contains_key(&DimensionId::Readability));
        let weight_sum: f64 = result.weights_applied.values().sum();
        assert!((weight_sum - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_all_dimensions_disabled_defaults_to_neutral() {
        let engine = AggregationEngine::new(EngineConfig::default());
        let enabled: BTreeMap<DimensionId, bool> =
            DimensionId::ALL.iter().map(|d| (*d, false)).collect();

        let result = engine.analyze_text_comprehensive(TEXT, Some(&enabled)).await;
        assert_eq!(result.overall_score, 0.5);
        assert!(result.active_dimensions.is_empty());
        assert!(result.weights_applied.is_empty());
    }

    #[tokio::test]
    async fn test_single_faulty_analyzer_isolated() {
        let mut mocks = Vec::new();
        for dim in DimensionId::ALL {
            if dim == DimensionId::SemanticCoherence {
                mocks.push(MockAnalyzer::failing(
                    dim,
                    AnalyzerError::Failed {
                        dimension: "semantic_coherence",
                        message: "injected fault".to_string(),
                    },
                ));
            } else {
                mocks.push(MockAnalyzer::fixed(dim, 0.8));
            }
        }
        let engine = engine_with_mocks(mocks);
        let result = engine.analyze_text_comprehensive(TEXT, None).await;

        assert_eq!(
            result.per_dimension_scores[&DimensionId::SemanticCoherence],
            Some(0.5)
        );
        for dim in DimensionId::ALL {
            if dim != DimensionId::SemanticCoherence {
                assert_eq!(result.per_dimension_scores[&dim], Some(0.8));
            }
        }
        assert!((0.0..=1.0).contains(&result.overall_score));
        assert!(result.metadata.error.is_none());
    }

    #[tokio::test]
    async fn test_idempotence_under_cache() {
        let engine = AggregationEngine::new(EngineConfig::default());
        let first = engine.analyze_text_comprehensive(TEXT, None).await;
        let second = engine.analyze_text_comprehensive(TEXT, None).await;

        assert_eq!(first.overall_score, second.overall_score);
        assert_eq!(first.per_dimension_scores, second.per_dimension_scores);
    }

    #[tokio::test]
    async fn test_cache_disabled_produces_identical_scores() {
        let cached = AggregationEngine::new(EngineConfig::default());
        let uncached = AggregationEngine::new(EngineConfig {
            caching_enabled: false,
            ..EngineConfig::default()
        });

        let a = cached.analyze_text_comprehensive(TEXT, None).await;
        let b = uncached.analyze_text_comprehensive(TEXT, None).await;
        assert_eq!(a.overall_score, b.overall_score);
        assert_eq!(a.per_dimension_scores, b.per_dimension_scores);
    }

    #[tokio::test]
    async fn test_weighted_fusion_with_mocked_scores() {
        let mut mocks = Vec::new();
        for dim in DimensionId::ALL {
            let score = if dim == DimensionId::Perplexity { 1.0 } else { 0.0 };
            mocks.push(MockAnalyzer::fixed(dim, score));
        }
        let engine = engine_with_mocks(mocks);

        let mut weights = BTreeMap::new();
        weights.insert("perplexity".to_string(), 0.4);
        weights.insert("burstiness".to_string(), 0.1);
        weights.insert("semantic_coherence".to_string(), 0.1);
        weights.insert("ngram_repetition".to_string(), 0.1);
        weights.insert("lexical_richness".to_string(), 0.1);
        weights.insert("stylistic_markers".to_string(), 0.1);
        weights.insert("readability".to_string(), 0.1);
        engine.update_weights(&weights).unwrap();

        let result = engine.analyze_text_comprehensive(TEXT, None).await;
        assert!((result.overall_score - 0.4).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_orchestration_panic_becomes_error_result() {
        // The panicking analyzer is isolated by the scheduler for the
        // whole-text pass, but the breakdown assembler calls it again
        // inline; that panic must be absorbed at the engine boundary.
        let mut mocks = all_fixed(0.6);
        mocks.retain(|m| m.dimension() != DimensionId::Perplexity);
        mocks.push(MockAnalyzer::panicking(DimensionId::Perplexity));
        let engine = engine_with_mocks(mocks);

        let result = engine.analyze_text_comprehensive(TEXT, None).await;
        assert_eq!(result.overall_score, 0.5);
        assert!(result.metadata.error.is_some());
    }

    #[tokio::test]
    async fn test_sequential_mode_matches_parallel_scores() {
        let parallel = engine_with_mocks(all_fixed(0.7));
        let sequential_engine = {
            let analyzers = all_fixed(0.7)
                .into_iter()
                .map(|m| (m.dimension(), Arc::new(m) as Arc<dyn DimensionAnalyzer>))
                .collect();
            AggregationEngine::with_analyzers(
                EngineConfig {
                    parallel_enabled: false,
                    ..EngineConfig::default()
                },
                analyzers,
            )
        };

        let a = parallel.analyze_text_comprehensive(TEXT, None).await;
        let b = sequential_engine.analyze_text_comprehensive(TEXT, None).await;
        assert_eq!(a.overall_score, b.overall_score);
        assert!(a.metadata.parallel_enabled);
        assert!(!b.metadata.parallel_enabled);
    }

    #[test]
    fn test_dimension_info_surface() {
        let engine = AggregationEngine::new(EngineConfig::default());
        let info = engine.get_dimension_info(DimensionId::Burstiness);
        assert_eq!(info.name, "Burstiness");
        assert_eq!(engine.get_all_dimensions_info().len(), 7);
    }
}

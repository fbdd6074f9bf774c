// Analysis Module
// Scoring-fusion core organized into specialized submodules:
// - dimension: the seven canonical dimensions and their metadata
// - analyzers: heuristic detector implementations
// - extractor: outcome-to-score normalization (threshold aggregation)
// - weights: weight registry with renormalization and atomic updates
// - cache: bounded TTL result cache
// - scheduler: parallel/sequential dimension execution
// - breakdown: paragraph/sentence/word evidence assembly
// - engine: the top-level aggregation orchestrator
// - wordlist: suspicious-word and formulaic-phrase catalog

pub mod analyzers;
pub mod breakdown;
pub mod cache;
pub mod dimension;
pub mod engine;
pub mod extractor;
pub mod scheduler;
pub mod weights;
pub mod wordlist;

// Re-export commonly used types
pub use analyzers::{default_analyzers, estimate_perplexity, DimensionAnalyzer};
pub use cache::{CachedValue, ResultCache};
pub use dimension::{default_weights, AnalysisGranularity, DimensionId, DimensionInfo};
pub use engine::{AggregationEngine, EngineConfig};
pub use extractor::YELLOW_ALERT_THRESHOLD;
pub use scheduler::{DimensionRun, ExecutionMode, Scheduler, SchedulerConfig};
pub use weights::WeightRegistry;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::error::AnalyzerError;
    use crate::models::{DimensionId, DimensionOutcome};
    use crate::services::analysis::analyzers::DimensionAnalyzer;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    enum Behavior {
        Fixed(f64),
        Failing(AnalyzerError),
        Panicking,
        Sleeping(Duration),
    }

    /// Scriptable analyzer used to exercise scheduler and engine paths.
    pub(crate) struct MockAnalyzer {
        dimension: DimensionId,
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
    }

    impl MockAnalyzer {
        pub(crate) fn fixed(dimension: DimensionId, score: f64) -> Self {
            Self {
                dimension,
                behavior: Behavior::Fixed(score),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub(crate) fn failing(dimension: DimensionId, error: AnalyzerError) -> Self {
            Self {
                dimension,
                behavior: Behavior::Failing(error),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub(crate) fn panicking(dimension: DimensionId) -> Self {
            Self {
                dimension,
                behavior: Behavior::Panicking,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub(crate) fn sleeping(dimension: DimensionId, duration: Duration) -> Self {
            Self {
                dimension,
                behavior: Behavior::Sleeping(duration),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub(crate) fn call_count(&self) -> Arc<AtomicUsize> {
            self.calls.clone()
        }
    }

    impl DimensionAnalyzer for MockAnalyzer {
        fn dimension(&self) -> DimensionId {
            self.dimension
        }

        fn analyze(&self, _text: &str) -> Result<DimensionOutcome, AnalyzerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.behavior {
                Behavior::Fixed(score) => Ok(DimensionOutcome::scalar(*score)),
                Behavior::Failing(error) => Err(error.clone()),
                Behavior::Panicking => panic!("mock analyzer panic"),
                Behavior::Sleeping(duration) => {
                    std::thread::sleep(*duration);
                    Ok(DimensionOutcome::neutral())
                }
            }
        }
    }
}

// Dimension Scheduler
// Runs the enabled analyzers over the input text, in parallel on a bounded
// worker pool or sequentially as a fallback. Failures (errors, panics,
// timeouts) are isolated per dimension: the failing dimension is reported
// as an explicit Failed marker and every other dimension completes.

use crate::models::{DimensionId, DimensionOutcome};
use crate::services::analysis::analyzers::DimensionAnalyzer;
use crate::services::analysis::cache::{CachedValue, ResultCache};
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

pub const DEFAULT_MAX_WORKERS: usize = 4;
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ExecutionMode {
    Parallel,
    Sequential,
}

/// Per-dimension result: a completed outcome or an explicit failure
/// marker. Downstream aggregation substitutes the neutral score for
/// failures; nothing here is raised to the caller.
#[derive(Debug, Clone)]
pub enum DimensionRun {
    Completed(DimensionOutcome),
    Failed { reason: String },
}

impl DimensionRun {
    pub fn outcome(&self) -> DimensionOutcome {
        match self {
            DimensionRun::Completed(outcome) => outcome.clone(),
            DimensionRun::Failed { .. } => DimensionOutcome::neutral(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub max_workers: usize,
    pub task_timeout: Duration,
    pub join_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            task_timeout: DEFAULT_TASK_TIMEOUT,
            join_timeout: DEFAULT_JOIN_TIMEOUT,
        }
    }
}

pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// Run the enabled analyzers. The returned map is keyed by dimension
    /// id, so downstream aggregation is independent of completion order.
    pub async fn run(
        &self,
        analyzers: &BTreeMap<DimensionId, Arc<dyn DimensionAnalyzer>>,
        cache: Option<&ResultCache>,
        text: &str,
        enabled: &[DimensionId],
        mode: ExecutionMode,
    ) -> BTreeMap<DimensionId, DimensionRun> {
        match mode {
            ExecutionMode::Parallel => self.run_parallel(analyzers, cache, text, enabled).await,
            ExecutionMode::Sequential => self.run_sequential(analyzers, cache, text, enabled),
        }
    }

    async fn run_parallel(
        &self,
        analyzers: &BTreeMap<DimensionId, Arc<dyn DimensionAnalyzer>>,
        cache: Option<&ResultCache>,
        text: &str,
        enabled: &[DimensionId],
    ) -> BTreeMap<DimensionId, DimensionRun> {
        let mut runs = BTreeMap::new();
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers.max(1)));
        let mut handles = Vec::new();

        for dim in enabled {
            if let Some(outcome) = lookup_cached(cache, text, *dim) {
                runs.insert(*dim, DimensionRun::Completed(outcome));
                continue;
            }

            let Some(analyzer) = analyzers.get(dim).cloned() else {
                runs.insert(
                    *dim,
                    DimensionRun::Failed {
                        reason: "no analyzer registered".to_string(),
                    },
                );
                continue;
            };

            let owned_text = text.to_string();
            let permits = semaphore.clone();
            let task_timeout = self.config.task_timeout;
            let handle = tokio::spawn(async move {
                let _permit = permits.acquire_owned().await.expect("semaphore closed");
                let work = tokio::task::spawn_blocking(move || analyzer.analyze(&owned_text));
                match tokio::time::timeout(task_timeout, work).await {
                    Err(_) => Err(format!("timed out after {:?}", task_timeout)),
                    Ok(Err(join_err)) if join_err.is_panic() => {
                        Err("analyzer panicked".to_string())
                    }
                    Ok(Err(join_err)) => Err(format!("analyzer task failed: {}", join_err)),
                    Ok(Ok(Err(e))) => Err(e.to_string()),
                    Ok(Ok(Ok(outcome))) => Ok(outcome),
                }
            });
            handles.push((*dim, handle));
        }

        let deadline = Instant::now() + self.config.join_timeout;
        for (dim, handle) in handles {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let run = match tokio::time::timeout(remaining, handle).await {
                Err(_) => {
                    // The blocking work cannot be force-killed; abandon it.
                    error!(dimension = %dim, "dimension abandoned at join deadline");
                    DimensionRun::Failed {
                        reason: format!("abandoned after join timeout {:?}", self.config.join_timeout),
                    }
                }
                Ok(Err(join_err)) => {
                    error!(dimension = %dim, error = %join_err, "dimension task died");
                    DimensionRun::Failed {
                        reason: format!("task died: {}", join_err),
                    }
                }
                Ok(Ok(Err(reason))) => {
                    error!(dimension = %dim, reason = %reason, "dimension analysis failed");
                    DimensionRun::Failed { reason }
                }
                Ok(Ok(Ok(outcome))) => {
                    store_cached(cache, text, dim, &outcome);
                    DimensionRun::Completed(outcome)
                }
            };
            runs.insert(dim, run);
        }

        info!(
            completed = runs
                .values()
                .filter(|r| matches!(r, DimensionRun::Completed(_)))
                .count(),
            total = runs.len(),
            "parallel dimension pass finished"
        );
        runs
    }

    fn run_sequential(
        &self,
        analyzers: &BTreeMap<DimensionId, Arc<dyn DimensionAnalyzer>>,
        cache: Option<&ResultCache>,
        text: &str,
        enabled: &[DimensionId],
    ) -> BTreeMap<DimensionId, DimensionRun> {
        let mut runs = BTreeMap::new();

        // Fixed canonical order regardless of the caller's enabled order
        for dim in DimensionId::ALL {
            if !enabled.contains(&dim) {
                continue;
            }

            if let Some(outcome) = lookup_cached(cache, text, dim) {
                runs.insert(dim, DimensionRun::Completed(outcome));
                continue;
            }

            let Some(analyzer) = analyzers.get(&dim) else {
                runs.insert(
                    dim,
                    DimensionRun::Failed {
                        reason: "no analyzer registered".to_string(),
                    },
                );
                continue;
            };

            let run = match catch_unwind(AssertUnwindSafe(|| analyzer.analyze(text))) {
                Ok(Ok(outcome)) => {
                    store_cached(cache, text, dim, &outcome);
                    DimensionRun::Completed(outcome)
                }
                Ok(Err(e)) => {
                    error!(dimension = %dim, error = %e, "dimension analysis failed");
                    DimensionRun::Failed {
                        reason: e.to_string(),
                    }
                }
                Err(_) => {
                    error!(dimension = %dim, "dimension analysis panicked");
                    DimensionRun::Failed {
                        reason: "analyzer panicked".to_string(),
                    }
                }
            };
            runs.insert(dim, run);
        }

        runs
    }
}

fn lookup_cached(cache: Option<&ResultCache>, text: &str, dim: DimensionId) -> Option<DimensionOutcome> {
    let cache = cache?;
    match cache.get(&ResultCache::key(text, dim.as_str())) {
        Some(CachedValue::Dimension(outcome)) => {
            debug!(dimension = %dim, "dimension served from cache");
            Some(outcome)
        }
        _ => None,
    }
}

fn store_cached(cache: Option<&ResultCache>, text: &str, dim: DimensionId, outcome: &DimensionOutcome) {
    if let Some(cache) = cache {
        cache.put(
            ResultCache::key(text, dim.as_str()),
            CachedValue::Dimension(outcome.clone()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyzerError;
    use crate::services::analysis::test_support::MockAnalyzer;

    const TEXT: &str = "Some reasonably long input text for the scheduler tests.";

    fn analyzer_map(
        analyzers: Vec<MockAnalyzer>,
    ) -> BTreeMap<DimensionId, Arc<dyn DimensionAnalyzer>> {
        analyzers
            .into_iter()
            .map(|a| (a.dimension(), Arc::new(a) as Arc<dyn DimensionAnalyzer>))
            .collect()
    }

    #[tokio::test]
    async fn test_failure_isolation_parallel() {
        let analyzers = analyzer_map(vec![
            MockAnalyzer::fixed(DimensionId::Perplexity, 0.8),
            MockAnalyzer::failing(
                DimensionId::Burstiness,
                AnalyzerError::Failed {
                    dimension: "burstiness",
                    message: "boom".to_string(),
                },
            ),
            MockAnalyzer::panicking(DimensionId::Readability),
        ]);
        let enabled = vec![
            DimensionId::Perplexity,
            DimensionId::Burstiness,
            DimensionId::Readability,
        ];

        let scheduler = Scheduler::new(SchedulerConfig::default());
        let runs = scheduler
            .run(&analyzers, None, TEXT, &enabled, ExecutionMode::Parallel)
            .await;

        assert_eq!(runs.len(), 3);
        assert!(matches!(
            runs[&DimensionId::Perplexity],
            DimensionRun::Completed(_)
        ));
        assert!(matches!(
            runs[&DimensionId::Burstiness],
            DimensionRun::Failed { .. }
        ));
        assert!(matches!(
            runs[&DimensionId::Readability],
            DimensionRun::Failed { .. }
        ));
        assert_eq!(runs[&DimensionId::Burstiness].outcome().overall_score, 0.5);
    }

    #[tokio::test]
    async fn test_slow_dimension_times_out_without_stalling_others() {
        let analyzers = analyzer_map(vec![
            MockAnalyzer::fixed(DimensionId::Perplexity, 0.4),
            MockAnalyzer::sleeping(DimensionId::Burstiness, Duration::from_secs(1)),
        ]);
        let enabled = vec![DimensionId::Perplexity, DimensionId::Burstiness];

        let scheduler = Scheduler::new(SchedulerConfig {
            max_workers: 4,
            task_timeout: Duration::from_millis(100),
            join_timeout: Duration::from_secs(2),
        });

        let started = Instant::now();
        let runs = scheduler
            .run(&analyzers, None, TEXT, &enabled, ExecutionMode::Parallel)
            .await;
        let elapsed = started.elapsed();

        assert!(matches!(
            runs[&DimensionId::Burstiness],
            DimensionRun::Failed { .. }
        ));
        assert!(matches!(
            runs[&DimensionId::Perplexity],
            DimensionRun::Completed(_)
        ));
        assert!(
            elapsed < Duration::from_secs(3),
            "wall clock {:?} exceeded join deadline",
            elapsed
        );
    }

    #[tokio::test]
    async fn test_sequential_mode_matches_enabled_set() {
        let analyzers = analyzer_map(vec![
            MockAnalyzer::fixed(DimensionId::Perplexity, 0.6),
            MockAnalyzer::fixed(DimensionId::Readability, 0.2),
        ]);
        let enabled = vec![DimensionId::Readability, DimensionId::Perplexity];

        let scheduler = Scheduler::new(SchedulerConfig::default());
        let runs = scheduler
            .run(&analyzers, None, TEXT, &enabled, ExecutionMode::Sequential)
            .await;

        assert_eq!(runs.len(), 2);
        assert!(runs.contains_key(&DimensionId::Perplexity));
        assert!(runs.contains_key(&DimensionId::Readability));
    }

    #[tokio::test]
    async fn test_cached_dimension_not_recomputed() {
        let counting = MockAnalyzer::fixed(DimensionId::Perplexity, 0.7);
        let calls = counting.call_count();
        let analyzers = analyzer_map(vec![counting]);
        let enabled = vec![DimensionId::Perplexity];
        let cache = ResultCache::default();

        let scheduler = Scheduler::new(SchedulerConfig::default());
        for _ in 0..3 {
            let runs = scheduler
                .run(
                    &analyzers,
                    Some(&cache),
                    TEXT,
                    &enabled,
                    ExecutionMode::Parallel,
                )
                .await;
            assert!(matches!(
                runs[&DimensionId::Perplexity],
                DimensionRun::Completed(_)
            ));
        }

        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}

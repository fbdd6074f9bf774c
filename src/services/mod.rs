// Origo Core Services

pub mod analysis;
pub mod config_store;
pub mod tokenizer;

pub use config_store::{AppConfig, ConfigStore, DetectionConfig};
pub use tokenizer::{
    split_into_paragraphs, split_into_sentences, text_statistics, tokenize_words,
};

// Re-export the analysis surface
pub use analysis::{
    default_analyzers,
    default_weights,
    AggregationEngine,
    AnalysisGranularity,
    DimensionAnalyzer,
    DimensionId,
    DimensionInfo,
    EngineConfig,
    ExecutionMode,
    ResultCache,
    Scheduler,
    SchedulerConfig,
    WeightRegistry,
};

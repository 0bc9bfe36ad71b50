mod analysis;
mod config;
mod engine;
mod pipeline;
mod quietness;
mod scripted;
mod writer;

pub use analysis::{
    AnalysisError, Analyzer, EvalSource, EvaluationSample, MultiPvResult, SearchLimit,
};
pub use config::{PipelineConfig, ScoringMode};
pub use engine::{EngineSettings, UciAnalyzer};
pub use pipeline::{Pipeline, PipelineError, Rejections, RunSummary, StopReason};
pub use quietness::{QuietnessClassifier, QuietnessConfig, Rejection};
pub use scripted::ScriptedAnalyzer;
pub use writer::{DatasetRecord, DatasetWriter, Label, OutputFormat};

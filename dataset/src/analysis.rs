use std::time::Duration;

use thiserror::Error;
use uci::GoParams;
use utils::{Position, Score};

/// Exactly one search dimension bounds every analysis call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLimit {
    Depth(u8),
    MoveTime(Duration),
    Nodes(u64),
}

impl SearchLimit {
    pub fn go_params(self) -> GoParams {
        match self {
            SearchLimit::Depth(depth) => GoParams {
                depth: Some(depth),
                ..Default::default()
            },
            SearchLimit::MoveTime(time) => GoParams {
                move_time: Some(time.as_millis() as u64),
                ..Default::default()
            },
            SearchLimit::Nodes(nodes) => GoParams {
                nodes: Some(nodes),
                ..Default::default()
            },
        }
    }
}

/// Scores for the top lines of one position, best first.
///
/// Scores are White-relative. `scores` may be shorter than the number of
/// lines requested; it is never padded.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiPvResult {
    pub position: Position,
    pub scores: Vec<Score>,
    pub best_move: Option<String>,
}

impl MultiPvResult {
    pub fn is_complete(&self, variation_count: usize) -> bool {
        self.scores.len() == variation_count
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalSource {
    Engine,
    Corpus,
}

/// A single White-relative evaluation of a position.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationSample {
    pub position: Position,
    pub score: Score,
    pub source: EvalSource,
}

impl EvaluationSample {
    pub fn centipawns(&self, mate_score: i32) -> i32 {
        self.score.to_centipawns(mate_score)
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("engine timed out on {fen}")]
    Timeout { fen: String },

    #[error("engine failed on {fen}: {reason}")]
    Failed { fen: String, reason: String },

    #[error("engine unavailable: {0}")]
    Unavailable(String),
}

impl AnalysisError {
    /// Whether the run cannot continue. Everything else only costs the
    /// position being analyzed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AnalysisError::Unavailable(_))
    }
}

/// Something that can score positions, usually a UCI engine.
pub trait Analyzer {
    fn analyze(
        &mut self,
        position: &Position,
        limit: SearchLimit,
        variation_count: usize,
    ) -> Result<MultiPvResult, AnalysisError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_params_have_one_limit() {
        assert_eq!(
            SearchLimit::Depth(8).go_params(),
            GoParams {
                depth: Some(8),
                move_time: None,
                nodes: None
            }
        );
        assert_eq!(
            SearchLimit::MoveTime(Duration::from_secs(1)).go_params().move_time,
            Some(1000)
        );
        assert_eq!(SearchLimit::Nodes(1).go_params().nodes, Some(1));
    }

    #[test]
    fn test_only_unavailable_is_fatal() {
        assert!(AnalysisError::Unavailable("gone".to_string()).is_fatal());
        assert!(!AnalysisError::Timeout {
            fen: "x".to_string()
        }
        .is_fatal());
        assert!(!AnalysisError::Failed {
            fen: "x".to_string(),
            reason: "crash".to_string()
        }
        .is_fatal());
    }
}

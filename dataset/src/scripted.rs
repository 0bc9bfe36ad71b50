use ahash::AHashMap;
use utils::{Position, Score};

use crate::analysis::{AnalysisError, Analyzer, MultiPvResult, SearchLimit};

enum Script {
    Lines {
        scores: Vec<Score>,
        best_move: Option<String>,
    },
    Fail,
    Fatal,
}

/// Deterministic stand-in for an engine: answers from a table of canned
/// results keyed by FEN.
///
/// Unknown positions get the fallback lines if there are any and fail like
/// an engine error would otherwise. Scripted lines are
/// cut to the requested variation count, so a short script behaves like an
/// engine that found fewer lines than asked for.
#[derive(Default)]
pub struct ScriptedAnalyzer {
    scripts: AHashMap<String, Script>,
    fallback: Option<Vec<Score>>,
    calls: usize,
}

impl ScriptedAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// White-relative centipawn lines for `fen`, best first.
    pub fn with_scores(self, fen: &str, scores: &[i32]) -> Self {
        self.with_lines(fen, scores.iter().map(|&cp| Score::Centipawns(cp)).collect(), None)
    }

    pub fn with_lines(mut self, fen: &str, scores: Vec<Score>, best_move: Option<&str>) -> Self {
        self.scripts.insert(
            fen.to_string(),
            Script::Lines {
                scores,
                best_move: best_move.map(str::to_string),
            },
        );
        self
    }

    /// Lines for every position without a script of its own.
    pub fn with_fallback(mut self, scores: &[i32]) -> Self {
        self.fallback = Some(scores.iter().map(|&cp| Score::Centipawns(cp)).collect());
        self
    }

    pub fn with_failure(mut self, fen: &str) -> Self {
        self.scripts.insert(fen.to_string(), Script::Fail);
        self
    }

    /// The engine goes away for good when asked about `fen`.
    pub fn with_fatal(mut self, fen: &str) -> Self {
        self.scripts.insert(fen.to_string(), Script::Fatal);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl Analyzer for ScriptedAnalyzer {
    fn analyze(
        &mut self,
        position: &Position,
        _limit: SearchLimit,
        variation_count: usize,
    ) -> Result<MultiPvResult, AnalysisError> {
        self.calls += 1;

        let (scores, best_move) = match (self.scripts.get(position.fen()), &self.fallback) {
            (Some(Script::Lines { scores, best_move }), _) => (scores, best_move.clone()),
            (Some(Script::Fatal), _) => {
                return Err(AnalysisError::Unavailable("scripted shutdown".to_string()))
            }
            (None, Some(fallback)) => (fallback, None),
            (Some(Script::Fail), _) | (None, None) => {
                return Err(AnalysisError::Failed {
                    fen: position.fen().to_string(),
                    reason: "no scripted result".to_string(),
                })
            }
        };

        Ok(MultiPvResult {
            position: position.clone(),
            scores: scores.iter().take(variation_count).copied().collect(),
            best_move,
        })
    }
}

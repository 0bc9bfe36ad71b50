use crate::analysis::SearchLimit;
use crate::quietness::QuietnessConfig;

/// Most lines a UCI engine is asked for. Stockfish caps `MultiPV` here too.
pub const MAX_VARIATIONS: usize = 500;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScoringMode {
    /// Use the evaluation shipped with the corpus, no engine.
    Prior,
    /// One engine line per position.
    Single,
    /// Several engine lines per position, admitted only when they agree.
    MultiPv,
}

impl ScoringMode {
    pub fn uses_engine(self) -> bool {
        !matches!(self, ScoringMode::Prior)
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub scoring: ScoringMode,
    /// Required whenever the scoring mode uses the engine.
    pub limit: Option<SearchLimit>,
    pub quietness: QuietnessConfig,
}

impl PipelineConfig {
    pub fn new(scoring: ScoringMode) -> Self {
        Self {
            scoring,
            limit: None,
            quietness: QuietnessConfig::default(),
        }
    }

    /// Lines requested from the engine per position.
    pub fn variation_count(&self) -> usize {
        match self.scoring {
            ScoringMode::MultiPv => self.quietness.variation_count,
            ScoringMode::Single | ScoringMode::Prior => 1,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.scoring.uses_engine() && self.limit.is_none() {
            return Err(format!(
                "{:?} scoring needs a search limit (depth, movetime or nodes)",
                self.scoring
            ));
        }
        if self.quietness.variation_count == 0 {
            return Err("variation count must be at least 1".to_string());
        }
        if self.quietness.variation_count > MAX_VARIATIONS {
            return Err(format!(
                "variation count {} is above {}",
                self.quietness.variation_count, MAX_VARIATIONS
            ));
        }
        if self.quietness.threshold < 0 {
            return Err("quietness threshold cannot be negative".to_string());
        }
        if self.quietness.mate_exclusion_bound > self.quietness.mate_score {
            return Err(format!(
                "mate exclusion bound {} is above the mate score {}",
                self.quietness.mate_exclusion_bound, self.quietness.mate_score
            ));
        }
        Ok(())
    }
}

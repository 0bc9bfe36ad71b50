use thiserror::Error;
use utils::{Position, Score, MATE_SCORE};

use crate::analysis::{EvaluationSample, MultiPvResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuietnessConfig {
    /// Lines requested per position in multi-PV scoring.
    pub variation_count: usize,
    /// Largest allowed gap, in centipawns, between the best and worst line.
    pub threshold: i32,
    /// Positions need strictly more pieces than this.
    pub material_floor: u32,
    /// Evaluations at or beyond this magnitude are treated as decided.
    pub mate_exclusion_bound: i32,
    /// Magnitude mate scores collapse to before any comparison.
    pub mate_score: i32,
}

impl Default for QuietnessConfig {
    fn default() -> Self {
        Self {
            variation_count: 4,
            threshold: 50,
            material_floor: 6,
            mate_exclusion_bound: 5000,
            mate_score: MATE_SCORE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("side to move is in check")]
    InCheck,

    #[error("{pieces} pieces left")]
    TooFewPieces { pieces: u32 },

    #[error("{got} of {want} lines")]
    InsufficientLines { got: usize, want: usize },

    #[error("lines spread over {spread} cp")]
    SpreadTooWide { spread: i64 },

    #[error("score {score} is decided")]
    ExtremeScore { score: i32 },
}

/// Decides which scored positions are quiet enough to be labelled with a
/// single evaluation.
pub struct QuietnessClassifier {
    config: QuietnessConfig,
}

impl QuietnessClassifier {
    pub fn new(config: QuietnessConfig) -> Self {
        Self { config }
    }

    /// Checks that need no evaluation. Run before asking the engine.
    pub fn screen(&self, position: &Position) -> Result<(), Rejection> {
        if position.in_check() {
            return Err(Rejection::InCheck);
        }

        let pieces = position.piece_count();
        if pieces <= self.config.material_floor {
            return Err(Rejection::TooFewPieces { pieces });
        }

        Ok(())
    }

    /// Admit a position whose top lines all lead to about the same
    /// evaluation. Returns the best line's score as the label.
    pub fn admit_multipv(&self, result: &MultiPvResult) -> Result<i32, Rejection> {
        self.screen(&result.position)?;

        let want = self.config.variation_count;
        if !result.is_complete(want) {
            return Err(Rejection::InsufficientLines {
                got: result.scores.len(),
                want,
            });
        }

        let scores: Vec<i32> = result
            .scores
            .iter()
            .map(|score| score.to_centipawns(self.config.mate_score))
            .collect();

        let (Some(&min), Some(&max)) = (scores.iter().min(), scores.iter().max()) else {
            return Err(Rejection::InsufficientLines { got: 0, want });
        };

        let spread = i64::from(max) - i64::from(min);
        if spread > i64::from(self.config.threshold) {
            return Err(Rejection::SpreadTooWide { spread });
        }

        self.bounded(scores[0])
    }

    /// Admit a position known by a single evaluation.
    ///
    /// With one line there is nothing to compare, so this only keeps out
    /// forced mates, decided positions and trivial endgames. It is a weaker
    /// test than [`admit_multipv`](Self::admit_multipv) and a position it
    /// admits is not necessarily quiet.
    pub fn admit_single(&self, sample: &EvaluationSample) -> Result<i32, Rejection> {
        self.screen(&sample.position)?;

        if let Score::Mate(_) = sample.score {
            return Err(Rejection::ExtremeScore {
                score: sample.centipawns(self.config.mate_score),
            });
        }

        self.bounded(sample.centipawns(self.config.mate_score))
    }

    fn bounded(&self, score: i32) -> Result<i32, Rejection> {
        if score.unsigned_abs() >= self.config.mate_exclusion_bound.unsigned_abs() {
            return Err(Rejection::ExtremeScore { score });
        }
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::EvalSource;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn classifier(threshold: i32) -> QuietnessClassifier {
        QuietnessClassifier::new(QuietnessConfig {
            threshold,
            ..QuietnessConfig::default()
        })
    }

    fn multipv(fen: &str, scores: &[i32]) -> MultiPvResult {
        MultiPvResult {
            position: Position::from_fen(fen).unwrap(),
            scores: scores.iter().map(|&cp| Score::Centipawns(cp)).collect(),
            best_move: None,
        }
    }

    fn single(fen: &str, score: Score) -> EvaluationSample {
        EvaluationSample {
            position: Position::from_fen(fen).unwrap(),
            score,
            source: EvalSource::Engine,
        }
    }

    #[test]
    fn test_wide_spread_is_rejected() {
        let result = multipv(START, &[10, 15, 12, 60]);
        assert_eq!(
            classifier(20).admit_multipv(&result),
            Err(Rejection::SpreadTooWide { spread: 50 })
        );
    }

    #[test]
    fn test_narrow_spread_is_admitted() {
        let result = multipv(START, &[10, 15, 12, 18]);
        assert_eq!(classifier(20).admit_multipv(&result), Ok(10));
    }

    #[test]
    fn test_spread_equal_to_threshold_is_admitted() {
        let result = multipv(START, &[0, -20, 0, 0]);
        assert_eq!(classifier(20).admit_multipv(&result), Ok(0));
    }

    #[test]
    fn test_missing_lines_are_rejected() {
        let result = multipv(START, &[10, 12, 11]);
        assert_eq!(
            classifier(50).admit_multipv(&result),
            Err(Rejection::InsufficientLines { got: 3, want: 4 })
        );
    }

    #[test]
    fn test_agreeing_mates_are_not_quiet() {
        let mut result = multipv(START, &[]);
        result.scores = vec![Score::Mate(3); 4];
        assert!(matches!(
            classifier(50).admit_multipv(&result),
            Err(Rejection::ExtremeScore { .. })
        ));
    }

    #[test]
    fn test_check_is_rejected() {
        // Black king on e8, White rook on e2, open e-file.
        let fen = "rnbqkbnr/pppp1ppp/8/8/8/8/PPPPRPPP/RNBQKBN1 b Qkq - 0 1";
        let result = multipv(fen, &[0, 0, 0, 0]);
        assert_eq!(classifier(50).admit_multipv(&result), Err(Rejection::InCheck));
    }

    #[test]
    fn test_material_floor_is_strict() {
        let classifier = classifier(50);
        // Seven pieces pass a floor of six, six do not.
        let seven = Position::from_fen("4k3/pp6/8/8/8/8/PP6/4K1N1 w - - 0 1").unwrap();
        let six = Position::from_fen("4k3/pp6/8/8/8/8/PP6/4K3 w - - 0 1").unwrap();

        assert_eq!(classifier.screen(&seven), Ok(()));
        assert_eq!(
            classifier.screen(&six),
            Err(Rejection::TooFewPieces { pieces: 6 })
        );
    }

    #[test]
    fn test_single_line() {
        let classifier = classifier(50);

        assert_eq!(
            classifier.admit_single(&single(START, Score::Centipawns(12))),
            Ok(12)
        );
        assert_eq!(
            classifier.admit_single(&single(START, Score::Centipawns(-7000))),
            Err(Rejection::ExtremeScore { score: -7000 })
        );
        assert_eq!(
            classifier.admit_single(&single(START, Score::Mate(-2))),
            Err(Rejection::ExtremeScore { score: -99_998 })
        );
    }

    #[test]
    fn test_extreme_centipawns_are_decided() {
        let classifier = classifier(50);

        assert_eq!(
            classifier.admit_single(&single(START, Score::Centipawns(i32::MIN))),
            Err(Rejection::ExtremeScore { score: i32::MIN })
        );
        assert_eq!(
            classifier.admit_single(&single(START, Score::Centipawns(i32::MAX))),
            Err(Rejection::ExtremeScore { score: i32::MAX })
        );
    }

    #[test]
    fn test_spread_across_full_range() {
        let result = multipv(START, &[i32::MAX, 0, 0, i32::MIN]);
        assert_eq!(
            classifier(50).admit_multipv(&result),
            Err(Rejection::SpreadTooWide {
                spread: i64::from(i32::MAX) - i64::from(i32::MIN)
            })
        );
    }
}

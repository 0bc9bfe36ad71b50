use cozy_chess::Color;

/// Magnitude a mate-in-N line is mapped to before numeric comparison.
/// Larger than any centipawn value an engine reports for a non-mate line.
pub const MATE_SCORE: i32 = 100_000;

/// An engine or corpus evaluation.
///
/// Mate distances are kept out of band and only collapse into a number
/// through [`Score::to_centipawns`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    /// Positive for mate-in-n, zero or negative when the side is getting mated.
    Mate(i32),
}

impl Score {
    #[inline]
    pub fn is_mate(self) -> bool {
        matches!(self, Score::Mate(_))
    }

    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            Score::Centipawns(cp) => Score::Centipawns(cp.saturating_neg()),
            Score::Mate(moves) => Score::Mate(moves.saturating_neg()),
        }
    }

    /// Collapse into centipawns, mapping mates to `±(mate_score - distance)`
    /// so shorter mates stay more extreme than longer ones.
    #[inline]
    pub fn to_centipawns(self, mate_score: i32) -> i32 {
        match self {
            Score::Centipawns(cp) => cp,
            Score::Mate(moves) if moves > 0 => mate_score.saturating_sub(moves),
            Score::Mate(moves) => mate_score.saturating_neg().saturating_sub(moves),
        }
    }
}

/// Flip eval perspective between White's view and side-to-move's view.
#[inline(always)]
pub fn flip_eval_perspective(side_to_move: Color, score: Score) -> Score {
    if side_to_move == Color::White {
        score
    } else {
        score.flipped()
    }
}

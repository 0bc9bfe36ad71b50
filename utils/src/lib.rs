mod eval;
mod position;

pub use eval::{flip_eval_perspective, Score, MATE_SCORE};
pub use position::{complete_fen, FenError, Position};

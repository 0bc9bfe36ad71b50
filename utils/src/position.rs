use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use cozy_chess::{Board, Color};
use thiserror::Error;

const FEN_FIELDS: usize = 6;
const EPD_FIELDS: usize = 4;
const DEFAULT_HALFMOVE: u8 = 0;
const DEFAULT_FULLMOVE: u16 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("empty FEN")]
    Empty,

    #[error("FEN '{0}' has fewer than four fields")]
    MissingFields(String),

    #[error("invalid FEN '{fen}': {reason}")]
    Invalid { fen: String, reason: String },
}

/// A legal board state identified by its canonical FEN.
///
/// Two positions are equal when their canonical FEN strings are equal, so
/// the same board reached through different sources deduplicates.
#[derive(Clone, Debug)]
pub struct Position {
    fen: String,
    board: Board,
}

impl Position {
    pub fn from_fen(raw: &str) -> Result<Self, FenError> {
        let fen = complete_fen(raw)?;
        let board = Board::from_fen(&fen, false).map_err(|e| FenError::Invalid {
            fen: fen.clone(),
            reason: format!("{:?}", e),
        })?;

        Ok(Self::from_board(board))
    }

    pub fn from_board(board: Board) -> Self {
        Self {
            fen: board.to_string(),
            board,
        }
    }

    #[inline]
    pub fn fen(&self) -> &str {
        &self.fen
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    /// Number of pieces on the board, kings and pawns included.
    #[inline]
    pub fn piece_count(&self) -> u32 {
        self.board.occupied().len()
    }

    #[inline]
    pub fn in_check(&self) -> bool {
        !self.board.checkers().is_empty()
    }

    pub fn into_fen(self) -> String {
        self.fen
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.fen == other.fen
    }
}

impl Eq for Position {}

impl Hash for Position {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fen.hash(state);
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fen)
    }
}

impl FromStr for Position {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}

/// Turn a FEN or EPD string into a full six-field FEN.
///
/// EPD lines and evaluation dumps carry only board, side, castling and en
/// passant; anything past those four fields that is not a pair of move
/// counters (EPD opcodes such as `c9 "1-0";`) is dropped.
pub fn complete_fen(raw: &str) -> Result<String, FenError> {
    let parts: Vec<&str> = raw.split_whitespace().collect();

    if parts.is_empty() {
        return Err(FenError::Empty);
    }
    if parts.len() < EPD_FIELDS {
        return Err(FenError::MissingFields(raw.trim().to_string()));
    }

    let has_counters = parts.len() >= FEN_FIELDS
        && parts[4].parse::<u32>().is_ok()
        && parts[5].parse::<u32>().is_ok();

    if has_counters {
        Ok(parts[..FEN_FIELDS].join(" "))
    } else {
        Ok(format!(
            "{} {} {} {} {} {}",
            parts[0], parts[1], parts[2], parts[3], DEFAULT_HALFMOVE, DEFAULT_FULLMOVE
        ))
    }
}

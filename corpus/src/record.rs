use cozy_chess::Color;
use utils::Score;

/// One unit produced by a corpus reader.
#[derive(Debug, Clone, PartialEq)]
pub enum CorpusRecord {
    Position(RawPosition),
    Game(GameRecord),
}

/// A position string as found in the source, not yet validated.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPosition {
    /// 1-based line in the source.
    pub line: usize,
    pub fen: String,
    /// White-relative evaluation shipped with the record, if any.
    pub prior: Option<Score>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GameResult {
    WhiteWin,
    BlackWin,
    Draw,
    #[default]
    Unknown,
}

impl GameResult {
    pub fn from_tag(value: &[u8]) -> Self {
        match value {
            b"1-0" => GameResult::WhiteWin,
            b"0-1" => GameResult::BlackWin,
            b"1/2-1/2" => GameResult::Draw,
            _ => GameResult::Unknown,
        }
    }

    pub fn winner(self) -> Option<Color> {
        match self {
            GameResult::WhiteWin => Some(Color::White),
            GameResult::BlackWin => Some(Color::Black),
            GameResult::Draw | GameResult::Unknown => None,
        }
    }
}

/// A replayed game.
///
/// `positions[k]` is the FEN after `k` plies, so there is always one more
/// position than there are moves, and `moves[k]` (UCI notation) is the move
/// played from `positions[k]`.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    /// 1-based index of the game in its file.
    pub index: usize,
    pub result: GameResult,
    pub positions: Vec<String>,
    pub moves: Vec<String>,
}

impl GameRecord {
    pub fn ply_count(&self) -> usize {
        self.moves.len()
    }

    /// Position after `ply` plies together with the move played from it.
    pub fn ply(&self, ply: usize) -> Option<(&str, Option<&str>)> {
        let fen = self.positions.get(ply)?;
        Some((fen.as_str(), self.moves.get(ply).map(String::as_str)))
    }
}

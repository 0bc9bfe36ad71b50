use std::io::Read;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use pgn_reader::{RawTag, Reader, SanPlus, Skip, Visitor};
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Position as _};

use crate::error::{CorpusError, SkipReason};
use crate::reader::{CorpusReader, ReadStats};
use crate::record::{CorpusRecord, GameRecord, GameResult};

#[derive(Default)]
struct GameTags {
    result: GameResult,
    fen: Option<String>,
}

/// Mainline replay state for the game being read.
struct Replay {
    position: Chess,
    result: GameResult,
    positions: Vec<String>,
    moves: Vec<String>,
}

impl Replay {
    fn new(position: Chess, result: GameResult) -> Self {
        let mut replay = Self {
            position,
            result,
            positions: Vec::with_capacity(128),
            moves: Vec::with_capacity(128),
        };
        replay.push_position();
        replay
    }

    fn push_position(&mut self) {
        let fen = Fen::from_position(&self.position, EnPassantMode::Legal);
        self.positions.push(fen.to_string());
    }
}

/// Replays each game's mainline and records every position along it.
/// Variations, comments and NAGs are ignored.
struct GameVisitor {
    index: usize,
}

impl Visitor for GameVisitor {
    type Tags = GameTags;
    type Movetext = Replay;
    type Output = Result<GameRecord, SkipReason>;

    fn begin_tags(&mut self) -> ControlFlow<Self::Output, Self::Tags> {
        self.index += 1;
        ControlFlow::Continue(GameTags::default())
    }

    fn tag(
        &mut self,
        tags: &mut Self::Tags,
        key: &[u8],
        value: RawTag<'_>,
    ) -> ControlFlow<Self::Output> {
        match key {
            b"Result" => tags.result = GameResult::from_tag(value.as_bytes()),
            b"FEN" => tags.fen = Some(String::from_utf8_lossy(value.as_bytes()).into_owned()),
            _ => {}
        }
        ControlFlow::Continue(())
    }

    fn begin_movetext(&mut self, tags: Self::Tags) -> ControlFlow<Self::Output, Self::Movetext> {
        let position = match tags.fen {
            Some(fen) => {
                let parsed = Fen::from_ascii(fen.as_bytes())
                    .map_err(|e| e.to_string())
                    .and_then(|f| {
                        f.into_position::<Chess>(CastlingMode::Standard)
                            .map_err(|e| e.to_string())
                    });
                match parsed {
                    Ok(position) => position,
                    Err(e) => {
                        return ControlFlow::Break(Err(SkipReason::CorruptGame(format!(
                            "bad FEN tag '{}': {}",
                            fen, e
                        ))))
                    }
                }
            }
            None => Chess::default(),
        };

        ControlFlow::Continue(Replay::new(position, tags.result))
    }

    fn begin_variation(&mut self, _: &mut Self::Movetext) -> ControlFlow<Self::Output, Skip> {
        ControlFlow::Continue(Skip(true))
    }

    fn san(&mut self, replay: &mut Self::Movetext, san: SanPlus) -> ControlFlow<Self::Output> {
        let m = match san.san.to_move(&replay.position) {
            Ok(m) => m,
            Err(_) => {
                return ControlFlow::Break(Err(SkipReason::CorruptGame(format!(
                    "illegal move {} at ply {}",
                    san,
                    replay.moves.len() + 1
                ))))
            }
        };

        replay
            .moves
            .push(m.to_uci(CastlingMode::Standard).to_string());
        replay.position.play_unchecked(m);
        replay.push_position();

        ControlFlow::Continue(())
    }

    fn end_game(&mut self, replay: Self::Movetext) -> Self::Output {
        Ok(GameRecord {
            index: self.index,
            result: replay.result,
            positions: replay.positions,
            moves: replay.moves,
        })
    }
}

/// Streams games out of a PGN file, one [`GameRecord`] per game.
///
/// Games with an unreadable start position or an illegal move are skipped
/// whole and counted.
pub struct GameReader<R: Read> {
    reader: Reader<R>,
    visitor: GameVisitor,
    path: PathBuf,
    stats: ReadStats,
    max_games: Option<usize>,
    done: bool,
}

impl<R: Read> GameReader<R> {
    pub fn new(input: R, path: &Path, max_games: Option<usize>) -> Self {
        Self {
            reader: Reader::new(input),
            visitor: GameVisitor { index: 0 },
            path: path.to_path_buf(),
            stats: ReadStats::default(),
            max_games,
            done: false,
        }
    }
}

impl<R: Read> Iterator for GameReader<R> {
    type Item = Result<CorpusRecord, CorpusError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done
                || self
                    .max_games
                    .is_some_and(|max| self.stats.records_read >= max)
            {
                return None;
            }

            match self.reader.read_game(&mut self.visitor) {
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Ok(Some(Ok(game))) => {
                    self.stats.records_read += 1;
                    return Some(Ok(CorpusRecord::Game(game)));
                }
                Ok(Some(Err(reason))) => {
                    self.stats.records_read += 1;
                    self.stats.skipped += 1;
                    log::warn!(
                        "{:?}: game {} skipped ({})",
                        self.path,
                        self.visitor.index,
                        reason
                    );
                }
                Err(source) => {
                    self.done = true;
                    return Some(Err(CorpusError::Read {
                        path: self.path.clone(),
                        source,
                    }));
                }
            }
        }
    }
}

impl<R: Read> CorpusReader for GameReader<R> {
    fn stats(&self) -> ReadStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_games(pgn: &str) -> (Vec<GameRecord>, ReadStats) {
        let mut reader = GameReader::new(pgn.as_bytes(), Path::new("games.pgn"), None);
        let games = reader
            .by_ref()
            .map(|record| match record.unwrap() {
                CorpusRecord::Game(game) => game,
                CorpusRecord::Position(_) => panic!("Expected games only"),
            })
            .collect();
        (games, reader.stats())
    }

    #[test]
    fn test_replays_mainline() {
        let pgn = r#"[Event "Test"]
[Result "1-0"]

1. e4 e5 (1... c5 2. Nf3) 2. Nf3 { developing } Nc6 3. Bb5?! $6 1-0
"#;
        let (games, stats) = read_games(pgn);
        assert_eq!(stats.skipped, 0);
        let game = &games[0];

        assert_eq!(game.index, 1);
        assert_eq!(game.result, GameResult::WhiteWin);
        assert_eq!(game.moves, vec!["e2e4", "e7e5", "g1f3", "b8c6", "f1b5"]);
        assert_eq!(game.positions.len(), 6);
        assert_eq!(
            game.positions[0],
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
        assert_eq!(
            game.positions[1],
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn test_corrupt_game_is_skipped_and_next_is_read() {
        let pgn = r#"[Result "0-1"]

1. e4 Ke3 0-1

[Result "*"]

1. d4 d5 *
"#;
        let (games, stats) = read_games(pgn);

        assert_eq!(games.len(), 1);
        assert_eq!(games[0].index, 2);
        assert_eq!(games[0].result, GameResult::Unknown);
        assert_eq!(games[0].moves, vec!["d2d4", "d7d5"]);
        assert_eq!(stats.records_read, 2);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn test_fen_tag_sets_start_position() {
        let pgn = r#"[FEN "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1"]
[SetUp "1"]
[Result "1/2-1/2"]

1. e4 Kd7 1/2-1/2
"#;
        let (games, _) = read_games(pgn);

        assert_eq!(games[0].positions[0], "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1");
        assert_eq!(games[0].moves, vec!["e2e4", "e8d7"]);
        assert_eq!(games[0].result, GameResult::Draw);
    }

    #[test]
    fn test_game_ceiling() {
        let pgn = "1. e4 *\n\n1. d4 *\n\n1. c4 *\n";
        let mut reader = GameReader::new(pgn.as_bytes(), Path::new("games.pgn"), Some(2));
        assert_eq!(reader.by_ref().count(), 2);
    }
}

use std::io::BufRead;
use std::path::{Path, PathBuf};

use utils::Score;

use crate::error::{CorpusError, SkipReason};
use crate::reader::{CorpusReader, ReadStats};
use crate::record::{CorpusRecord, RawPosition};

/// Which comma-separated columns of a position list hold the FEN and,
/// optionally, a White-relative centipawn evaluation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ListColumns {
    pub fen_column: usize,
    pub eval_column: Option<usize>,
}

/// Reads a plain position list: one FEN or EPD per line, optionally as a
/// column of a CSV file. A first line whose FEN column reads `FEN` is
/// treated as a header.
pub struct ListReader<R> {
    reader: R,
    path: PathBuf,
    columns: ListColumns,
    buf: Vec<u8>,
    stats: ReadStats,
    max_lines: Option<usize>,
    done: bool,
}

impl<R: BufRead> ListReader<R> {
    pub fn new(reader: R, path: &Path, columns: ListColumns, max_lines: Option<usize>) -> Self {
        Self {
            reader,
            path: path.to_path_buf(),
            columns,
            buf: Vec::with_capacity(256),
            stats: ReadStats::default(),
            max_lines,
            done: false,
        }
    }

    fn parse_line(&self, line: usize) -> Result<Option<(String, Option<Score>)>, SkipReason> {
        let text = std::str::from_utf8(&self.buf)?.trim();
        if text.is_empty() || (line == 1 && self.is_header(text)) {
            return Ok(None);
        }

        let fields: Vec<&str> = text.split(',').map(str::trim).collect();

        let fen = fields
            .get(self.columns.fen_column)
            .filter(|fen| !fen.is_empty())
            .ok_or(SkipReason::MissingColumn(self.columns.fen_column))?;

        let prior = match self.columns.eval_column {
            Some(column) => {
                let value = fields.get(column).ok_or(SkipReason::MissingColumn(column))?;
                let cp = value
                    .parse::<i32>()
                    .map_err(|_| SkipReason::BadEvaluation(value.to_string()))?;
                Some(Score::Centipawns(cp))
            }
            None => None,
        };

        Ok(Some((fen.to_string(), prior)))
    }

    fn is_header(&self, text: &str) -> bool {
        text.split(',')
            .nth(self.columns.fen_column)
            .is_some_and(|field| field.trim().eq_ignore_ascii_case("fen"))
    }
}

impl<R: BufRead> Iterator for ListReader<R> {
    type Item = Result<CorpusRecord, CorpusError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done
                || self
                    .max_lines
                    .is_some_and(|max| self.stats.records_read >= max)
            {
                return None;
            }

            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => {}
                Err(source) => {
                    self.done = true;
                    return Some(Err(CorpusError::Read {
                        path: self.path.clone(),
                        source,
                    }));
                }
            }

            self.stats.records_read += 1;
            let line = self.stats.records_read;

            match self.parse_line(line) {
                Ok(Some((fen, prior))) => {
                    return Some(Ok(CorpusRecord::Position(RawPosition { line, fen, prior })));
                }
                Ok(None) => {}
                Err(reason) => {
                    self.stats.skipped += 1;
                    log::debug!("{:?}:{}: skipped ({})", self.path, line, reason);
                }
            }
        }
    }
}

impl<R: BufRead> CorpusReader for ListReader<R> {
    fn stats(&self) -> ReadStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read(text: &str, columns: ListColumns) -> (Vec<RawPosition>, ReadStats) {
        let mut reader = ListReader::new(Cursor::new(text.to_string()), Path::new("list.csv"), columns, None);
        let positions = reader
            .by_ref()
            .map(|record| match record.unwrap() {
                CorpusRecord::Position(raw) => raw,
                CorpusRecord::Game(_) => panic!("Expected positions only"),
            })
            .collect();
        (positions, reader.stats())
    }

    #[test]
    fn test_epd_lines() {
        let text = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -\n\n8/8/8/8/8/8/8/K6k w - - 0 1\n";
        let (positions, stats) = read(text, ListColumns::default());

        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].line, 1);
        assert_eq!(positions[1].line, 3);
        assert_eq!(positions[1].prior, None);
        assert_eq!(stats.skipped, 0);
    }

    #[test]
    fn test_csv_with_header_and_evaluations() {
        let text = "FEN,Evaluation\n\
                    rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1,12\n\
                    8/8/8/8/8/8/8/K6k w - - 0 1,oops\n\
                    8/8/8/8/8/8/8/K6k b - - 0 1\n\
                    8/8/8/8/8/8/8/K5k1 w - - 0 1,-30\n";
        let columns = ListColumns {
            fen_column: 0,
            eval_column: Some(1),
        };
        let (positions, stats) = read(text, columns);

        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].prior, Some(Score::Centipawns(12)));
        assert_eq!(positions[1].prior, Some(Score::Centipawns(-30)));
        assert_eq!(stats.records_read, 5);
        assert_eq!(stats.skipped, 2);
    }

    #[test]
    fn test_fen_in_second_column() {
        let text = "id,fen\n7,8/8/8/8/8/8/8/K6k w - - 0 1\n8\n";
        let columns = ListColumns {
            fen_column: 1,
            eval_column: None,
        };
        let (positions, stats) = read(text, columns);

        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].fen, "8/8/8/8/8/8/8/K6k w - - 0 1");
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn test_undecodable_line_is_skipped() {
        let mut bytes = b"FEN,Evaluation\n8/8/8/8/8/8/8/K6k w - - 0 1,5\n".to_vec();
        bytes.extend_from_slice(b"\xff\xfe garbage,3\n");
        bytes.extend_from_slice(b"8/8/8/8/8/8/8/K5k1 w - - 0 1,-4\n");
        let columns = ListColumns {
            fen_column: 0,
            eval_column: Some(1),
        };
        let mut reader = ListReader::new(Cursor::new(bytes), Path::new("list.csv"), columns, None);

        let priors: Vec<Option<Score>> = reader
            .by_ref()
            .map(|record| match record.unwrap() {
                CorpusRecord::Position(raw) => raw.prior,
                CorpusRecord::Game(_) => panic!("Expected positions only"),
            })
            .collect();

        assert_eq!(priors, vec![Some(Score::Centipawns(5)), Some(Score::Centipawns(-4))]);
        assert_eq!(reader.stats().skipped, 1);
        assert_eq!(reader.stats().records_read, 4);
    }

    #[test]
    fn test_line_ceiling() {
        let text = "8/8/8/8/8/8/8/K6k w - -\n".repeat(10);
        let mut reader =
            ListReader::new(Cursor::new(text), Path::new("list.epd"), ListColumns::default(), Some(3));
        assert_eq!(reader.by_ref().count(), 3);
        assert_eq!(reader.stats().records_read, 3);
    }
}

use std::io::BufRead;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use utils::Score;

use crate::error::{CorpusError, SkipReason};
use crate::reader::{CorpusReader, ReadStats};
use crate::record::{CorpusRecord, RawPosition};

#[derive(Deserialize)]
struct EvalLine {
    fen: String,
    #[serde(default)]
    evals: Vec<EvalEntry>,
}

#[derive(Deserialize)]
struct EvalEntry {
    depth: u32,
    #[serde(default)]
    pvs: Vec<PvEntry>,
}

#[derive(Deserialize)]
struct PvEntry {
    cp: Option<i32>,
}

/// Reads a line-oriented JSON evaluation dump, keeping for every position
/// the first line of its deepest evaluation.
///
/// Scores in the dump are White-relative centipawns.
pub struct EvalDumpReader<R> {
    reader: R,
    path: PathBuf,
    buf: Vec<u8>,
    stats: ReadStats,
    max_lines: Option<usize>,
    min_depth: Option<u32>,
    done: bool,
}

impl<R: BufRead> EvalDumpReader<R> {
    pub fn new(reader: R, path: &Path, max_lines: Option<usize>, min_depth: Option<u32>) -> Self {
        Self {
            reader,
            path: path.to_path_buf(),
            buf: Vec::with_capacity(1024),
            stats: ReadStats::default(),
            max_lines,
            min_depth,
            done: false,
        }
    }

    fn at_ceiling(&self) -> bool {
        self.max_lines
            .is_some_and(|max| self.stats.records_read >= max)
    }
}

impl<R: BufRead> Iterator for EvalDumpReader<R> {
    type Item = Result<CorpusRecord, CorpusError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done || self.at_ceiling() {
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

            if self.buf.trim_ascii().is_empty() {
                continue;
            }

            match parse_eval_line(&self.buf, self.min_depth) {
                Ok((fen, cp)) => {
                    return Some(Ok(CorpusRecord::Position(RawPosition {
                        line,
                        fen,
                        prior: Some(Score::Centipawns(cp)),
                    })));
                }
                Err(reason) => {
                    self.stats.skipped += 1;
                    log::debug!("{:?}:{}: skipped ({})", self.path, line, reason);
                }
            }
        }
    }
}

impl<R: BufRead> CorpusReader for EvalDumpReader<R> {
    fn stats(&self) -> ReadStats {
        self.stats
    }
}

/// Pick the FEN and centipawn score of the first line of the deepest
/// evaluation. Ties on depth keep the entry that came first.
fn parse_eval_line(bytes: &[u8], min_depth: Option<u32>) -> Result<(String, i32), SkipReason> {
    let record: EvalLine = serde_json::from_slice(bytes)?;

    let mut deepest: Option<&EvalEntry> = None;
    for entry in &record.evals {
        if deepest.map_or(true, |best| entry.depth > best.depth) {
            deepest = Some(entry);
        }
    }

    let deepest = deepest.ok_or(SkipReason::NoEvals)?;
    if let Some(min) = min_depth {
        if deepest.depth < min {
            return Err(SkipReason::TooShallow {
                depth: deepest.depth,
                min,
            });
        }
    }

    let first = deepest.pvs.first().ok_or(SkipReason::NoLines)?;
    let cp = first.cp.ok_or(SkipReason::MateOnly)?;

    Ok((record.fen, cp))
}

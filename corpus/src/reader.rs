use std::io::BufReader;
use std::path::Path;

use crate::error::CorpusError;
use crate::eval_dump::EvalDumpReader;
use crate::games::GameReader;
use crate::input::{open_input, Compression};
use crate::list::{ListColumns, ListReader};
use crate::record::CorpusRecord;

/// A lazy, forward-only stream of corpus records.
///
/// Malformed records are skipped inside the reader and only counted; an
/// `Err` item is fatal and is always the last item produced.
pub trait CorpusReader: Iterator<Item = Result<CorpusRecord, CorpusError>> {
    fn stats(&self) -> ReadStats;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Lines or games consumed, including the ones that were skipped.
    pub records_read: usize,
    pub skipped: usize,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SourceKind {
    /// One JSON evaluation record per line.
    EvalDump,
    /// PGN game records.
    Games,
    /// Delimited position list (CSV or EPD).
    List,
}

#[derive(Debug, Clone)]
pub struct ReaderConfig {
    pub kind: SourceKind,
    pub compression: Compression,
    /// Stop after this many lines (or games) have been read.
    pub max_records: Option<usize>,
    /// Eval dump only: skip records whose deepest evaluation is shallower.
    pub min_depth: Option<u32>,
    /// List only.
    pub columns: ListColumns,
}

impl ReaderConfig {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            compression: Compression::Auto,
            max_records: None,
            min_depth: None,
            columns: ListColumns::default(),
        }
    }
}

pub fn open_corpus(
    path: &Path,
    config: &ReaderConfig,
) -> Result<Box<dyn CorpusReader>, CorpusError> {
    let input = open_input(path, config.compression)?;

    let reader: Box<dyn CorpusReader> = match config.kind {
        SourceKind::EvalDump => Box::new(EvalDumpReader::new(
            BufReader::new(input),
            path,
            config.max_records,
            config.min_depth,
        )),
        SourceKind::Games => Box::new(GameReader::new(input, path, config.max_records)),
        SourceKind::List => Box::new(ListReader::new(
            BufReader::new(input),
            path,
            config.columns,
            config.max_records,
        )),
    };

    log::info!("Reading {:?} as {:?}", path, config.kind);

    Ok(reader)
}

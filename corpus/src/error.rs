use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures that end a corpus read. Single bad records never surface here.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("cannot open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("read error in {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Why a single line or game was dropped by a reader.
#[derive(Debug, Error)]
pub enum SkipReason {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no evaluations")]
    NoEvals,

    #[error("deepest evaluation has no lines")]
    NoLines,

    #[error("deepest line is a mate score")]
    MateOnly,

    #[error("deepest evaluation is depth {depth}, below {min}")]
    TooShallow { depth: u32, min: u32 },

    #[error("line is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("missing column {0}")]
    MissingColumn(usize),

    #[error("evaluation '{0}' is not an integer")]
    BadEvaluation(String),

    #[error("corrupt game: {0}")]
    CorruptGame(String),
}

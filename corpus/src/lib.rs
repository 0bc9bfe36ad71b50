mod error;
mod eval_dump;
mod games;
mod input;
mod list;
mod reader;
mod record;
mod sampler;
mod seen;

pub use error::{CorpusError, SkipReason};
pub use eval_dump::EvalDumpReader;
pub use games::GameReader;
pub use input::{open_input, Compression};
pub use list::{ListColumns, ListReader};
pub use reader::{open_corpus, CorpusReader, ReadStats, ReaderConfig, SourceKind};
pub use record::{CorpusRecord, GameRecord, GameResult, RawPosition};
pub use sampler::{Candidate, GamePolicy, SampleStats, Sampler, SamplerConfig};
pub use seen::SeenPositions;

mod decoder;
mod encoder;
mod process;

pub mod commands;

pub use commands::{Bound, GoParams, Info, UciInput, UciOutput};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use process::{EngineError, EngineProcess};

/// Null move in UCI format, sent as the bestmove when the position has no legal moves.
pub const NULL_MOVE: &str = "0000";

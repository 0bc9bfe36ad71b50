use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use clap::{ArgGroup, Parser, ValueEnum};
use corpus::{Compression, GamePolicy, ListColumns, ReaderConfig, SamplerConfig, SourceKind};
use dataset::{
    EngineSettings, OutputFormat, PipelineConfig, QuietnessConfig, ScoringMode, SearchLimit,
};
use utils::MATE_SCORE;

#[derive(Parser, Debug)]
#[command(name = "quietset")]
#[command(author)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Builds datasets of quiet, evaluated chess positions")]
#[command(group(ArgGroup::new("limit").args(["depth", "movetime", "nodes"])))]
pub struct Args {
    /// Corpus to read: an evaluation dump, a PGN file or a position list.
    pub input: PathBuf,

    /// Corpus format. Guessed from the file name when omitted.
    #[arg(long, value_enum)]
    pub source: Option<SourceArg>,

    #[arg(long, value_enum, default_value_t = CompressionArg::Auto)]
    pub compression: CompressionArg,

    /// Dataset file to write. Defaults to data/<timestamp>.csv.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = FormatArg::FenEval)]
    pub format: FormatArg,

    #[arg(long, value_enum, default_value_t = ScoringArg::Multipv)]
    pub scoring: ScoringArg,

    /// UCI engine binary, needed by the single and multipv scoring modes.
    #[arg(long)]
    pub engine: Option<PathBuf>,

    /// Engine option as NAME=VALUE, e.g. Threads=4. Repeatable.
    #[arg(long = "engine-option", value_parser = parse_engine_option)]
    pub engine_options: Vec<(String, String)>,

    /// Seconds a single analysis may take before the position is skipped.
    #[arg(long, default_value_t = 30)]
    pub engine_timeout: u64,

    /// Times a crashed engine is started again before the run gives up.
    #[arg(long, default_value_t = 1)]
    pub restart_budget: u32,

    /// Search depth in plies.
    #[arg(long)]
    pub depth: Option<u8>,

    /// Search time per position in milliseconds.
    #[arg(long)]
    pub movetime: Option<u64>,

    /// Search nodes per position.
    #[arg(long)]
    pub nodes: Option<u64>,

    /// Engine lines compared per position in multipv scoring.
    #[arg(long, default_value_t = 4)]
    pub variations: usize,

    /// Largest centipawn spread between lines of a quiet position.
    #[arg(long, default_value_t = 50)]
    pub threshold: i32,

    /// Positions need more pieces than this.
    #[arg(long, default_value_t = 6)]
    pub material_floor: u32,

    /// Scores at or beyond this many centipawns are not admitted.
    #[arg(long, default_value_t = 5000)]
    pub mate_bound: i32,

    /// Centipawn value mate scores are mapped to.
    #[arg(long, default_value_t = MATE_SCORE)]
    pub mate_score: i32,

    /// Stop after writing this many records.
    #[arg(long)]
    pub max_records: Option<usize>,

    /// Stop after reading this many lines (or games).
    #[arg(long)]
    pub max_lines: Option<usize>,

    /// Skip game positions within this many plies of the start.
    #[arg(long, default_value_t = 10)]
    pub ply_floor: usize,

    /// Only sample positions where the eventual winner is to move.
    #[arg(long)]
    pub winning_side_only: bool,

    #[arg(long, value_enum, default_value_t = PolicyArg::Random)]
    pub policy: PolicyArg,

    /// Skip positions already seen in this run for every source kind.
    #[arg(long)]
    pub dedup: bool,

    /// Skip dump records whose deepest evaluation is shallower than this.
    #[arg(long)]
    pub min_depth: Option<u32>,

    /// Position list column holding the FEN.
    #[arg(long, default_value_t = 0)]
    pub fen_column: usize,

    /// Position list column holding a centipawn evaluation.
    #[arg(long)]
    pub eval_column: Option<usize>,

    /// Seed for the random pick policy.
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long)]
    pub no_progress: bool,

    #[arg(short, long)]
    pub verbose: bool,

    /// Write the log to this file instead of the terminal.
    #[arg(short, long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SourceArg {
    EvalDump,
    Games,
    List,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompressionArg {
    Auto,
    Plain,
    Zstd,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum FormatArg {
    Fen,
    FenEval,
    FenMove,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ScoringArg {
    Prior,
    Single,
    Multipv,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum PolicyArg {
    Random,
    Unique,
}

impl Args {
    pub fn source_kind(&self) -> SourceKind {
        match self.source {
            Some(SourceArg::EvalDump) => SourceKind::EvalDump,
            Some(SourceArg::Games) => SourceKind::Games,
            Some(SourceArg::List) => SourceKind::List,
            None => guess_source(&self.input),
        }
    }

    pub fn reader_config(&self) -> ReaderConfig {
        ReaderConfig {
            kind: self.source_kind(),
            compression: match self.compression {
                CompressionArg::Auto => Compression::Auto,
                CompressionArg::Plain => Compression::Plain,
                CompressionArg::Zstd => Compression::Zstd,
            },
            max_records: self.max_lines,
            min_depth: self.min_depth,
            columns: ListColumns {
                fen_column: self.fen_column,
                eval_column: self.eval_column,
            },
        }
    }

    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            ply_floor: self.ply_floor,
            winning_side_only: self.winning_side_only,
            material_floor: self.material_floor,
            policy: match self.policy {
                PolicyArg::Random => GamePolicy::RandomPick,
                PolicyArg::Unique => GamePolicy::Unique,
            },
            dedup: self.dedup,
            with_moves: self.output_format() == OutputFormat::FenMove,
        }
    }

    pub fn output_format(&self) -> OutputFormat {
        match self.format {
            FormatArg::Fen => OutputFormat::Fen,
            FormatArg::FenEval => OutputFormat::FenEval,
            FormatArg::FenMove => OutputFormat::FenMove,
        }
    }

    pub fn search_limit(&self) -> Option<SearchLimit> {
        match (self.depth, self.movetime, self.nodes) {
            (Some(depth), _, _) => Some(SearchLimit::Depth(depth)),
            (_, Some(ms), _) => Some(SearchLimit::MoveTime(Duration::from_millis(ms))),
            (_, _, Some(nodes)) => Some(SearchLimit::Nodes(nodes)),
            _ => None,
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            scoring: match self.scoring {
                ScoringArg::Prior => ScoringMode::Prior,
                ScoringArg::Single => ScoringMode::Single,
                ScoringArg::Multipv => ScoringMode::MultiPv,
            },
            limit: self.search_limit(),
            quietness: QuietnessConfig {
                variation_count: self.variations,
                threshold: self.threshold,
                material_floor: self.material_floor,
                mate_exclusion_bound: self.mate_bound,
                mate_score: self.mate_score,
            },
        }
    }

    pub fn engine_settings(&self) -> Option<EngineSettings> {
        let path = self.engine.clone()?;

        Some(EngineSettings {
            options: self.engine_options.clone(),
            timeout: Duration::from_secs(self.engine_timeout),
            restart_budget: self.restart_budget,
            ..EngineSettings::new(path)
        })
    }

    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
            PathBuf::from(format!("data/{}.csv", timestamp))
        })
    }
}

/// `.pgn` is a game file, `.json`/`.jsonl`/`.ndjson` an evaluation dump and
/// anything else a position list. A trailing `.zst` is looked through.
fn guess_source(path: &Path) -> SourceKind {
    let inner = match path.extension() {
        Some(ext) if ext == "zst" => path.file_stem().map(Path::new).unwrap_or(path),
        _ => path,
    };

    match inner.extension().and_then(|ext| ext.to_str()) {
        Some("pgn") => SourceKind::Games,
        Some("json" | "jsonl" | "ndjson") => SourceKind::EvalDump,
        _ => SourceKind::List,
    }
}

fn parse_engine_option(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{}'", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("quietset").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["positions.csv"]);
        let quietness = args.pipeline_config().quietness;

        assert_eq!(quietness.variation_count, 4);
        assert_eq!(quietness.threshold, 50);
        assert_eq!(quietness.material_floor, 6);
        assert_eq!(quietness.mate_exclusion_bound, 5000);
        assert_eq!(quietness.mate_score, 100_000);
        assert_eq!(args.sampler_config().ply_floor, 10);
        assert_eq!(args.search_limit(), None);
        assert_eq!(args.max_records, None);
    }

    #[test]
    fn test_author_comes_from_the_manifest() {
        use clap::CommandFactory;

        let command = Args::command();
        assert_eq!(command.get_author(), Some(env!("CARGO_PKG_AUTHORS")));
        assert_eq!(command.get_name(), "quietset");
    }

    #[test]
    fn test_search_limits_are_exclusive() {
        assert!(Args::try_parse_from(["quietset", "in.csv", "--depth", "8", "--nodes", "1"]).is_err());
        assert_eq!(
            parse(&["in.csv", "--movetime", "1000"]).search_limit(),
            Some(SearchLimit::MoveTime(Duration::from_secs(1)))
        );
    }

    #[test]
    fn test_source_guessing() {
        assert_eq!(guess_source(Path::new("lichess_db_eval.jsonl.zst")), SourceKind::EvalDump);
        assert_eq!(guess_source(Path::new("Nakamura.pgn")), SourceKind::Games);
        assert_eq!(guess_source(Path::new("games.pgn.zst")), SourceKind::Games);
        assert_eq!(guess_source(Path::new("fen_cp.csv")), SourceKind::List);
    }

    #[test]
    fn test_engine_options() {
        let args = parse(&[
            "in.csv",
            "--engine",
            "stockfish",
            "--engine-option",
            "Threads=4",
            "--engine-option",
            "Hash = 128",
        ]);
        let settings = args.engine_settings().unwrap();

        assert_eq!(
            settings.options,
            vec![
                ("Threads".to_string(), "4".to_string()),
                ("Hash".to_string(), "128".to_string())
            ]
        );
        assert!(parse_engine_option("Threads").is_err());
    }

    #[test]
    fn test_move_output_samples_positions_with_moves() {
        let args = parse(&["games.pgn", "--format", "fen-move"]);
        assert!(args.sampler_config().with_moves);
    }
}

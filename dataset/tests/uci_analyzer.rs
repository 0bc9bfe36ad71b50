#![cfg(unix)]

use std::path::PathBuf;
use std::time::Duration;

use dataset::{AnalysisError, Analyzer, EngineSettings, SearchLimit, UciAnalyzer};
use utils::{Position, Score};

const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
/// The fake engine dies when asked to search this one.
const CRASHES: &str = "8/8/8/8/8/8/8/K6k w - - 0 1";
/// The fake engine only answers this one once told to stop.
const HANGS: &str = "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1";

/// Speaks just enough UCI: two lines of multi-PV output per search, with a
/// bound line that must be ignored.
const FAKE_ENGINE: &str = r#"
pos=""
while read -r line; do
  case "$line" in
    uci) echo "id name FakeFish"; echo "uciok" ;;
    isready) echo "readyok" ;;
    "position fen 8/"*) pos=crash ;;
    "position fen 4k3/"*) pos=hang ;;
    position*) pos=normal ;;
    go*)
      case "$pos" in
        crash) exit 1 ;;
        hang) ;;
        *)
          echo "info depth 8 multipv 1 score cp 30 nodes 100 pv e2e4 e7e5"
          echo "info depth 8 multipv 2 score cp 20 lowerbound pv d2d4"
          echo "info depth 8 multipv 2 score cp 25 pv d2d4 d7d5"
          echo "info string done"
          echo "bestmove e2e4 ponder e7e5"
          ;;
      esac ;;
    stop) echo "bestmove e2e4" ;;
    quit) exit 0 ;;
  esac
done
"#;

fn settings(restart_budget: u32) -> EngineSettings {
    EngineSettings {
        path: PathBuf::from("sh"),
        args: vec!["-c".to_string(), FAKE_ENGINE.to_string()],
        options: vec![("Hash".to_string(), "16".to_string())],
        timeout: Duration::from_millis(500),
        restart_budget,
    }
}

fn position(fen: &str) -> Position {
    Position::from_fen(fen).unwrap()
}

#[test]
fn test_collects_exact_lines_best_first() {
    let mut analyzer = UciAnalyzer::start(settings(0)).unwrap();

    let result = analyzer
        .analyze(&position(START), SearchLimit::Depth(8), 2)
        .unwrap();

    assert_eq!(result.scores, vec![Score::Centipawns(30), Score::Centipawns(25)]);
    assert_eq!(result.best_move.as_deref(), Some("e2e4"));
    assert!(result.is_complete(2));
}

#[test]
fn test_fewer_lines_than_requested_is_not_padded() {
    let mut analyzer = UciAnalyzer::start(settings(0)).unwrap();

    let result = analyzer
        .analyze(&position(START), SearchLimit::Nodes(1000), 4)
        .unwrap();

    assert_eq!(result.scores.len(), 2);
    assert!(!result.is_complete(4));
}

#[test]
fn test_scores_are_white_relative() {
    let mut analyzer = UciAnalyzer::start(settings(0)).unwrap();

    let result = analyzer
        .analyze(&position(AFTER_E4), SearchLimit::Depth(8), 2)
        .unwrap();

    assert_eq!(result.scores, vec![Score::Centipawns(-30), Score::Centipawns(-25)]);
}

#[test]
fn test_crash_restarts_within_budget() {
    let mut analyzer = UciAnalyzer::start(settings(1)).unwrap();
    let limit = SearchLimit::Depth(8);

    let err = analyzer.analyze(&position(CRASHES), limit, 2).unwrap_err();
    assert!(matches!(err, AnalysisError::Failed { .. }));
    assert!(!err.is_fatal());

    // Restarted once, the session works again.
    assert!(analyzer.analyze(&position(START), limit, 2).is_ok());

    let err = analyzer.analyze(&position(CRASHES), limit, 2).unwrap_err();
    assert!(!err.is_fatal());

    let err = analyzer.analyze(&position(START), limit, 2).unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn test_timeout_skips_position_and_keeps_session() {
    let mut analyzer = UciAnalyzer::start(settings(0)).unwrap();
    let limit = SearchLimit::MoveTime(Duration::from_millis(50));

    let err = analyzer.analyze(&position(HANGS), limit, 2).unwrap_err();
    assert!(matches!(err, AnalysisError::Timeout { .. }));

    let result = analyzer.analyze(&position(START), limit, 2).unwrap();
    assert_eq!(result.scores.len(), 2);
}

#[test]
fn test_missing_engine_is_fatal() {
    let mut settings = settings(0);
    settings.path = PathBuf::from("/nonexistent/engine");

    let err = UciAnalyzer::start(settings).err().unwrap();
    assert!(err.is_fatal());
}

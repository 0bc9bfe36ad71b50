use std::path::PathBuf;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use uci::{EngineError, EngineProcess, UciInput, UciOutput, NULL_MOVE};
use utils::{flip_eval_perspective, Position, Score};

use crate::analysis::{AnalysisError, Analyzer, MultiPvResult, SearchLimit};

const STOP_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub path: PathBuf,
    pub args: Vec<String>,
    /// Forwarded as `setoption` after every (re)start.
    pub options: Vec<(String, String)>,
    /// Hard bound on a single analysis call, on top of the search limit.
    pub timeout: Duration,
    /// How many times a crashed engine may be started again.
    pub restart_budget: u32,
}

impl EngineSettings {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            args: Vec::new(),
            options: Vec::new(),
            timeout: Duration::from_secs(30),
            restart_budget: 1,
        }
    }
}

/// [`Analyzer`] backed by one external UCI engine process, reused for every
/// call of a run.
///
/// A call that times out or crashes the engine fails on its own; a crashed
/// engine is started again on the next call while the restart budget lasts.
pub struct UciAnalyzer {
    settings: EngineSettings,
    engine: Option<EngineProcess>,
    multipv: Option<usize>,
    restarts: u32,
}

impl UciAnalyzer {
    pub fn start(settings: EngineSettings) -> Result<Self, AnalysisError> {
        let engine = connect(&settings).map_err(|e| AnalysisError::Unavailable(e.to_string()))?;

        Ok(Self {
            settings,
            engine: Some(engine),
            multipv: None,
            restarts: 0,
        })
    }

    fn reconnect(&mut self) -> Result<(), AnalysisError> {
        if self.restarts >= self.settings.restart_budget {
            return Err(AnalysisError::Unavailable(format!(
                "engine restart budget of {} used up",
                self.settings.restart_budget
            )));
        }

        self.restarts += 1;
        warn!(
            "Restarting engine ({}/{})",
            self.restarts, self.settings.restart_budget
        );

        let engine = connect(&self.settings).map_err(|e| AnalysisError::Unavailable(e.to_string()))?;
        self.engine = Some(engine);
        Ok(())
    }

    /// Drop the session; the engine gets `quit` and is killed if it lingers.
    fn discard(&mut self) {
        self.engine = None;
        self.multipv = None;
    }

    /// Ask a searching engine to stop and drain its reply so the next call
    /// starts on a clean stream. An engine that ignores `stop` is discarded.
    fn recover(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };

        let deadline = Instant::now() + STOP_GRACE;
        let stopped = engine.send(&UciInput::Stop).and_then(|_| {
            engine.wait_for(deadline, |output| {
                matches!(output, UciOutput::BestMove { .. })
            })
        });

        if let Err(e) = stopped {
            warn!("Engine did not stop ({}), discarding it", e);
            self.discard();
        }
    }
}

impl Analyzer for UciAnalyzer {
    fn analyze(
        &mut self,
        position: &Position,
        limit: SearchLimit,
        variation_count: usize,
    ) -> Result<MultiPvResult, AnalysisError> {
        if self.engine.is_none() {
            self.reconnect()?;
        }

        let outcome = match self.engine.as_mut() {
            Some(engine) => search(
                engine,
                &mut self.multipv,
                position,
                limit,
                variation_count,
                self.settings.timeout,
            ),
            None => Err(EngineError::Exited),
        };

        match outcome {
            Ok(result) => Ok(result),
            Err(EngineError::Timeout) => {
                self.recover();
                Err(AnalysisError::Timeout {
                    fen: position.fen().to_string(),
                })
            }
            Err(e) => {
                self.discard();
                Err(AnalysisError::Failed {
                    fen: position.fen().to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

fn connect(settings: &EngineSettings) -> Result<EngineProcess, EngineError> {
    let mut engine = EngineProcess::spawn(&settings.path, &settings.args)?;

    let name = engine.handshake(settings.timeout)?;
    info!(
        "Engine {} started (pid {})",
        name.as_deref().unwrap_or("<unnamed>"),
        engine.id()
    );

    for (name, value) in &settings.options {
        engine.send(&UciInput::SetOption {
            name: name.clone(),
            value: value.clone(),
        })?;
    }
    engine.sync(settings.timeout)?;

    Ok(engine)
}

/// Run one search and collect the last exact score reported for each of the
/// first `variation_count` lines.
fn search(
    engine: &mut EngineProcess,
    multipv: &mut Option<usize>,
    position: &Position,
    limit: SearchLimit,
    variation_count: usize,
    timeout: Duration,
) -> Result<MultiPvResult, EngineError> {
    let deadline = Instant::now() + timeout;

    if *multipv != Some(variation_count) {
        engine.send(&UciInput::SetOption {
            name: "MultiPV".to_string(),
            value: variation_count.to_string(),
        })?;
        engine.sync(timeout)?;
        *multipv = Some(variation_count);
    }

    engine.send(&UciInput::Position {
        fen: position.fen().to_string(),
    })?;
    engine.send(&UciInput::Go(limit.go_params()))?;

    let mut lines: Vec<Option<Score>> = vec![None; variation_count];

    let best_move = loop {
        match engine.recv(deadline)? {
            UciOutput::Info(info) if info.is_exact_line() => {
                let rank = usize::from(info.multipv);
                if (1..=variation_count).contains(&rank) {
                    lines[rank - 1] = info.score;
                }
            }
            UciOutput::BestMove { best_move, .. } => break best_move,
            _ => {}
        }
    };

    let side_to_move = position.side_to_move();
    let scores: Vec<Score> = lines
        .into_iter()
        .map_while(|score| score.map(|score| flip_eval_perspective(side_to_move, score)))
        .collect();

    if scores.len() < variation_count {
        debug!(
            "Engine returned {} of {} lines for {}",
            scores.len(),
            variation_count,
            position
        );
    }

    Ok(MultiPvResult {
        position: position.clone(),
        scores,
        best_move: (best_move != NULL_MOVE && best_move != "(none)").then_some(best_move),
    })
}

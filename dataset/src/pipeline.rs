use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use corpus::{Candidate, CorpusError, CorpusReader, ReadStats, Sampler, SeenPositions};
use log::{debug, info, warn};
use thiserror::Error;
use utils::Position;

use crate::analysis::{AnalysisError, Analyzer, EvalSource, EvaluationSample, MultiPvResult};
use crate::config::{PipelineConfig, ScoringMode};
use crate::quietness::{QuietnessClassifier, Rejection};
use crate::writer::{DatasetRecord, DatasetWriter, Label, OutputFormat};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error("cannot write dataset: {0}")]
    Output(#[from] io::Error),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StopReason {
    /// The corpus ran out.
    Exhausted,
    /// The record cap was reached.
    RecordCap,
    /// The stop flag was raised.
    Interrupted,
}

/// Why candidates did not make it into the dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rejections {
    pub invalid_fen: usize,
    pub duplicate: usize,
    pub undecided_game: usize,
    pub too_few_pieces: usize,
    pub in_check: usize,
    pub extreme_score: usize,
    pub spread_too_wide: usize,
    pub insufficient_lines: usize,
    pub engine_failure: usize,
    pub missing_prior: usize,
    pub missing_move: usize,
}

impl Rejections {
    fn record(&mut self, rejection: &Rejection) {
        match rejection {
            Rejection::InCheck => self.in_check += 1,
            Rejection::TooFewPieces { .. } => self.too_few_pieces += 1,
            Rejection::InsufficientLines { .. } => self.insufficient_lines += 1,
            Rejection::SpreadTooWide { .. } => self.spread_too_wide += 1,
            Rejection::ExtremeScore { .. } => self.extreme_score += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.invalid_fen
            + self.duplicate
            + self.undecided_game
            + self.too_few_pieces
            + self.in_check
            + self.extreme_score
            + self.spread_too_wide
            + self.insufficient_lines
            + self.engine_failure
            + self.missing_prior
            + self.missing_move
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Lines or games read from the corpus.
    pub scanned: usize,
    /// Lines or games the reader could not use.
    pub malformed: usize,
    /// Positions handed over by the sampler.
    pub candidates: usize,
    pub admitted: usize,
    pub rejections: Rejections,
    /// Set once the run is over.
    pub stop_reason: Option<StopReason>,
}

/// One run over one corpus: sample, score, classify, write.
///
/// Positions are pulled one at a time. Nothing is read past the point
/// where the record cap is reached or the stop flag is raised, and the
/// output is flushed on every way out of [`run`](Self::run).
pub struct Pipeline<'a, W: Write> {
    config: PipelineConfig,
    classifier: QuietnessClassifier,
    sampler: Sampler,
    seen: SeenPositions,
    analyzer: Option<&'a mut dyn Analyzer>,
    writer: DatasetWriter<W>,
    stop: Arc<AtomicBool>,
    admitted: usize,
    candidates: usize,
    rejections: Rejections,
}

impl<'a, W: Write> Pipeline<'a, W> {
    pub fn new(
        config: PipelineConfig,
        sampler: Sampler,
        analyzer: Option<&'a mut dyn Analyzer>,
        writer: DatasetWriter<W>,
        stop: Arc<AtomicBool>,
    ) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;
        if config.scoring.uses_engine() && analyzer.is_none() {
            return Err(PipelineError::Config(format!(
                "{:?} scoring needs an engine",
                config.scoring
            )));
        }

        Ok(Self {
            classifier: QuietnessClassifier::new(config.quietness),
            config,
            sampler,
            seen: SeenPositions::new(),
            analyzer,
            writer,
            stop,
            admitted: 0,
            candidates: 0,
            rejections: Rejections::default(),
        })
    }

    /// Drive the run to completion. `progress` sees the running totals
    /// after every corpus record.
    pub fn run<R, F>(mut self, reader: &mut R, mut progress: F) -> Result<(RunSummary, W), PipelineError>
    where
        R: CorpusReader + ?Sized,
        F: FnMut(&RunSummary),
    {
        info!(
            "Scoring with {:?}, writing {:?}",
            self.config.scoring,
            self.writer.format()
        );

        let outcome = self.drive(reader, &mut progress);
        let mut summary = self.summary(reader.stats());
        let flushed = self.writer.finish();

        summary.stop_reason = Some(outcome?);
        let out = flushed?;

        Ok((summary, out))
    }

    fn drive<R, F>(&mut self, reader: &mut R, progress: &mut F) -> Result<StopReason, PipelineError>
    where
        R: CorpusReader + ?Sized,
        F: FnMut(&RunSummary),
    {
        loop {
            if self.writer.is_full() {
                return Ok(StopReason::RecordCap);
            }
            if self.stop.load(Ordering::Relaxed) {
                return Ok(StopReason::Interrupted);
            }

            let Some(record) = reader.next() else {
                return Ok(StopReason::Exhausted);
            };

            for candidate in self.sampler.sample(record?, &mut self.seen) {
                if self.writer.is_full() || self.stop.load(Ordering::Relaxed) {
                    break;
                }
                self.process(candidate)?;
            }

            progress(&self.summary(reader.stats()));
        }
    }

    fn process(&mut self, candidate: Candidate) -> Result<(), PipelineError> {
        self.candidates += 1;

        if let Err(rejection) = self.classifier.screen(&candidate.position) {
            self.reject(&candidate, rejection);
            return Ok(());
        }

        let Some((evaluation, best_move)) = self.score(&candidate)? else {
            return Ok(());
        };

        let label = match self.writer.format() {
            OutputFormat::Fen => Label::None,
            OutputFormat::FenEval => Label::Evaluation(evaluation),
            OutputFormat::FenMove => match candidate.played_move.or(best_move) {
                Some(mv) => Label::Move(mv),
                None => {
                    debug!("No move for {} (record {})", candidate.position, candidate.origin);
                    self.rejections.missing_move += 1;
                    return Ok(());
                }
            },
        };

        let record = DatasetRecord {
            fen: candidate.position.into_fen(),
            label,
        };
        if self.writer.write(&record)? {
            self.admitted += 1;
        }

        Ok(())
    }

    /// Evaluate and classify a screened candidate. `None` means it was
    /// rejected or could not be scored.
    fn score(&mut self, candidate: &Candidate) -> Result<Option<(i32, Option<String>)>, PipelineError> {
        let verdict = match self.config.scoring {
            ScoringMode::Prior => {
                let Some(score) = candidate.prior else {
                    self.rejections.missing_prior += 1;
                    return Ok(None);
                };
                let sample = EvaluationSample {
                    position: candidate.position.clone(),
                    score,
                    source: EvalSource::Corpus,
                };
                self.classifier.admit_single(&sample).map(|cp| (cp, None))
            }
            ScoringMode::Single => {
                let Some(result) = self.analyze(&candidate.position)? else {
                    return Ok(None);
                };
                match result.scores.first() {
                    Some(&score) => {
                        let sample = EvaluationSample {
                            position: result.position,
                            score,
                            source: EvalSource::Engine,
                        };
                        self.classifier
                            .admit_single(&sample)
                            .map(|cp| (cp, result.best_move))
                    }
                    None => Err(Rejection::InsufficientLines { got: 0, want: 1 }),
                }
            }
            ScoringMode::MultiPv => {
                let Some(result) = self.analyze(&candidate.position)? else {
                    return Ok(None);
                };
                self.classifier
                    .admit_multipv(&result)
                    .map(|cp| (cp, result.best_move))
            }
        };

        match verdict {
            Ok(scored) => Ok(Some(scored)),
            Err(rejection) => {
                self.reject(candidate, rejection);
                Ok(None)
            }
        }
    }

    fn analyze(&mut self, position: &Position) -> Result<Option<MultiPvResult>, PipelineError> {
        let (Some(analyzer), Some(limit)) = (self.analyzer.as_mut(), self.config.limit) else {
            return Err(PipelineError::Config("engine scoring without an engine".to_string()));
        };

        match analyzer.analyze(position, limit, self.config.variation_count()) {
            Ok(result) => Ok(Some(result)),
            Err(e) if e.is_fatal() => Err(e.into()),
            Err(e) => {
                warn!("Skipping position: {}", e);
                self.rejections.engine_failure += 1;
                Ok(None)
            }
        }
    }

    fn reject(&mut self, candidate: &Candidate, rejection: Rejection) {
        debug!(
            "Rejected {} (record {}): {}",
            candidate.position, candidate.origin, rejection
        );
        self.rejections.record(&rejection);
    }

    fn summary(&self, read: ReadStats) -> RunSummary {
        let sampled = self.sampler.stats();

        let mut rejections = self.rejections;
        rejections.invalid_fen += sampled.invalid_fen;
        rejections.duplicate += sampled.duplicates;
        rejections.undecided_game += sampled.undecided_games;
        rejections.too_few_pieces += sampled.too_few_pieces;

        RunSummary {
            scanned: read.records_read,
            malformed: read.skipped,
            candidates: self.candidates,
            admitted: self.admitted,
            rejections,
            stop_reason: None,
        }
    }
}

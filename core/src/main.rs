mod args;
mod progress;

use args::Args;
use clap::Parser;
use corpus::{open_corpus, Sampler};
use dataset::{Analyzer, DatasetWriter, Pipeline, RunSummary, StopReason, UciAnalyzer};
use log::LevelFilter;
use progress::RunProgress;
use simplelog::{Config, SimpleLogger, WriteLogger};
use std::{
    error::Error,
    fs::File,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

fn main() -> Result<(), Box<dyn Error>> {
    let args = init()?;

    // Set up SIGINT handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_handler = Arc::clone(&stop_flag);

    ctrlc::set_handler(move || {
        log::info!("Received SIGINT, finishing the current position...");
        stop_flag_handler.store(true, Ordering::Relaxed);
    })?;

    let config = args.pipeline_config();
    config.validate()?;

    let mut reader = open_corpus(&args.input, &args.reader_config())?;

    let mut engine = if config.scoring.uses_engine() {
        let settings = args
            .engine_settings()
            .ok_or("--engine is required for engine scoring")?;
        Some(UciAnalyzer::start(settings)?)
    } else {
        None
    };

    let output = args.output_path();
    log::info!("Writing dataset to {:?}", output);
    let writer = DatasetWriter::create(&output, args.output_format(), args.max_records)?;

    let pipeline = Pipeline::new(
        config,
        Sampler::new(args.sampler_config(), args.seed),
        engine.as_mut().map(|engine| engine as &mut dyn Analyzer),
        writer,
        stop_flag,
    )?;

    let progress = RunProgress::new(!args.no_progress && args.log_file.is_none())?;
    let result = pipeline.run(reader.as_mut(), |summary| progress.update(summary));
    progress.finish();

    let (summary, _) = result?;
    report(&summary);

    Ok(())
}

fn init() -> Result<Args, Box<dyn Error>> {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    match &args.log_file {
        Some(log_file) => WriteLogger::init(LevelFilter::Debug, Config::default(), File::create(log_file)?)?,
        None => SimpleLogger::init(level, Config::default())?,
    }

    Ok(args)
}

fn report(summary: &RunSummary) {
    let rejected = &summary.rejections;

    log::info!(
        "Done ({:?}): scanned {}, malformed {}, candidates {}, admitted {}",
        summary.stop_reason.unwrap_or(StopReason::Exhausted),
        summary.scanned,
        summary.malformed,
        summary.candidates,
        summary.admitted
    );
    log::info!("Rejected {}:", rejected.total());
    for (reason, count) in [
        ("invalid FEN", rejected.invalid_fen),
        ("duplicate", rejected.duplicate),
        ("undecided game", rejected.undecided_game),
        ("too few pieces", rejected.too_few_pieces),
        ("in check", rejected.in_check),
        ("extreme score", rejected.extreme_score),
        ("spread too wide", rejected.spread_too_wide),
        ("insufficient lines", rejected.insufficient_lines),
        ("engine failure", rejected.engine_failure),
        ("missing prior", rejected.missing_prior),
        ("missing move", rejected.missing_move),
    ] {
        if count > 0 {
            log::info!("- {}: {}", reason, count);
        }
    }
}

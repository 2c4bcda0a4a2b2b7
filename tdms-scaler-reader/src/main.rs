mod parameters;

use anyhow::{Context, Result};
use clap::Parser;
use parameters::{Cli, InfoParameters, KickerParameters, Mode, RateParameters};
use scaler_common::{
    init_tracer,
    tracer::{TracerEngine, TracerOptions},
};
use scaler_tdms::TdmsFile;
use std::process::ExitCode;
use tdms_scaler_reader::{
    batch::{BatchSummary, expand_inputs, run_batch},
    info::log_tdms_info,
    output::{Extraction, output_path, write_events, write_rate},
    source::{read_kicker_times, read_scaler_rate},
};
use tracing::{debug, info, warn};

fn log_summary(summary: &BatchSummary) {
    info!(
        "Processed {} files ({} skipped), {} samples",
        summary.processed, summary.skipped, summary.samples
    );
}

fn run_rate(parameters: RateParameters) -> Result<()> {
    let files = expand_inputs(&parameters.files);
    let (series, summary) = run_batch(&files, parameters.parallel, |path| {
        read_scaler_rate(path, parameters.channel, parameters.block_size)
    });
    log_summary(&summary);

    let path = output_path(&parameters.outdir, &parameters.outfilename);
    let extraction = Extraction::Rate {
        channel: parameters.channel,
        block_size: parameters.block_size,
    };
    write_rate(&path, &series, &files, &extraction)
        .with_context(|| format!("Cannot write {}", path.display()))
}

fn run_kicker(parameters: KickerParameters) -> Result<()> {
    let files = expand_inputs(&parameters.files);
    let (events, summary) = run_batch(&files, parameters.parallel, |path| {
        read_kicker_times(path, parameters.sample_rate)
    });
    log_summary(&summary);

    let path = output_path(&parameters.outdir, &parameters.outfilename);
    let extraction = Extraction::Kicker {
        sample_rate_hz: parameters.sample_rate,
    };
    write_events(&path, &events, &files, &extraction)
        .with_context(|| format!("Cannot write {}", path.display()))
}

fn run_info(parameters: InfoParameters) -> Result<()> {
    let mut file = TdmsFile::open(&parameters.file)
        .with_context(|| format!("Cannot open {}", parameters.file.display()))?;
    log_tdms_info(&mut file)?;
    Ok(())
}

fn run(mode: Mode) -> Result<()> {
    match mode {
        Mode::Rate(parameters) => run_rate(parameters),
        Mode::Kicker(parameters) => run_kicker(parameters),
        Mode::Info(parameters) => run_info(parameters),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Cli::parse();

    if let Some(directory) = args.mode.output_directory() {
        std::fs::create_dir_all(directory)
            .with_context(|| format!("Cannot create {}", directory.display()))?;
    }
    let tracer: TracerEngine = init_tracer!(TracerOptions {
        log_directory: args.mode.output_directory(),
    });
    if let Some(log_file) = tracer.log_file() {
        debug!("Logging to {}", log_file.display());
    }
    debug!("{args:?}");

    // The extraction is blocking, so runs on its own thread while this one waits for Ctrl-C.
    let job = tokio::task::spawn_blocking(move || run(args.mode));
    tokio::select! {
        result = job => {
            result??;
            Ok(ExitCode::SUCCESS)
        }
        Ok(()) = tokio::signal::ctrl_c() => {
            warn!("User cancelled. Aborting...");
            // Returning would wait for the blocking job to finish.
            std::process::exit(1)
        }
    }
}

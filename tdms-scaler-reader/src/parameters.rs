use clap::{Args, Parser, Subcommand};
use scaler_common::{ChannelIndex, DEFAULT_COUNTER_CHANNEL};
use std::path::{Path, PathBuf};
use tdms_scaler_reader::{DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE_HZ};

#[derive(Debug, Parser)]
#[clap(author, version, about)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) mode: Mode,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct RateParameters {
    /// TDMS files to read, or glob patterns matching them.
    #[clap(required = true)]
    pub(crate) files: Vec<String>,

    /// Directory in which to write the results and the log file.
    #[clap(short, long, env = "SCALER_OUTDIR", default_value = ".")]
    pub(crate) outdir: PathBuf,

    /// Name of the results file, without extension.
    #[clap(short = 'n', long, env = "SCALER_OUTFILENAME", default_value = "results")]
    pub(crate) outfilename: String,

    /// Index of the counter channel in the SCData group.
    #[clap(short, long, default_value_t = DEFAULT_COUNTER_CHANNEL)]
    pub(crate) channel: ChannelIndex,

    /// Counter samples per timestamp.
    #[clap(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    pub(crate) block_size: usize,

    /// Process files concurrently.
    #[clap(long)]
    pub(crate) parallel: bool,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct KickerParameters {
    /// TDMS files to read, or glob patterns matching them.
    #[clap(required = true)]
    pub(crate) files: Vec<String>,

    /// Directory in which to write the results and the log file.
    #[clap(short, long, env = "SCALER_OUTDIR", default_value = ".")]
    pub(crate) outdir: PathBuf,

    /// Name of the results file, without extension.
    #[clap(short = 'n', long, default_value = "kicker")]
    pub(crate) outfilename: String,

    /// Samples per second of the kicker channel.
    #[clap(long, default_value_t = DEFAULT_SAMPLE_RATE_HZ)]
    pub(crate) sample_rate: f64,

    /// Process files concurrently.
    #[clap(long)]
    pub(crate) parallel: bool,
}

#[derive(Debug, Clone, Args)]
pub(crate) struct InfoParameters {
    /// TDMS file to describe.
    pub(crate) file: PathBuf,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Mode {
    #[clap(about = "Converts a cumulative counter channel into count rates.")]
    Rate(RateParameters),
    #[clap(about = "Finds the times at which the kicker fired.")]
    Kicker(KickerParameters),
    #[clap(about = "Describes the groups and channels of a TDMS file.")]
    Info(InfoParameters),
}

impl Mode {
    /// The directory results are written to, if this mode writes any.
    pub(crate) fn output_directory(&self) -> Option<&Path> {
        match self {
            Mode::Rate(parameters) => Some(&parameters.outdir),
            Mode::Kicker(parameters) => Some(&parameters.outdir),
            Mode::Info(_) => None,
        }
    }
}

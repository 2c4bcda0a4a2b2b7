use std::{
    fs::{File, OpenOptions},
    io,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt, layer::SubscriberExt,
};

pub struct TracerOptions<'a> {
    /// Directory in which to write `<binary name>.log`, or `None` to log to stdout only.
    pub log_directory: Option<&'a Path>,
}

/// This object initialises all tracers, given a TracerOptions struct.
/// If TracerOptions names a log directory then a plain-text file tracer
/// recording everything at `debug` and above is installed alongside stdout.
pub struct TracerEngine {
    log_file: Option<PathBuf>,
    log_file_error: Option<io::Error>,
}

impl TracerEngine {
    /// Initialises the stdout tracer, and (if required) the log file tracer for the binary
    /// #Arguments
    /// * `options` - The caller-specified instance of TracerOptions.
    /// * `service_name` - The name of the binary, used to name the log file.
    /// #Returns
    /// An instance of TracerEngine
    pub fn new(options: TracerOptions, service_name: &str) -> Self {
        let stdout_tracer = fmt::layer().with_writer(std::io::stdout);

        // This filter is applied to the stdout tracer
        let log_filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env_lossy();

        let log_file = options
            .log_directory
            .map(|directory| log_file_path(directory, service_name));

        let (file, log_file_error) = match log_file.as_deref().map(open_log_file) {
            Some(Ok(file)) => (Some(file), None),
            Some(Err(e)) => (None, Some(e)),
            None => (None, None),
        };

        let file_tracer = file.map(|file| {
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_filter(LevelFilter::DEBUG)
        });

        let subscriber = tracing_subscriber::Registry::default()
            .with(stdout_tracer.with_filter(log_filter))
            .with(file_tracer);

        //  This is only called once, so will never panic
        tracing::subscriber::set_global_default(subscriber)
            .expect("tracing::subscriber::set_global_default should only be called once");

        Self {
            log_file: log_file.filter(|_| log_file_error.is_none()),
            log_file_error,
        }
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    pub fn get_log_file_error(&self) -> Option<&io::Error> {
        self.log_file_error.as_ref()
    }
}

fn log_file_path(directory: &Path, service_name: &str) -> PathBuf {
    directory.join(format!("{service_name}.log"))
}

fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

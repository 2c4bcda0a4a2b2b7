mod tracer_engine;

pub use tracer_engine::{TracerEngine, TracerOptions};

/// Should be called at the start of each binary.
/// The log file, if one is requested, is named after the calling binary.
/// Failure to create the log file is not fatal: it is reported through the
/// stdout tracer once that is installed.
#[macro_export]
macro_rules! init_tracer {
    ($options:expr) => {{
        let tracer = $crate::tracer::TracerEngine::new($options, env!("CARGO_BIN_NAME"));
        // This is called here (in the macro) rather than as part of `TracerEngine::new`
        // to ensure the warning is emitted in the correct module.
        if let Some(e) = tracer.get_log_file_error() {
            ::tracing::warn!("Cannot write log file: {e}");
        }
        tracer
    }};
}

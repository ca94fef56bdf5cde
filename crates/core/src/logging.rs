use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs the global subscriber: a daily rolling `<component>.<date>` file in
/// `log_dir` plus an optional stderr layer.
///
/// When `log_dir` cannot be created or written, file output is discarded and
/// stderr logging is forced on instead, so indexing never fails over logs.
/// The returned guard must be held for the lifetime of the process.
pub fn init_logging(component: &str, log_dir: &Path, to_stderr: bool) -> WorkerGuard {
    let appender = std::fs::create_dir_all(log_dir)
        .map_err(|e| e.to_string())
        .and_then(|_| {
            RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(component)
                .build(log_dir)
                .map_err(|e| e.to_string())
        });
    let (non_blocking, guard, to_stderr) = match appender {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (writer, guard, to_stderr)
        }
        Err(e) => {
            eprintln!("defscope: cannot log to {}: {}", log_dir.display(), e);
            let (writer, guard) = tracing_appender::non_blocking(std::io::sink());
            (writer, guard, true)
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    let stderr_layer = to_stderr.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    guard
}

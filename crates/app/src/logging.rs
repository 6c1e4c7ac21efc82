use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Keeps the file writer flushing; hold it until exit.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

fn log_dir() -> Option<String> {
    std::env::var("QUIZ_LOG_DIR")
        .ok()
        .filter(|dir| !dir.trim().is_empty())
}

/// Install the global subscriber. Console output goes to stderr so it does not mix
/// with the quiz on stdout; `QUIZ_LOG_DIR` adds a daily-rolling file.
pub fn init_tracing(filter: &str) -> Option<FileLogGuard> {
    let env_filter =
        EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    if let Some(dir) = log_dir() {
        if let Err(err) = std::fs::create_dir_all(&dir) {
            eprintln!("failed to create log directory {dir}: {err}");
        } else {
            let file_appender = RollingFileAppender::new(Rotation::DAILY, &dir, "quiz.log");
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(true);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .with(file_layer)
                .init();

            return Some(FileLogGuard { _guard: guard });
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();

    None
}

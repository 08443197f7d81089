use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::http_cache::app_cache_dir;

const DEFAULT_FILTER: &str = "info,nba_sgp=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("SGP_LOG").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// The TUI owns the terminal, so logs go to a daily file under the cache dir.
/// Keep the guard alive for the life of the process.
pub fn init_file_logging() -> Option<WorkerGuard> {
    let dir = app_cache_dir()?.join("logs");
    std::fs::create_dir_all(&dir).ok()?;
    let appender = tracing_appender::rolling::daily(dir, "nba_sgp.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .ok()?;
    Some(guard)
}

pub fn init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

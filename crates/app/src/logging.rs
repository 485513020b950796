use std::path::Path;

use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

pub const LOG_FILE_PREFIX: &str = "ndn-share.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber and the panic hook.
///
/// Logs go to stderr so command output on stdout stays clean. When
/// `log_dir` is set a daily rolling file is written there as well.
/// Dropping the returned guards flushes the background writers.
pub fn init_logging(level: LevelFilter, log_dir: Option<&Path>) -> Vec<WorkerGuard> {
    let mut guards = Vec::new();
    let mut layers: Vec<BoxedLayer> = Vec::new();

    let (stderr, guard) = tracing_appender::non_blocking(std::io::stderr());
    guards.push(guard);
    layers.push(
        fmt::layer()
            .compact()
            .with_writer(stderr)
            .with_filter(env_filter(level))
            .boxed(),
    );

    if let Some(dir) = log_dir {
        match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let (file, guard) =
                    tracing_appender::non_blocking(rolling::daily(dir, LOG_FILE_PREFIX));
                guards.push(guard);
                layers.push(
                    fmt::layer()
                        .with_ansi(false)
                        .with_writer(file)
                        .with_filter(env_filter(level))
                        .boxed(),
                );
            }
            Err(e) => eprintln!("not logging to {}: {}", dir.display(), e),
        }
    }

    tracing_subscriber::registry().with(layers).init();

    register_panic_logger();
    crate::version::report_build_info();

    guards
}

/// `RUST_LOG` wins over the configured level
fn env_filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy()
}

/// Route panics through tracing so they land in the log file too
pub fn register_panic_logger() {
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());
        tracing::error!(%location, "panic: {}", info);
    }));
}

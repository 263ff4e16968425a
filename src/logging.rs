use std::path::Path;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Initialize tracing with a stdout layer and a per-run log file.
///
/// Each process writes `<log_dir>/<YYYYmmdd_HHMMSS>_pipeline.log`. If the
/// directory cannot be created, logs go to stdout only. `RUST_LOG` overrides
/// the default `info` filter.
pub fn init_tracing(log_dir: &Path) {
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let stdout_layer = fmt::layer().with_target(false);

  let file_layer = match std::fs::create_dir_all(log_dir) {
    Ok(()) => {
      let file_name = format!("{}_pipeline.log", chrono::Local::now().format("%Y%m%d_%H%M%S"));
      let appender = tracing_appender::rolling::never(log_dir, file_name);
      let (writer, guard) = tracing_appender::non_blocking(appender);
      let _ = LOG_GUARD.set(guard);
      Some(fmt::layer().with_ansi(false).with_writer(writer).boxed())
    }
    Err(err) => {
      eprintln!(
        "failed to create log directory {}: {}; logging to stdout only",
        log_dir.display(),
        err
      );
      None
    }
  };

  let _ = tracing_subscriber::registry()
    .with(env_filter)
    .with(stdout_layer)
    .with(file_layer)
    .try_init();
}

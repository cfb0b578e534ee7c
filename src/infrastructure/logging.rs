use std::fs;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::domain::DomainError;

/// Default logs directory for hosts that do not supply one.
pub fn default_logs_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("roundbell")
        .join("logs")
}

/// A reasonable library filter: this crate at `level`, everything else at
/// warn. Hosts that want `RUST_LOG` control pass
/// `EnvFilter::from_default_env()` to [`init_logging`] instead.
pub fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("roundbell={},warn", level))
}

/// Install a subscriber for hosts that do not bring their own: a console
/// layer under the given filter, plus a daily-rolling json file layer when
/// `logs_dir` is set.
///
/// Embedding applications that already installed a subscriber keep theirs;
/// installation failure is silent and the file guard is still returned.
/// The guard must outlive the host, dropping it flushes pending file logs.
pub fn init_logging(
    filter: EnvFilter,
    logs_dir: Option<&Path>,
) -> Result<Option<WorkerGuard>, DomainError> {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let (file_layer, guard) = match logs_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "roundbell.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .json();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // Option<Layer> composes as a no-op layer when absent.
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(logs_dir = ?logs_dir, "Logging initialized");
    }

    Ok(guard)
}

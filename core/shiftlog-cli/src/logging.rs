//! Structured logging for the shiftlog CLI using tracing.
//!
//! Events go to `{data_root}/logs/shiftlog.{date}.log`, rotated daily with 7
//! files kept. When that directory is unusable they go to stderr instead and
//! only warnings are shown. `RUST_LOG` overrides either default.
//!
//! File output is written by a background worker; keep the returned guard
//! alive until the command has finished so buffered lines are flushed.

use std::path::Path;

use fs_err as fs;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const FILE_FILTER: &str = "shiftlog=info,shiftlog_core=info";
const STDERR_FILTER: &str = "warn";
const MAX_LOG_FILES: usize = 7;

pub fn init(logs_dir: &Path) -> Option<WorkerGuard> {
    let (file_writer, guard) = match open_log_file(logs_dir) {
        Some((writer, guard)) => (Some(writer), Some(guard)),
        None => (None, None),
    };
    let to_file = file_writer.is_some();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if to_file { FILE_FILTER } else { STDERR_FILTER })
    });
    let writer = match file_writer {
        Some(non_blocking) => BoxMakeWriter::new(non_blocking),
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_ansi(!to_file),
        )
        .try_init();
    guard
}

/// Non-blocking writer over the rolling log file, if the directory is usable.
fn open_log_file(logs_dir: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    fs::create_dir_all(logs_dir).ok()?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("shiftlog")
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(logs_dir)
        .ok()?;
    Some(tracing_appender::non_blocking(appender))
}

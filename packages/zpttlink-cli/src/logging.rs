//! Log sinks: stderr always, plus a best-effort size-rotated log file.

use rolling_file::{BasicRollingFileAppender, RollingConditionBasic};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Roll the log file over once it grows past this size.
const MAX_LOG_BYTES: u64 = 512 * 1024;
/// Number of rotated files kept (`.1`, `.2`).
const BACKUP_COUNT: usize = 2;

/// Map a config/CLI level name ("INFO", "warning", ...) onto a filter directive.
pub fn level_directive(level: &str) -> &'static str {
    match level.trim().to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" | "critical" => "error",
        _ => "info",
    }
}

/// Size-rotated log file shared by every event the file layer writes.
pub struct RotatingLog {
    appender: Mutex<BasicRollingFileAppender>,
}

impl RotatingLog {
    pub fn open(path: &Path, max_bytes: u64, backups: usize) -> io::Result<Self> {
        let condition = RollingConditionBasic::new().max_size(max_bytes);
        let appender = BasicRollingFileAppender::new(path, condition, backups)?;
        Ok(Self {
            appender: Mutex::new(appender),
        })
    }
}

/// Locked handle for one event. Flushed after every write.
pub struct RotatingLogWriter<'a> {
    appender: MutexGuard<'a, BasicRollingFileAppender>,
}

impl Write for RotatingLogWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.appender.write(buf)?;
        self.appender.flush()?;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.appender.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingLog {
    type Writer = RotatingLogWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingLogWriter {
            appender: self.appender.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `level` when set.
pub fn init(level: &str, log_file: &Path) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(level)));

    let (file_layer, file_error) = match RotatingLog::open(log_file, MAX_LOG_BYTES, BACKUP_COUNT) {
        Ok(log) => (
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(log),
            ),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(file_layer)
        .init();

    if let Some(e) = file_error {
        tracing::warn!(file = %log_file.display(), error = %e, "file logging disabled");
    }
}

//! Logging initialization: `YYYY-MM-DD HH:MM:SS LEVEL target: message key=value ...` lines on
//! stdout, optionally teed to a log file.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{
    fmt::format::Writer, fmt::time::FormatTime, fmt::writer::MakeWriterExt, layer::SubscriberExt,
    util::SubscriberInitExt, EnvFilter, Registry,
};

/// Local wall-clock timestamp for log lines.
struct LocalTimestamp;

impl FormatTime for LocalTimestamp {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{} ", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Installs the global tracing subscriber.
///
/// Level comes from `RUST_LOG` (default `info`); load `.env` before calling. With
/// `log_file` set, output goes to stdout and the file (created with its parent directory,
/// appended, no ANSI codes).
pub fn init_tracing(log_file: Option<&str>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let event_format = tracing_subscriber::fmt::format()
        .with_timer(LocalTimestamp)
        .with_level(true)
        .with_target(true);

    let registry = Registry::default().with(env_filter);

    match log_file {
        Some(path) => {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            let file = Arc::new(OpenOptions::new().create(true).append(true).open(path)?);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(io::stdout.and(file))
                .event_format(event_format)
                .with_ansi(false);
            registry.with(layer).try_init()
        }
        None => {
            let layer = tracing_subscriber::fmt::layer().event_format(event_format);
            registry.with(layer).try_init()
        }
    }
    .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))
}

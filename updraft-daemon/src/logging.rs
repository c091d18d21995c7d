//! Tracing setup and the durable log sink.
//!
//! Every event goes to stderr through the regular `fmt` layer and is also
//! appended to the sink file as one `[<RFC3339 timestamp>] <message>` line.
//! When the sink cannot be opened the line goes to stderr instead; logging
//! never fails a run.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber: `RUST_LOG` filter (default `info`), stderr
/// output, and the sink at `log_file`. A second call is a no-op.
pub fn init(log_file: &Path) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(io::stderr);
    let sink = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .event_format(SinkFormat)
        .with_writer(LogSink::new(log_file));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(sink)
        .try_init();
}

// ---------------------------------------------------------------------------
// Line format
// ---------------------------------------------------------------------------

/// `[2026-10-16T08:00:00Z] message key=value`, with `WARN`/`ERROR` prefixed
/// to the message.
#[derive(Debug, Clone, Copy, Default)]
pub struct SinkFormat;

impl<S, N> FormatEvent<S, N> for SinkFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "[{}] ",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        )?;
        match *event.metadata().level() {
            Level::ERROR => writer.write_str("ERROR ")?,
            Level::WARN => writer.write_str("WARN ")?,
            _ => {}
        }
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Appends to a file, creating its directory on first use.
#[derive(Debug, Clone)]
pub struct LogSink {
    path: PathBuf,
}

impl LogSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> io::Result<File> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        OpenOptions::new().create(true).append(true).open(&self.path)
    }
}

pub enum SinkWriter {
    File(File),
    Stderr(io::Stderr),
}

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            SinkWriter::File(file) => file.write(buf),
            SinkWriter::Stderr(stderr) => stderr.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            SinkWriter::File(file) => file.flush(),
            SinkWriter::Stderr(stderr) => stderr.flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = SinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        match self.open() {
            Ok(file) => SinkWriter::File(file),
            Err(_) => SinkWriter::Stderr(io::stderr()),
        }
    }
}

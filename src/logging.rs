//! Subscriber assembly for applog.
//!
//! Turns resolved [`LoggerOptions`] into a `tracing` dispatcher: a registry
//! with a single `fmt` layer (JSON or console), the configured timer and ANSI
//! setting, filtered by the options' runtime level.

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use tracing::Dispatch;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, Layer, Registry};

use crate::options::{Encoding, LevelStyle, LoggerOptions};

/// Cloneable destination for formatted entries.
#[derive(Clone)]
pub struct SharedWriter {
    inner: Arc<BoxMakeWriter>,
}

impl SharedWriter {
    /// Share `make_writer` between the formatter and [`SharedWriter::flush`].
    pub fn new<M>(make_writer: M) -> Self
    where
        M: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(BoxMakeWriter::new(make_writer)),
        }
    }

    /// Standard error.
    pub fn stderr() -> Self {
        Self::new(io::stderr)
    }

    /// Flush the underlying destination.
    pub fn flush(&self) -> io::Result<()> {
        (*self.inner).make_writer().flush()
    }
}

impl<'a> MakeWriter<'a> for SharedWriter {
    type Writer = <BoxMakeWriter as MakeWriter<'a>>::Writer;

    fn make_writer(&'a self) -> Self::Writer {
        (*self.inner).make_writer()
    }
}

impl fmt::Debug for SharedWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedWriter").finish_non_exhaustive()
    }
}

/// Build a dispatcher writing to `writer` as described by `options`.
///
/// JSON entries are flattened so event fields (`id`, `logger`, `severity`)
/// sit next to `message` at the top level.
pub fn build_dispatch(options: &LoggerOptions, writer: SharedWriter) -> Dispatch {
    let timer = ChronoLocal::new(options.time_format.pattern().to_string());

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match options.encoding {
        Encoding::Json => Box::new(
            tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .with_span_list(false)
                .with_target(false)
                .with_timer(timer)
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(options.level.clone()),
        ),
        Encoding::Console => Box::new(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_timer(timer)
                .with_ansi(options.level_style == LevelStyle::Colored)
                .with_writer(writer)
                .with_filter(options.level.clone()),
        ),
    };

    Dispatch::new(tracing_subscriber::registry().with(layer))
}

/// Captures formatted output in memory.
#[cfg(test)]
pub(crate) mod test_support {
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    use serde_json::Value;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Debug, Default)]
    pub(crate) struct TestWriter {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    impl TestWriter {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn output(&self) -> String {
            let buffer = self.buffer.lock().unwrap();
            String::from_utf8_lossy(&buffer).to_string()
        }

        /// Every non-empty output line parsed as JSON.
        pub(crate) fn json_lines(&self) -> Vec<Value> {
            self.output()
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    impl Write for TestWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.buffer
                .lock()
                .map_err(|_| io::Error::other("Mutex poisoned"))?
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for TestWriter {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::TestWriter;
    use super::*;
    use crate::level::Severity;
    use crate::options::{Preset, TimeFormat};

    fn json_options() -> LoggerOptions {
        let mut options = LoggerOptions::from_preset(Preset::PRODUCTION);
        options.time_format = TimeFormat::Iso8601;
        options
    }

    #[test]
    fn test_json_output_is_flattened() {
        let writer = TestWriter::new();
        let dispatch = build_dispatch(&json_options(), SharedWriter::new(writer.clone()));

        tracing::dispatcher::with_default(&dispatch, || {
            tracing::info!(id = "svc", "hello");
        });

        let lines = writer.json_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["message"], "hello");
        assert_eq!(lines[0]["id"], "svc");
        assert_eq!(lines[0]["level"], "INFO");
        assert!(lines[0].get("target").is_none());
    }

    #[test]
    fn test_iso8601_timestamp() {
        let writer = TestWriter::new();
        let dispatch = build_dispatch(&json_options(), SharedWriter::new(writer.clone()));

        tracing::dispatcher::with_default(&dispatch, || tracing::warn!("ts"));

        let lines = writer.json_lines();
        let timestamp = lines[0]["timestamp"].as_str().unwrap();
        // 2024-05-01T13:04:05.000+0200
        assert_eq!(timestamp.len(), 28, "{timestamp}");
        assert_eq!(&timestamp[10..11], "T");
        assert_eq!(&timestamp[19..20], ".");
    }

    #[test]
    fn test_epoch_timestamp() {
        let writer = TestWriter::new();
        let options = LoggerOptions::from_preset(Preset::PRODUCTION);
        let dispatch = build_dispatch(&options, SharedWriter::new(writer.clone()));

        tracing::dispatcher::with_default(&dispatch, || tracing::info!("epoch"));

        let lines = writer.json_lines();
        let seconds: f64 = lines[0]["timestamp"].as_str().unwrap().parse().unwrap();
        assert!(seconds > 1_000_000_000.0);
    }

    #[test]
    fn test_runtime_level_filters_plain_tracing_events() {
        let writer = TestWriter::new();
        let options = json_options();
        let dispatch = build_dispatch(&options, SharedWriter::new(writer.clone()));

        tracing::dispatcher::with_default(&dispatch, || {
            tracing::debug!("hidden");
            options.level.set_level(Severity::Debug);
            tracing::debug!("shown");
            options.level.set_level(Severity::Error);
            tracing::warn!("hidden again");
            tracing::error!("failure");
        });

        let messages: Vec<String> = writer
            .json_lines()
            .iter()
            .map(|line| line["message"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(messages, vec!["shown", "failure"]);
    }

    #[test]
    fn test_console_color_toggle() {
        let mut options = LoggerOptions::from_preset(Preset::DEVELOPMENT);

        let plain = TestWriter::new();
        let dispatch = build_dispatch(&options, SharedWriter::new(plain.clone()));
        tracing::dispatcher::with_default(&dispatch, || tracing::info!("plain"));
        assert!(plain.output().contains("plain"));
        assert!(!plain.output().contains('\u{1b}'));

        options.level_style = LevelStyle::Colored;
        let colored = TestWriter::new();
        let dispatch = build_dispatch(&options, SharedWriter::new(colored.clone()));
        tracing::dispatcher::with_default(&dispatch, || tracing::info!("colored"));
        assert!(colored.output().contains("\u{1b}["));
    }

    #[test]
    fn test_shared_writer_flush() {
        let writer = SharedWriter::new(TestWriter::new());
        assert!(writer.flush().is_ok());
        assert!(SharedWriter::stderr().flush().is_ok());
    }
}

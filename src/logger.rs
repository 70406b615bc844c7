//! Logger handles.
//!
//! Application code receives loggers explicitly, as a concrete
//! [`TracedLogger`] or behind `Arc<dyn Logger>`, instead of reaching for
//! ambient globals.
//!
//! - [`BaseLogger`]: writes entries through a `tracing` dispatcher, gated by
//!   a runtime [`AtomicLevel`], tagged with a dotted name and the app id.
//! - [`TracedLogger`]: a `BaseLogger` that emits entries at or above a fixed
//!   severity inside the active span, so they become part of the trace.
//!
//! ```
//! use applog::logger::{Logger, TracedLogger};
//! use applog::{log_debug, log_info};
//! use std::sync::Arc;
//!
//! struct Worker {
//!     logger: Arc<dyn Logger>,
//! }
//!
//! impl Worker {
//!     fn run(&self) {
//!         log_info!(self.logger, "starting {} jobs", 3);
//!         log_debug!(self.logger, "done");
//!     }
//! }
//!
//! let worker = Worker { logger: Arc::new(TracedLogger::noop()) };
//! worker.run();
//! ```

use std::fmt::Arguments;
use std::sync::Arc;

use tracing::subscriber::NoSubscriber;
use tracing::{Dispatch, Level, Span};

use crate::level::{AtomicLevel, Severity};
use crate::logging::SharedWriter;

/// Logging interface for application components.
///
/// Implementations must be `Send + Sync` so handles can be shared across
/// threads.
pub trait Logger: Send + Sync {
    /// Log a message at `severity`.
    ///
    /// `Panic` panics and `Fatal` exits the process once the entry has been
    /// handled, whether or not the entry passed the level threshold.
    fn log(&self, severity: Severity, args: Arguments<'_>);

    /// Whether an entry at `severity` would be written.
    fn enabled(&self, severity: Severity) -> bool;

    /// Flush buffered output, ignoring failures.
    fn sync(&self) {}

    fn debug(&self, args: Arguments<'_>) {
        self.log(Severity::Debug, args);
    }

    fn info(&self, args: Arguments<'_>) {
        self.log(Severity::Info, args);
    }

    fn warn(&self, args: Arguments<'_>) {
        self.log(Severity::Warn, args);
    }

    fn error(&self, args: Arguments<'_>) {
        self.log(Severity::Error, args);
    }

    /// Error in production, panic in development.
    fn dpanic(&self, args: Arguments<'_>) {
        self.log(Severity::DPanic, args);
    }

    fn panic(&self, args: Arguments<'_>) {
        self.log(Severity::Panic, args);
    }

    fn fatal(&self, args: Arguments<'_>) {
        self.log(Severity::Fatal, args);
    }
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {
        $logger.error(format_args!($($arg)*))
    };
}

/// Where an entry sits relative to the active span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Child of the dispatcher's current span.
    InSpan,
    /// Detached from any span.
    Root,
}

/// Structured logger writing through a `tracing` dispatcher.
#[derive(Debug, Clone)]
pub struct BaseLogger {
    dispatch: Dispatch,
    level: AtomicLevel,
    name: Option<String>,
    app_id: Option<Arc<str>>,
    development: bool,
    sink: Option<SharedWriter>,
}

impl BaseLogger {
    /// Unnamed logger writing through `dispatch`, gated by `level`.
    pub fn new(dispatch: Dispatch, level: AtomicLevel) -> Self {
        Self {
            dispatch,
            level,
            name: None,
            app_id: None,
            development: false,
            sink: None,
        }
    }

    /// A logger that discards everything.
    pub fn noop() -> Self {
        Self::new(Dispatch::none(), AtomicLevel::new(Severity::Info))
    }

    /// Tag every entry with `id = app_id`. Empty ids are not attached.
    pub fn with_app_id(mut self, app_id: &str) -> Self {
        self.app_id = (!app_id.is_empty()).then(|| Arc::from(app_id));
        self
    }

    /// Make `dpanic` entries panic.
    pub fn with_development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    /// Destination flushed by [`Logger::sync`].
    pub fn with_sink(mut self, sink: SharedWriter) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Child logger whose name is this logger's name joined with `name` by a dot.
    pub fn named(&self, name: &str) -> Self {
        let mut child = self.clone();
        if !name.is_empty() {
            child.name = Some(match &self.name {
                Some(parent) => format!("{parent}.{name}"),
                None => name.to_string(),
            });
        }
        child
    }

    /// Dotted logger name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Value of the `id` field, if any.
    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }

    /// Threshold shared with every logger built from the same options.
    pub fn level(&self) -> &AtomicLevel {
        &self.level
    }

    /// Dispatcher entries are written through.
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    fn write(&self, severity: Severity, args: Arguments<'_>, placement: Placement) {
        if self.level.enabled(severity) {
            self.emit(severity, args, placement);
        }

        match severity {
            Severity::Panic => panic!("{args}"),
            Severity::DPanic if self.development => panic!("{args}"),
            Severity::Fatal => {
                self.sync();
                std::process::exit(1);
            }
            _ => {}
        }
    }

    /// Write the entry through this logger's dispatcher.
    ///
    /// An in-span entry made while the caller's active span belongs to
    /// another dispatcher is also emitted there, as a child of that span, and
    /// the local entry records the span's name in `span`.
    fn emit(&self, severity: Severity, args: Arguments<'_>, placement: Placement) {
        if self.dispatch.is::<NoSubscriber>() {
            return;
        }

        let logger = self.name.as_deref();
        let id = self.app_id.as_deref();
        let name = severity.as_str();

        let caller_span = match placement {
            Placement::InSpan => Span::current(),
            Placement::Root => Span::none(),
        };
        let forward = !caller_span.is_none() && !self.dispatch.current_span().is_known();
        let span_name = if forward {
            caller_span.metadata().map(|meta| meta.name())
        } else {
            None
        };

        macro_rules! entry {
            ($level:expr, $span:expr) => {
                match placement {
                    Placement::InSpan => tracing::event!(
                        $level,
                        logger = logger,
                        id = id,
                        severity = name,
                        span = $span,
                        "{}",
                        args
                    ),
                    Placement::Root => tracing::event!(
                        parent: None::<tracing::span::Id>,
                        $level,
                        logger = logger,
                        id = id,
                        severity = name,
                        span = $span,
                        "{}",
                        args
                    ),
                }
            };
        }

        macro_rules! entry_at_severity {
            ($span:expr) => {
                match severity {
                    Severity::Debug => entry!(Level::DEBUG, $span),
                    Severity::Info => entry!(Level::INFO, $span),
                    Severity::Warn => entry!(Level::WARN, $span),
                    Severity::Error | Severity::DPanic | Severity::Panic | Severity::Fatal => {
                        entry!(Level::ERROR, $span)
                    }
                }
            };
        }

        tracing::dispatcher::with_default(&self.dispatch, || entry_at_severity!(span_name));

        if forward {
            // Still under the caller's dispatcher: the active span is the parent.
            entry_at_severity!(None::<&str>);
        }
    }
}

impl Logger for BaseLogger {
    fn log(&self, severity: Severity, args: Arguments<'_>) {
        self.write(severity, args, Placement::Root);
    }

    fn enabled(&self, severity: Severity) -> bool {
        self.level.enabled(severity)
    }

    fn sync(&self) {
        if let Some(sink) = &self.sink {
            let _ = sink.flush();
        }
    }
}

/// A [`BaseLogger`] that attaches entries at or above `trace_level` to the
/// active span.
#[derive(Debug, Clone)]
pub struct TracedLogger {
    inner: BaseLogger,
    trace_level: Severity,
}

impl TracedLogger {
    /// Wrap `inner`, forwarding entries at or above `trace_level`.
    pub fn new(inner: BaseLogger, trace_level: Severity) -> Self {
        Self { inner, trace_level }
    }

    /// A traced logger that discards everything.
    pub fn noop() -> Self {
        Self::new(BaseLogger::noop(), Severity::Info)
    }

    /// See [`BaseLogger::named`].
    pub fn named(&self, name: &str) -> Self {
        Self::new(self.inner.named(name), self.trace_level)
    }

    /// Minimum severity attached to the active span.
    pub fn trace_level(&self) -> Severity {
        self.trace_level
    }

    /// The wrapped logger.
    pub fn base(&self) -> &BaseLogger {
        &self.inner
    }
}

impl Logger for TracedLogger {
    fn log(&self, severity: Severity, args: Arguments<'_>) {
        let placement = if severity >= self.trace_level {
            Placement::InSpan
        } else {
            Placement::Root
        };
        self.inner.write(severity, args, placement);
    }

    fn enabled(&self, severity: Severity) -> bool {
        self.inner.enabled(severity)
    }

    fn sync(&self) {
        self.inner.sync();
    }
}

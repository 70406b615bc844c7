//! Severities and the shared, runtime-adjustable minimum level.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI8, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::subscriber::Interest;
use tracing::{Level, Metadata};
use tracing_subscriber::layer::{Context, Filter};

/// Ordered log severity.
///
/// `DPanic`, `Panic` and `Fatal` rank above `Error` and carry terminal
/// behaviour in [`BaseLogger`](crate::logger::BaseLogger). All four render
/// as `tracing::Level::ERROR`; the exact severity travels in the `severity`
/// field of each event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(i8)]
pub enum Severity {
    Debug = -1,
    Info = 0,
    Warn = 1,
    Error = 2,
    DPanic = 3,
    Panic = 4,
    Fatal = 5,
}

impl Severity {
    /// All severities, lowest first.
    pub const ALL: [Severity; 7] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::DPanic,
        Severity::Panic,
        Severity::Fatal,
    ];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::DPanic => "dpanic",
            Severity::Panic => "panic",
            Severity::Fatal => "fatal",
        }
    }

    /// The `tracing` level this severity is emitted at.
    pub fn tracing_level(&self) -> Level {
        match self {
            Severity::Debug => Level::DEBUG,
            Severity::Info => Level::INFO,
            Severity::Warn => Level::WARN,
            Severity::Error | Severity::DPanic | Severity::Panic | Severity::Fatal => Level::ERROR,
        }
    }

    /// Best match for an event that did not carry a `severity` field.
    pub fn from_tracing_level(level: &Level) -> Self {
        if *level == Level::ERROR {
            Severity::Error
        } else if *level == Level::WARN {
            Severity::Warn
        } else if *level == Level::INFO {
            Severity::Info
        } else {
            Severity::Debug
        }
    }

    fn from_i8(raw: i8) -> Self {
        match raw {
            i8::MIN..=-1 => Severity::Debug,
            0 => Severity::Info,
            1 => Severity::Warn,
            2 => Severity::Error,
            3 => Severity::DPanic,
            4 => Severity::Panic,
            _ => Severity::Fatal,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known severity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized level: {0:?}")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|severity| {
                let name = severity.as_str();
                s == name || s == name.to_ascii_uppercase()
            })
            .ok_or_else(|| ParseSeverityError(s.to_string()))
    }
}

/// A minimum severity that can be changed while loggers are running.
///
/// Clones share the same threshold, so a logger built from one clone sees
/// changes made through any other. The value is read on every emission.
#[derive(Clone)]
pub struct AtomicLevel {
    inner: Arc<AtomicI8>,
}

impl AtomicLevel {
    /// Threshold starting at `severity`.
    pub fn new(severity: Severity) -> Self {
        Self {
            inner: Arc::new(AtomicI8::new(severity as i8)),
        }
    }

    /// Current threshold.
    pub fn level(&self) -> Severity {
        Severity::from_i8(self.inner.load(Ordering::Acquire))
    }

    /// Replace the threshold for every holder of this level.
    pub fn set_level(&self, severity: Severity) {
        self.inner.store(severity as i8, Ordering::Release);
    }

    /// Whether an entry at `severity` passes the threshold.
    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.level()
    }

    /// Whether two handles share the same threshold.
    pub fn shares_with(&self, other: &AtomicLevel) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for AtomicLevel {
    fn default() -> Self {
        Self::new(Severity::Info)
    }
}

impl fmt::Debug for AtomicLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AtomicLevel").field(&self.level()).finish()
    }
}

// Used as a per-layer filter so plain `tracing` macros routed through the
// same dispatcher honour the runtime threshold too.
impl<S> Filter<S> for AtomicLevel {
    fn enabled(&self, meta: &Metadata<'_>, _cx: &Context<'_, S>) -> bool {
        meta.level() <= &self.level().tracing_level()
    }

    fn callsite_enabled(&self, _meta: &'static Metadata<'static>) -> Interest {
        // The threshold can move at any time, so nothing may be cached.
        Interest::sometimes()
    }
}

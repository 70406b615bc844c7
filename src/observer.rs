//! In-memory logger for assertions in tests.
//!
//! Entries are collected by a `tracing_subscriber` layer instead of being
//! formatted, and can be queried through [`ObservedLogs`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::{Dispatch, Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::level::{AtomicLevel, Severity};
use crate::logger::{BaseLogger, TracedLogger};

/// A collected log entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservedEntry {
    pub time: DateTime<Utc>,
    pub severity: Severity,
    pub message: String,
    pub logger_name: Option<String>,
    /// Name of the span the entry was emitted in, if any.
    pub span: Option<String>,
    /// Every other field, including `id`.
    pub fields: BTreeMap<String, Value>,
}

/// Shared handle to the entries collected by an observer logger.
#[derive(Debug, Clone, Default)]
pub struct ObservedLogs {
    entries: Arc<Mutex<Vec<ObservedEntry>>>,
}

impl ObservedLogs {
    fn lock(&self) -> MutexGuard<'_, Vec<ObservedEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, entry: ObservedEntry) {
        self.lock().push(entry);
    }

    /// Number of entries collected.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of every entry collected so far, oldest first.
    pub fn all(&self) -> Vec<ObservedEntry> {
        self.lock().clone()
    }

    /// Remove and return every entry collected so far.
    pub fn take_all(&self) -> Vec<ObservedEntry> {
        std::mem::take(&mut *self.lock())
    }

    /// Entries whose message is exactly `message`.
    pub fn filter_message(&self, message: &str) -> Vec<ObservedEntry> {
        self.filter(|entry| entry.message == message)
    }

    /// Entries whose message contains `snippet`.
    pub fn filter_message_snippet(&self, snippet: &str) -> Vec<ObservedEntry> {
        self.filter(|entry| entry.message.contains(snippet))
    }

    /// Entries carrying `key` with the given value.
    pub fn filter_field(&self, key: &str, value: impl Into<Value>) -> Vec<ObservedEntry> {
        let value = value.into();
        self.filter(|entry| entry.fields.get(key) == Some(&value))
    }

    /// Entries logged at exactly `severity`.
    pub fn filter_severity(&self, severity: Severity) -> Vec<ObservedEntry> {
        self.filter(|entry| entry.severity == severity)
    }

    fn filter(&self, predicate: impl Fn(&ObservedEntry) -> bool) -> Vec<ObservedEntry> {
        self.lock()
            .iter()
            .filter(|entry| predicate(entry))
            .cloned()
            .collect()
    }
}

/// Layer that records events into [`ObservedLogs`].
struct ObserverLayer {
    logs: ObservedLogs,
}

impl<S> Layer<S> for ObserverLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = EntryVisitor::default();
        event.record(&mut visitor);

        let severity = visitor
            .severity
            .unwrap_or_else(|| Severity::from_tracing_level(event.metadata().level()));

        self.logs.push(ObservedEntry {
            time: Utc::now(),
            severity,
            message: visitor.message,
            logger_name: visitor.logger_name,
            span: ctx
                .event_span(event)
                .map(|span| span.name().to_string())
                .or(visitor.span),
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct EntryVisitor {
    message: String,
    severity: Option<Severity>,
    logger_name: Option<String>,
    span: Option<String>,
    fields: BTreeMap<String, Value>,
}

impl Visit for EntryVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "severity" => self.severity = value.parse().ok(),
            "logger" => self.logger_name = Some(value.to_string()),
            "span" => self.span = Some(value.to_string()),
            name => {
                self.fields.insert(name.to_string(), Value::from(value));
            }
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_str(field, &format!("{value:?}"));
    }
}

/// Base logger feeding an in-memory collector, filtered at `min`.
pub fn new(min: Severity) -> (BaseLogger, ObservedLogs) {
    let level = AtomicLevel::new(min);
    let logs = ObservedLogs::default();
    let layer = ObserverLayer { logs: logs.clone() }.with_filter(level.clone());
    let dispatch = Dispatch::new(tracing_subscriber::registry().with(layer));

    (BaseLogger::new(dispatch, level), logs)
}

/// Traced logger named `name` whose info-and-above entries are collected.
pub fn new_observer_logger(name: &str) -> (TracedLogger, ObservedLogs) {
    let (base, logs) = new(Severity::Info);
    (TracedLogger::new(base.named(name), Severity::Info), logs)
}

//! Sink registry and record dispatch
//!
//! The registry owns every registered sink and routes each record through
//! the sink's level gate, filter, formatter and writer. Sinks are isolated
//! from each other: a failing or panicking sink is reported and skipped,
//! and the remaining sinks still receive the record.

use super::{
    error::{LoggerError, Result},
    filter::Filter,
    formatter::Formatter,
    log_level::LogLevel,
    metrics::LoggerMetrics,
    record::LogRecord,
    writer::SinkWriter,
};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Identifier issued by a registry; never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SinkId(usize);

impl SinkId {
    pub fn get(&self) -> usize {
        self.0
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for SinkId {
    fn from(id: usize) -> Self {
        SinkId(id)
    }
}

/// Sink lookup key for removal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerRef {
    Name(String),
    Id(SinkId),
}

impl From<&str> for HandlerRef {
    fn from(name: &str) -> Self {
        HandlerRef::Name(name.to_string())
    }
}

impl From<SinkId> for HandlerRef {
    fn from(id: SinkId) -> Self {
        HandlerRef::Id(id)
    }
}

/// Normalized sink name: trimmed and upper-cased
pub fn normalize_name(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Problem reported while delivering a record to one sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkIssue {
    Format { sink: String, message: String },
    Write { sink: String, message: String },
    Panic { sink: String, message: String },
    /// Record was written, but these extra fields had no JSON form
    Serialization { sink: String, fields: Vec<String> },
}

impl SinkIssue {
    pub fn sink(&self) -> &str {
        match self {
            SinkIssue::Format { sink, .. }
            | SinkIssue::Write { sink, .. }
            | SinkIssue::Panic { sink, .. }
            | SinkIssue::Serialization { sink, .. } => sink,
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, SinkIssue::Serialization { .. })
    }
}

impl fmt::Display for SinkIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkIssue::Format { sink, message } => {
                write!(f, "Sink '{}' failed to format record: {}", sink, message)
            }
            SinkIssue::Write { sink, message } => {
                write!(f, "Sink '{}' failed to write record: {}", sink, message)
            }
            SinkIssue::Panic { sink, message } => write!(
                f,
                "Sink '{}' panicked: {}. Other sinks continue to function.",
                sink, message
            ),
            SinkIssue::Serialization { sink, fields } => write!(
                f,
                "Sink '{}' wrote non-finite values as null: {}",
                sink,
                fields.join(", ")
            ),
        }
    }
}

/// Callback invoked for every sink issue
pub type ErrorCallback = Arc<dyn Fn(&SinkIssue) + Send + Sync>;

/// Reports sink issues to stderr, metrics and an optional callback
///
/// Cloned into queue workers so failures that happen off the caller's
/// thread end up in the same place.
#[derive(Clone)]
pub struct ErrorReporter {
    callback: Option<ErrorCallback>,
    metrics: Arc<LoggerMetrics>,
}

impl ErrorReporter {
    pub fn new(metrics: Arc<LoggerMetrics>, callback: Option<ErrorCallback>) -> Self {
        Self { callback, metrics }
    }

    pub fn report(&self, issue: SinkIssue) {
        if issue.is_warning() {
            self.metrics.record_serialization_warning();
            eprintln!("[LOGGER WARNING] {}", issue);
        } else {
            self.metrics.record_failure();
            eprintln!("[LOGGER ERROR] {}", issue);
        }

        if let Some(ref callback) = self.callback {
            let outcome =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback(&issue)));
            if outcome.is_err() {
                eprintln!("[LOGGER ERROR] Error callback panicked while handling: {}", issue);
            }
        }
    }

    pub fn metrics(&self) -> &Arc<LoggerMetrics> {
        &self.metrics
    }
}

impl fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorReporter")
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// Everything needed to register a sink
pub struct SinkDescriptor {
    pub name: String,
    pub level: LogLevel,
    pub filter: Filter,
    pub formatter: Formatter,
    pub writer: Box<dyn SinkWriter>,
}

impl SinkDescriptor {
    pub fn new(name: impl Into<String>, writer: Box<dyn SinkWriter>, formatter: Formatter) -> Self {
        Self {
            name: name.into(),
            level: LogLevel::Trace,
            filter: Filter::all(),
            formatter,
            writer,
        }
    }

    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }
}

enum Delivery {
    Written(Vec<String>),
    Skipped,
}

struct Sink {
    id: SinkId,
    name: String,
    level: LogLevel,
    filter: Filter,
    formatter: Formatter,
    writer: Mutex<Box<dyn SinkWriter>>,
}

impl Sink {
    fn deliver(&self, record: &LogRecord) -> std::result::Result<Delivery, SinkIssue> {
        if !self.filter.accepts(record) {
            return Ok(Delivery::Skipped);
        }

        let rendered = self.formatter.format(record).map_err(|e| SinkIssue::Format {
            sink: self.name.clone(),
            message: e.to_string(),
        })?;
        let Some(text) = rendered.text else {
            return Ok(Delivery::Skipped);
        };

        self.writer
            .lock()
            .write(record, &text)
            .map_err(|e| SinkIssue::Write {
                sink: self.name.clone(),
                message: e.to_string(),
            })?;
        Ok(Delivery::Written(rendered.lossy))
    }
}

/// Outcome of dispatching one record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub filtered: usize,
    pub failed: usize,
}

/// Owner of all registered sinks
pub struct SinkRegistry {
    sinks: RwLock<Vec<Sink>>,
    next_id: AtomicUsize,
    reporter: ErrorReporter,
    metrics: Arc<LoggerMetrics>,
    started_at: Instant,
}

impl SinkRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::with_error_callback(None)
    }

    #[must_use]
    pub fn with_error_callback(callback: Option<ErrorCallback>) -> Self {
        let metrics = Arc::new(LoggerMetrics::new());
        Self {
            sinks: RwLock::new(Vec::new()),
            next_id: AtomicUsize::new(1),
            reporter: ErrorReporter::new(Arc::clone(&metrics), callback),
            metrics,
            started_at: Instant::now(),
        }
    }

    /// Issue the next id; ids are consumed even if registration then fails
    pub fn reserve_id(&self) -> SinkId {
        SinkId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a sink under its normalized name
    ///
    /// # Errors
    ///
    /// Returns `DuplicateName` if a sink with the same name is registered.
    pub fn add(&self, descriptor: SinkDescriptor) -> Result<SinkId> {
        let id = self.reserve_id();
        self.insert(id, descriptor)
    }

    /// Register a sink under an id obtained from [`reserve_id`](Self::reserve_id)
    pub fn insert(&self, id: SinkId, descriptor: SinkDescriptor) -> Result<SinkId> {
        let name = normalize_name(&descriptor.name);
        let mut sinks = self.sinks.write();
        if sinks.iter().any(|sink| sink.name == name) {
            return Err(LoggerError::duplicate_name(name));
        }

        sinks.push(Sink {
            id,
            name,
            level: descriptor.level,
            filter: descriptor.filter,
            formatter: descriptor.formatter,
            writer: Mutex::new(descriptor.writer),
        });
        Ok(id)
    }

    /// Unregister a sink; returns `false` if nothing matched
    ///
    /// The sink's writer is flushed and released after the registry lock
    /// is dropped, so a queue worker being joined never blocks dispatch.
    pub fn remove(&self, handler: impl Into<HandlerRef>) -> bool {
        let handler = handler.into();
        let removed = {
            let mut sinks = self.sinks.write();
            let position = match &handler {
                HandlerRef::Name(name) => {
                    let name = normalize_name(name);
                    sinks.iter().position(|sink| sink.name == name)
                }
                HandlerRef::Id(id) => sinks.iter().position(|sink| sink.id == *id),
            };
            position.map(|index| sinks.remove(index))
        };

        match removed {
            Some(sink) => {
                Self::release(sink);
                true
            }
            None => false,
        }
    }

    /// Unregister every sink; returns how many were removed
    pub fn remove_all(&self) -> usize {
        let removed: Vec<Sink> = std::mem::take(&mut *self.sinks.write());
        let count = removed.len();
        for sink in removed {
            Self::release(sink);
        }
        count
    }

    fn release(sink: Sink) {
        if let Err(e) = sink.writer.lock().flush() {
            eprintln!("[LOGGER ERROR] Sink '{}' flush failed on removal: {}", sink.name, e);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        let name = normalize_name(name);
        self.sinks.read().iter().any(|sink| sink.name == name)
    }

    pub fn id_of(&self, name: &str) -> Option<SinkId> {
        let name = normalize_name(name);
        self.sinks
            .read()
            .iter()
            .find(|sink| sink.name == name)
            .map(|sink| sink.id)
    }

    /// Registered sink names mapped to their ids
    pub fn handlers_map(&self) -> BTreeMap<String, SinkId> {
        self.sinks
            .read()
            .iter()
            .map(|sink| (sink.name.clone(), sink.id))
            .collect()
    }

    /// Names in registration order
    pub fn names(&self) -> Vec<String> {
        self.sinks.read().iter().map(|sink| sink.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sinks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.read().is_empty()
    }

    /// Route a record to every sink whose level gate and filter accept it
    ///
    /// **Per-Sink Panic Isolation**: each delivery runs under
    /// `catch_unwind`, so one failing sink never keeps the record from
    /// the others. Issues are reported once the sink list is released, so
    /// an error callback may add or remove sinks.
    pub fn dispatch(&self, record: &LogRecord) -> DispatchReport {
        self.metrics.record_emitted();
        let mut report = DispatchReport::default();
        let mut issues = Vec::new();

        {
            let sinks = self.sinks.read();
            for sink in sinks.iter() {
                if record.level() < sink.level {
                    report.filtered += 1;
                    self.metrics.record_filtered();
                    continue;
                }

                let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    sink.deliver(record)
                }));

                match outcome {
                    Ok(Ok(Delivery::Written(lossy))) => {
                        report.delivered += 1;
                        self.metrics.record_delivered();
                        if !lossy.is_empty() {
                            issues.push(SinkIssue::Serialization {
                                sink: sink.name.clone(),
                                fields: lossy,
                            });
                        }
                    }
                    Ok(Ok(Delivery::Skipped)) => {
                        report.filtered += 1;
                        self.metrics.record_filtered();
                    }
                    Ok(Err(issue)) => {
                        report.failed += 1;
                        issues.push(issue);
                    }
                    Err(panic_info) => {
                        report.failed += 1;
                        issues.push(SinkIssue::Panic {
                            sink: sink.name.clone(),
                            message: panic_message(panic_info.as_ref()),
                        });
                    }
                }
            }
        }

        for issue in issues {
            self.reporter.report(issue);
        }

        report
    }

    /// Flush every sink; all sinks are attempted, the first error is returned
    pub fn flush(&self) -> Result<()> {
        let mut first_error = None;
        for sink in self.sinks.read().iter() {
            if let Err(e) = sink.writer.lock().flush() {
                eprintln!("[LOGGER ERROR] Sink '{}' flush failed: {}", sink.name, e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Get the registry metrics for detailed observability
    pub fn metrics(&self) -> &Arc<LoggerMetrics> {
        &self.metrics
    }

    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    /// Instant the registry was created; records measure `elapsed` from it
    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}

impl Default for SinkRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SinkRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkRegistry")
            .field("sinks", &self.names())
            .finish_non_exhaustive()
    }
}

pub(crate) fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

//! Caller-facing logger handle

use super::{
    error::Result,
    extra::{Extra, FieldValue},
    log_level::LogLevel,
    record::{ErrorInfo, Location, LogRecord},
    registry::{DispatchReport, SinkRegistry},
};
use std::sync::Arc;
use std::time::Duration;

/// Default shutdown timeout for queue workers (5 seconds)
///
/// Dropping an enqueued sink waits at most this long for its worker to
/// drain pending records.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Cheap, clonable handle that emits records into a [`SinkRegistry`]
///
/// Fields bound with [`bind`](Logger::bind) are attached to every record
/// emitted through the returned handle; the original handle is unchanged.
///
/// # Example
///
/// ```
/// use rust_log_loader::prelude::*;
/// use std::sync::Arc;
///
/// let registry = Arc::new(SinkRegistry::new());
/// let logger = Logger::new(registry);
///
/// let request_logger = logger.bind("request_id", "abc-123");
/// request_logger.info("Request processed");
/// logger.bind("disable_file", true).warning("console only");
/// ```
#[derive(Clone, Debug)]
pub struct Logger {
    registry: Arc<SinkRegistry>,
    extra: Extra,
}

impl Logger {
    pub fn new(registry: Arc<SinkRegistry>) -> Self {
        Self {
            registry,
            extra: Extra::new(),
        }
    }

    /// New handle with `key` bound; later bindings win
    #[must_use]
    pub fn bind(&self, key: impl Into<String>, value: impl Into<FieldValue>) -> Logger {
        let mut extra = self.extra.clone();
        extra.insert(key, value);
        Logger {
            registry: Arc::clone(&self.registry),
            extra,
        }
    }

    /// New handle with all of `extra` bound
    #[must_use]
    pub fn bind_extra(&self, extra: &Extra) -> Logger {
        Logger {
            registry: Arc::clone(&self.registry),
            extra: self.extra.merged(extra),
        }
    }

    pub fn extra(&self) -> &Extra {
        &self.extra
    }

    pub fn registry(&self) -> &Arc<SinkRegistry> {
        &self.registry
    }

    /// Build a record carrying the bound fields, the elapsed time and the
    /// caller's location
    #[track_caller]
    pub fn record(&self, level: LogLevel, message: impl Into<String>) -> LogRecord {
        LogRecord::new(level, message)
            .with_location(Location::caller())
            .with_extra(self.extra.clone())
            .with_elapsed(self.registry.started_at().elapsed())
    }

    /// Dispatch a fully built record as is
    pub fn emit(&self, record: LogRecord) -> DispatchReport {
        self.registry.dispatch(&record)
    }

    /// Dispatch on tokio's blocking pool so async callers never wait on file I/O
    ///
    /// # Errors
    ///
    /// Returns an error if the blocking task panicked or was cancelled.
    #[cfg(feature = "async")]
    pub async fn emit_offloaded(&self, record: LogRecord) -> Result<DispatchReport> {
        let registry = Arc::clone(&self.registry);
        tokio::task::spawn_blocking(move || registry.dispatch(&record))
            .await
            .map_err(|e| super::error::LoggerError::other(format!("Offloaded dispatch failed: {}", e)))
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.emit(self.record(level, message));
    }

    /// Log with an explicit call site; used by the logging macros
    pub fn log_at(&self, level: LogLevel, message: impl Into<String>, location: Location) {
        self.emit(self.record(level, message).with_location(location));
    }

    #[inline]
    #[track_caller]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    #[track_caller]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    #[track_caller]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    #[track_caller]
    pub fn success(&self, message: impl Into<String>) {
        self.log(LogLevel::Success, message);
    }

    #[inline]
    #[track_caller]
    pub fn warning(&self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }

    #[inline]
    #[track_caller]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    #[track_caller]
    pub fn critical(&self, message: impl Into<String>) {
        self.log(LogLevel::Critical, message);
    }

    /// Log at ERROR with `error` and its source chain attached
    #[track_caller]
    pub fn exception<E>(&self, message: impl Into<String>, error: &E)
    where
        E: std::error::Error + 'static,
    {
        self.emit(
            self.record(LogLevel::Error, message)
                .with_error(ErrorInfo::from_error(error)),
        );
    }

    pub fn flush(&self) -> Result<()> {
        self.registry.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::LoggerError;
    use crate::core::formatter::{Formatter, TemplateFormatter};
    use crate::core::registry::SinkDescriptor;
    use crate::core::writer::SinkWriter;
    use parking_lot::Mutex;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<String>>>);

    impl SinkWriter for Captured {
        fn write(&mut self, _record: &LogRecord, line: &str) -> Result<()> {
            self.0.lock().push(line.to_string());
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn kind(&self) -> &str {
            "captured"
        }
    }

    fn logger_with(template: &str) -> (Logger, Captured) {
        let registry = Arc::new(SinkRegistry::new());
        let sink = Captured::default();
        registry
            .add(SinkDescriptor::new(
                "TEST",
                Box::new(sink.clone()),
                Formatter::Template(TemplateFormatter::new(template).unwrap()),
            ))
            .unwrap();
        (Logger::new(registry), sink)
    }

    #[test]
    fn test_level_helpers() {
        let (logger, sink) = logger_with("{level_short}|{message}");
        logger.trace("t");
        logger.success("s");
        logger.warning("w");
        logger.critical("c");

        assert_eq!(*sink.0.lock(), vec!["TRACE|t", "OK|s", "WARN|w", "CRIT|c"]);
    }

    #[test]
    fn test_bind_does_not_touch_parent() {
        let (logger, sink) = logger_with("{message} {extra}");
        let child = logger.bind("user", "alice").bind("user", "bob");

        child.info("child");
        logger.info("parent");

        let lines = sink.0.lock().clone();
        assert_eq!(lines[0], "child {\"user\":\"bob\"}");
        assert_eq!(lines[1], "parent {}");
    }

    #[test]
    fn test_log_at_sets_location() {
        let (logger, sink) = logger_with("{name}:{line} {file}");
        logger.log_at(
            LogLevel::Info,
            "x",
            Location::new("src/jobs/sync.rs", 9, "app::jobs"),
        );
        assert_eq!(*sink.0.lock(), vec!["app::jobs:9 sync.rs"]);
    }

    #[test]
    fn test_method_calls_record_call_site() {
        let registry = Arc::new(SinkRegistry::new());
        let sink = Captured::default();
        registry
            .add(SinkDescriptor::new("JSON", Box::new(sink.clone()), Formatter::Json))
            .unwrap();
        let logger = Logger::new(registry);

        logger.info("hello");
        let expected_line = line!() - 1;
        logger.bind("k", 1).exception("failed", &LoggerError::writer("x"));

        let lines = sink.0.lock().clone();
        let first: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(first["file"], "logger.rs");
        assert_eq!(first["line"], expected_line);
        assert_eq!(first["name"], "core::logger");

        let second: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(second["line"], expected_line + 1);
    }

    #[test]
    fn test_exception_attaches_error() {
        let (logger, sink) = logger_with("{level}: {message}");
        let err = LoggerError::writer("socket closed");
        logger.exception("send failed", &err);

        let lines = sink.0.lock().clone();
        assert!(lines[0].starts_with("ERROR: send failed\nLoggerError: Writer error: socket closed"));
    }

    #[test]
    fn test_emit_returns_report() {
        let (logger, _sink) = logger_with("{message}");
        let report = logger.emit(logger.record(LogLevel::Info, "x"));
        assert_eq!(report.delivered, 1);
    }

    #[cfg(feature = "async")]
    #[tokio::test]
    async fn test_emit_offloaded() {
        let (logger, sink) = logger_with("{message}");
        let report = logger
            .emit_offloaded(logger.record(LogLevel::Info, "from async"))
            .await
            .unwrap();

        assert_eq!(report.delivered, 1);
        assert_eq!(*sink.0.lock(), vec!["from async"]);
    }
}

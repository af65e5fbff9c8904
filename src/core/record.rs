//! Log record structure

use super::extra::{Extra, FieldValue};
use super::log_level::LogLevel;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

// Thread-local caches for thread information to avoid repeated allocations
thread_local! {
    static THREAD_CACHE: RefCell<Option<ThreadInfo>> = const { RefCell::new(None) };
}

static PROCESS_INFO: OnceLock<ProcessInfo> = OnceLock::new();

/// `ThreadId` has no stable numeric accessor; its Debug form is `ThreadId(N)`
fn parse_thread_id(raw: &str) -> u64 {
    raw.trim_start_matches("ThreadId(")
        .trim_end_matches(')')
        .parse()
        .unwrap_or(0)
}

/// Get cached thread identity, computing and caching it on first access
fn current_thread() -> ThreadInfo {
    THREAD_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| {
                let thread = std::thread::current();
                ThreadInfo {
                    id: parse_thread_id(&format!("{:?}", thread.id())),
                    name: thread.name().unwrap_or("unnamed").to_string(),
                }
            })
            .clone()
    })
}

fn current_process() -> ProcessInfo {
    PROCESS_INFO
        .get_or_init(|| ProcessInfo {
            id: std::process::id(),
            name: std::env::current_exe()
                .ok()
                .and_then(|exe| exe.file_stem().map(|s| s.to_string_lossy().into_owned()))
                .unwrap_or_else(|| "main".to_string()),
        })
        .clone()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub id: u32,
    pub name: String,
}

impl ProcessInfo {
    /// Identity of the running process; the name is the executable stem
    pub fn current() -> Self {
        current_process()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadInfo {
    pub id: u64,
    pub name: String,
}

/// Call site of a record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Location {
    /// Path as reported by `file!()` or the `log` facade
    pub file: String,
    pub line: u32,
    /// Module path, used as the record's `name`
    pub module: String,
    pub function: Option<String>,
}

impl Location {
    pub fn new(file: impl Into<String>, line: u32, module: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            module: module.into(),
            function: None,
        }
    }

    /// Call site of the nearest caller not marked `#[track_caller]`
    ///
    /// The module path is not available at runtime, so it is derived from
    /// the file path: `src/jobs/sync.rs` becomes `jobs::sync`.
    #[track_caller]
    pub fn caller() -> Self {
        let caller = std::panic::Location::caller();
        Self::new(caller.file(), caller.line(), module_from_file(caller.file()))
    }

    #[must_use]
    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    /// Set the function from a full `type_name` path such as
    /// `app::jobs::run::{{closure}}`; only the function's own name is kept
    #[must_use]
    pub fn with_function_path(self, path: &str) -> Self {
        let mut trimmed = path;
        while let Some(rest) = trimmed.strip_suffix("::{{closure}}") {
            trimmed = rest;
        }
        let function = trimmed.rsplit("::").next().unwrap_or(trimmed);
        self.with_function(function)
    }

    /// Basename of the source file
    pub fn file_name(&self) -> &str {
        Path::new(&self.file)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.file)
    }

    /// Last `::` segment of the module path
    pub fn module_name(&self) -> &str {
        self.module.rsplit("::").next().unwrap_or(&self.module)
    }
}

fn module_from_file(file: &str) -> String {
    let path = file.replace('\\', "/");
    let relative = path
        .rsplit_once("src/")
        .map_or(path.as_str(), |(_, rest)| rest);
    let stem = relative.strip_suffix(".rs").unwrap_or(relative);

    let mut parts: Vec<&str> = stem.split('/').filter(|part| !part.is_empty()).collect();
    if parts.len() > 1 && matches!(parts.last(), Some(&("mod" | "lib" | "main"))) {
        parts.pop();
    }
    parts.join("::")
}

/// Captured error attached to a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub type_name: String,
    pub value: String,
    /// Source chain, followed by a backtrace when one was captured
    pub traceback: String,
}

impl ErrorInfo {
    pub fn new(
        type_name: impl Into<String>,
        value: impl Into<String>,
        traceback: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            value: value.into(),
            traceback: traceback.into(),
        }
    }

    /// Capture an error, its `source()` chain, and a backtrace if enabled
    /// through `RUST_BACKTRACE`
    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + 'static,
    {
        let type_name = std::any::type_name::<E>()
            .rsplit("::")
            .next()
            .unwrap_or("Error")
            .to_string();

        let mut traceback = format!("{}: {}", type_name, error);
        let mut source = error.source();
        while let Some(cause) = source {
            traceback.push_str(&format!("\nCaused by: {}", cause));
            source = cause.source();
        }

        let backtrace = std::backtrace::Backtrace::capture();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            traceback.push_str(&format!("\n\nStack backtrace:\n{}", backtrace));
        }

        Self {
            type_name,
            value: error.to_string(),
            traceback,
        }
    }
}

/// Structured event handed to every sink
///
/// Fields are private; sinks only read through accessors, so a record is
/// never changed once dispatched.
#[derive(Debug, Clone)]
pub struct LogRecord {
    level: LogLevel,
    message: String,
    time: DateTime<Local>,
    location: Location,
    process: ProcessInfo,
    thread: ThreadInfo,
    elapsed: Duration,
    extra: Extra,
    error: Option<ErrorInfo>,
}

impl LogRecord {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            time: Local::now(),
            location: Location::default(),
            process: current_process(),
            thread: current_thread(),
            elapsed: Duration::ZERO,
            extra: Extra::new(),
            error: None,
        }
    }

    #[must_use]
    pub fn with_time(mut self, time: DateTime<Local>) -> Self {
        self.time = time;
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    #[must_use]
    pub fn with_extra(mut self, extra: Extra) -> Self {
        self.extra = extra;
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.extra.insert(key, value);
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    #[must_use]
    pub fn with_thread(mut self, thread: ThreadInfo) -> Self {
        self.thread = thread;
        self
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn time(&self) -> &DateTime<Local> {
        &self.time
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Logger name, i.e. the module path of the call site
    pub fn name(&self) -> &str {
        &self.location.module
    }

    pub fn process(&self) -> &ProcessInfo {
        &self.process
    }

    pub fn thread(&self) -> &ThreadInfo {
        &self.thread
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn extra(&self) -> &Extra {
        &self.extra
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }
}
